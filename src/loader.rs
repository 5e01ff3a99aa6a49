use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::cache;
use crate::logger::Logger;
use crate::merge::merge;
use crate::models::{Category, LoadResult};
use crate::network::{self, FetchError, PayloadFormat, DEFAULT_TIMEOUT};
use crate::storage::FeedStore;

pub const STALE_DATA_MESSAGE: &str = "stale data";
pub const NO_DATA_MESSAGE: &str = "fatal: no data available";

#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub url: String,
    pub format: PayloadFormat,
    pub timeout: Duration,
    pub cache_file: PathBuf,
}

impl LoaderConfig {
    pub fn new(url: impl Into<String>, format: PayloadFormat, cache_file: PathBuf) -> Self {
        Self {
            url: url.into(),
            format,
            timeout: DEFAULT_TIMEOUT,
            cache_file,
        }
    }
}

/// Runs fetch + cache + merge off the caller's thread and posts exactly one
/// `LoadResult` per invocation to the channel the caller owns. The caller
/// (the UI) drains its receiver on its own turn; nothing here touches the
/// caller's state directly.
pub struct Loader {
    config: LoaderConfig,
    client: reqwest::Client,
    store: Arc<Mutex<FeedStore>>,
    tx: Sender<LoadResult>,
    log: Logger,
    in_flight: Arc<AtomicBool>,
}

impl Loader {
    pub fn new(
        config: LoaderConfig,
        store: Arc<Mutex<FeedStore>>,
        tx: Sender<LoadResult>,
        log: Logger,
    ) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            store,
            tx,
            log,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Kicks off one background load. Returns false when a load is already
    /// outstanding: the call coalesces and no second task is spawned. There
    /// is no retry loop; calling `load()` again is the only retry path.
    pub fn load(&self) -> bool {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            return false;
        }
        let config = self.config.clone();
        let client = self.client.clone();
        let store = Arc::clone(&self.store);
        let tx = self.tx.clone();
        let log = self.log.clone();
        let in_flight = Arc::clone(&self.in_flight);
        crate::spawn(async move {
            let fetched =
                network::fetch_categories(&client, &config.url, config.timeout, config.format)
                    .await;
            let local = store
                .lock()
                .map(|s| s.categories())
                .unwrap_or_default();
            let result = resolve(fetched, &config.cache_file, local, &log);
            let _ = tx.send(result);
            in_flight.store(false, Ordering::SeqCst);
        });
        true
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }
}

/// The loader's whole decision path, kept free of I/O scheduling so every
/// branch is testable: fetch ok → cache + merge; fetch failed → cached copy
/// marked stale; nothing at all → fatal empty result.
fn resolve(
    fetched: Result<Vec<Category>, FetchError>,
    cache_file: &Path,
    local: Vec<Category>,
    log: &Logger,
) -> LoadResult {
    match fetched {
        Ok(remote) => {
            log.log_line(&format!("loaded {} categories from network", remote.len()));
            cache::save_cache(cache_file, &remote);
            LoadResult {
                categories: merge(remote, local),
                degraded: false,
                message: None,
            }
        }
        Err(err) => {
            log.log_line(&format!("network load failed ({}), trying cache", err));
            match cache::load_cache(cache_file) {
                Some(cached) => LoadResult {
                    categories: merge(cached, local),
                    degraded: true,
                    message: Some(STALE_DATA_MESSAGE.to_string()),
                },
                None => LoadResult {
                    categories: Vec::new(),
                    degraded: true,
                    message: Some(NO_DATA_MESSAGE.to_string()),
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Source, Station};
    use std::sync::mpsc;

    fn remote_sample() -> Vec<Category> {
        vec![Category {
            name: "أخبار".to_string(),
            stations: vec![Station {
                name: "BBC".to_string(),
                url: "http://a".to_string(),
            }],
            source: Source::Remote,
        }]
    }

    fn test_logger(dir: &tempfile::TempDir) -> Logger {
        Logger::new(dir.path().join("test.log"))
    }

    #[test]
    fn successful_fetch_caches_and_merges() {
        let dir = tempfile::tempdir().unwrap();
        let cache_file = dir.path().join("stations.json");
        let result = resolve(
            Ok(remote_sample()),
            &cache_file,
            Vec::new(),
            &test_logger(&dir),
        );
        assert!(!result.degraded);
        assert_eq!(result.message, None);
        assert_eq!(result.categories.len(), 1);
        assert_eq!(result.categories[0].name, "أخبار");
        assert_eq!(result.categories[0].stations[0].name, "BBC");
        // The raw remote list is now the cache snapshot.
        assert_eq!(cache::load_cache(&cache_file), Some(remote_sample()));
    }

    #[test]
    fn fetch_failure_falls_back_to_cache_as_degraded() {
        let dir = tempfile::tempdir().unwrap();
        let cache_file = dir.path().join("stations.json");
        cache::save_cache(&cache_file, &remote_sample());
        let local = vec![Category {
            name: "رياضة".to_string(),
            stations: vec![Station {
                name: "http://sport".to_string(),
                url: "http://sport".to_string(),
            }],
            source: Source::Local,
        }];
        let result = resolve(
            Err(FetchError::Status(503)),
            &cache_file,
            local,
            &test_logger(&dir),
        );
        assert!(result.degraded);
        assert_eq!(result.message.as_deref(), Some(STALE_DATA_MESSAGE));
        assert_eq!(result.categories.len(), 2);
        assert_eq!(result.categories[1].name, "رياضة");
        assert_eq!(result.categories[1].source, Source::Local);
    }

    #[test]
    fn fetch_failure_with_empty_cache_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let cache_file = dir.path().join("stations.json");
        let local = vec![Category {
            name: "رياضة".to_string(),
            stations: vec![Station {
                name: "http://sport".to_string(),
                url: "http://sport".to_string(),
            }],
            source: Source::Local,
        }];
        let result = resolve(
            Err(FetchError::Empty),
            &cache_file,
            local,
            &test_logger(&dir),
        );
        assert!(result.degraded);
        assert!(result.categories.is_empty());
        assert_eq!(result.message.as_deref(), Some(NO_DATA_MESSAGE));
    }

    #[test]
    fn failed_fetch_never_touches_the_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache_file = dir.path().join("stations.json");
        cache::save_cache(&cache_file, &remote_sample());
        let _ = resolve(
            Err(FetchError::Status(500)),
            &cache_file,
            Vec::new(),
            &test_logger(&dir),
        );
        assert_eq!(cache::load_cache(&cache_file), Some(remote_sample()));
    }

    #[test]
    fn load_emits_exactly_one_result() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, rx) = mpsc::channel();
        let store = Arc::new(Mutex::new(FeedStore::open(
            dir.path().join("rss_feeds.json"),
        )));
        // Nothing listens on this port; the fetch fails fast and the empty
        // cache makes the result fatal.
        let config = LoaderConfig::new(
            "http://127.0.0.1:9/radio.json",
            PayloadFormat::Json,
            dir.path().join("stations.json"),
        );
        let loader = Loader::new(config, store, tx, test_logger(&dir));
        assert!(loader.load());
        let result = rx.recv_timeout(Duration::from_secs(30)).unwrap();
        assert!(result.degraded);
        assert_eq!(result.message.as_deref(), Some(NO_DATA_MESSAGE));
        assert!(rx.try_recv().is_err());
    }
}
