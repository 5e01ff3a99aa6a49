use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use url::Url;

const KNOWN_CONTAINERS: [&str; 4] = ["mp3", "aac", "ogg", "m4a"];

/// Target of one recording session: where the duplicated stream lands and
/// which container the name advertises.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSpec {
    pub path: PathBuf,
    pub container: String,
}

impl RecordSpec {
    pub fn for_target(path: &Path) -> Self {
        let container = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .filter(|e| KNOWN_CONTAINERS.contains(&e.as_str()))
            .unwrap_or_else(|| "mp3".to_string());
        Self {
            path: path.to_path_buf(),
            container,
        }
    }

    /// Per-file option string for the native backend's `loadfile` call. The
    /// record sink duplicates the stream to the file while playback
    /// continues. `,`, `"` and `=` are significant in the option syntax, so
    /// the destination path goes through length-prefix quoting.
    pub fn loadfile_options(&self) -> String {
        format!(
            "stream-record={}",
            quote_option_value(&self.path.to_string_lossy())
        )
    }
}

/// Proposes `<host>-<yyyymmdd-HHMMSS>.<ext>` under `dir` for the stream that
/// is currently playing; the container falls back to mp3 when the URL path
/// does not advertise one.
pub fn derive_output_path(dir: &Path, stream_url: &str, now: DateTime<Local>) -> PathBuf {
    let parsed = Url::parse(stream_url).ok();
    let host = parsed
        .as_ref()
        .and_then(|u| u.host_str())
        .unwrap_or("stream")
        .to_string();
    let ext = parsed
        .as_ref()
        .map(|u| u.path().to_ascii_lowercase())
        .and_then(|p| {
            KNOWN_CONTAINERS
                .iter()
                .find(|c| p.ends_with(&format!(".{}", c)))
                .map(|c| c.to_string())
        })
        .unwrap_or_else(|| "mp3".to_string());
    dir.join(format!("{}-{}.{}", host, now.format("%Y%m%d-%H%M%S"), ext))
}

/// mpv's `%len%text` quoting; the length counts bytes, not characters.
fn quote_option_value(value: &str) -> String {
    format!("%{}%{}", value.len(), value)
}
