pub mod cache;
pub mod config;
pub mod loader;
pub mod logger;
pub mod merge;
pub mod models;
#[cfg(unix)]
pub mod mpv;
pub mod network;
pub mod player;
pub mod record;
pub mod rodio_player;
pub mod storage;
pub mod updater;

pub use models::{Category, LoadResult, Settings, Source, Station};
pub use player::{PlaybackState, Player, PlayerEvent};

use once_cell::sync::Lazy;
use tokio::runtime::Runtime;

static RUNTIME: Lazy<Runtime> = Lazy::new(|| Runtime::new().expect("tokio runtime"));

/// Fire a background task on the shared runtime. The UI thread calls this
/// without owning a runtime of its own.
pub fn spawn<F>(fut: F)
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    RUNTIME.spawn(fut);
}

pub fn block_on<F: std::future::Future>(fut: F) -> F::Output {
    RUNTIME.block_on(fut)
}
