//! Expired Entry Sweep
//!
//! Background task that periodically removes expired cache entries. Reads
//! already ignore expired entries, so the sweep only reclaims memory.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::dispatch::{ActionCache, Dispatcher};

/// Spawns a background task that sweeps expired entries every `interval`.
///
/// The task runs until aborted through the returned handle.
///
/// # Example
/// ```ignore
/// let cache = ActionCache::new(dispatcher, CacheConfig::default());
/// let cleanup_handle = spawn_cleanup_task(cache.clone(), Duration::from_secs(1));
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task<D: Dispatcher>(
    cache: ActionCache<D>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(interval_ms = interval.as_millis() as u64, "Starting cache cleanup task");

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.cleanup_expired().await;

            if removed > 0 {
                info!("Cache cleanup: removed {} expired entries", removed);
            } else {
                debug!("Cache cleanup: no expired entries found");
            }
        }
    })
}

/// Starts the sweep if the cache's configuration asks for one.
pub fn spawn_configured_cleanup<D: Dispatcher>(cache: &ActionCache<D>) -> Option<JoinHandle<()>> {
    cache
        .config()
        .cleanup_interval_duration()
        .map(|interval| spawn_cleanup_task(cache.clone(), interval))
}
