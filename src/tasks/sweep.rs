//! In-flight Sweep Task
//!
//! Background task that periodically removes expired prefetch markers and
//! writes back store recency refreshed by reads.
//!
//! Marker expiry is already enforced lazily on every check; this task only
//! bounds memory when many distinct targets are prefetched and never revisited.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::prefetch::InflightGuard;
use crate::store::SharedStore;

/// Spawns a background task that periodically sweeps expired in-flight markers
/// and flushes pending store metadata.
///
/// # Arguments
/// * `guard` - The guard shared with the prefetch coordinator
/// * `store` - The store whose read recency is written back
/// * `interval` - Time between sweeps
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let guard = Arc::new(InflightGuard::new(Arc::new(SystemClock), INFLIGHT_WINDOW_MS));
/// let sweep_handle = spawn_sweep_task(guard.clone(), store.clone(), Duration::from_secs(60));
/// // Later, during shutdown:
/// sweep_handle.abort();
/// ```
pub fn spawn_sweep_task(
    guard: Arc<InflightGuard>,
    store: SharedStore,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Starting in-flight sweep task with interval of {} ms",
            interval.as_millis()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = guard.sweep();
            if removed > 0 {
                info!("In-flight sweep: removed {} expired markers", removed);
            } else {
                debug!("In-flight sweep: no expired markers found");
            }

            // File-backed flushes block, keep them off the executor
            let store = Arc::clone(&store);
            match tokio::task::spawn_blocking(move || store.blocking_write().flush()).await {
                Ok(true) => debug!("Flushed store recency"),
                Ok(false) => {}
                Err(err) => warn!("Store flush task failed: {}", err),
            }
        }
    })
}
