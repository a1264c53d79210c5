//! Background task that removes expired cache entries

use std::sync::Weak;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use super::store::Shared;

/// Spawns the sweep loop for a cache
///
/// The loop wakes every `interval`, upgrades its weak reference and sweeps.
/// It exits when the reference can no longer be upgraded, when a shutdown
/// message arrives, or when the shutdown sender is dropped with the cache.
pub(super) fn spawn<V>(
    shared: Weak<Shared<V>>,
    interval: Duration,
    mut shutdown_rx: mpsc::Receiver<()>,
) -> JoinHandle<()>
where
    V: Send + Sync + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // Skip the first tick (immediate)
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let Some(shared) = shared.upgrade() else {
                        break;
                    };
                    let removed = shared.sweep();
                    if removed > 0 {
                        info!(removed, "Swept expired cache entries");
                    }
                }
                _ = shutdown_rx.recv() => {
                    break;
                }
            }
        }

        debug!("Cache sweeper stopped");
    })
}
