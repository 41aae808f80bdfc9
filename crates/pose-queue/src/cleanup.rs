//! Periodic maintenance while the queue runs.

use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

use crate::queue::ProcessingQueue;

/// Run [`ProcessingQueue::run_maintenance`] every `period` until shutdown.
///
/// The first pass happens one full period after start.
pub(crate) fn spawn_cleanup_task(
    queue: ProcessingQueue,
    period: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *shutdown_rx.borrow() {
                break;
            }
            tokio::select! {
                changed = shutdown_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    let report = queue.run_maintenance().await;
                    debug!(
                        jobs_pruned = report.jobs_pruned,
                        cache_entries_removed = report.cache.total(),
                        "Cleanup tick"
                    );
                }
            }
        }
        debug!("Cleanup task stopped");
    })
}
