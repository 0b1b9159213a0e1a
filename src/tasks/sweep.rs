//! Expiry Sweep Task
//!
//! Background task that periodically removes expired cache entries.

use std::sync::Weak;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

use super::{stopped, Maintain};

/// Spawns a task that calls [`Maintain::purge_expired`] every `interval`.
///
/// The first pass runs one full interval after spawning. The task exits when
/// `signal` fires or `target` has been dropped.
pub(crate) fn spawn_sweep_task<T: Maintain>(
    runtime: &Handle,
    target: Weak<T>,
    interval: Duration,
    mut signal: watch::Receiver<bool>,
) -> JoinHandle<()> {
    runtime.spawn(async move {
        info!(
            "Starting expiry sweep with interval of {} seconds",
            interval.as_secs()
        );

        let mut ticker = time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = stopped(&mut signal) => break,
            }

            let Some(cache) = target.upgrade() else {
                break;
            };
            let removed = cache.purge_expired();
            drop(cache);

            if removed > 0 {
                info!("Expiry sweep: removed {} expired entries", removed);
            } else {
                debug!("Expiry sweep: no expired entries found");
            }
        }

        info!("Expiry sweep stopped");
    })
}
