//! Over-Limit Eviction Task
//!
//! Background task that keeps the cache under its count limit.

use std::sync::Weak;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

use super::{stopped, Maintain};

/// Spawns a task that calls [`Maintain::enforce_count_limit`] every
/// `interval`, starting after `initial_delay`.
pub(crate) fn spawn_eviction_task<T: Maintain>(
    runtime: &Handle,
    target: Weak<T>,
    initial_delay: Duration,
    interval: Duration,
    mut signal: watch::Receiver<bool>,
) -> JoinHandle<()> {
    runtime.spawn(async move {
        info!(
            "Starting over-limit eviction with interval of {} ms",
            interval.as_millis()
        );

        let mut ticker = time::interval_at(Instant::now() + initial_delay, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = stopped(&mut signal) => break,
            }

            let Some(cache) = target.upgrade() else {
                break;
            };
            let evicted = cache.enforce_count_limit();
            drop(cache);

            if evicted > 0 {
                info!("Over-limit eviction: removed {} entries", evicted);
            } else {
                debug!("Over-limit eviction: under limit");
            }
        }

        info!("Over-limit eviction stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::testing::Recorder;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_eviction_waits_for_initial_delay() {
        let target = Arc::new(Recorder::default());
        let (_tx, rx) = watch::channel(false);
        let handle = spawn_eviction_task(
            &Handle::current(),
            Arc::downgrade(&target),
            Duration::from_millis(300),
            Duration::from_millis(100),
            rx,
        );

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(target.evictions.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(target.evictions.load(Ordering::SeqCst) >= 2);
        assert_eq!(target.sweeps.load(Ordering::SeqCst), 0);

        handle.abort();
    }

    #[tokio::test]
    async fn test_eviction_stops_when_sender_dropped() {
        let target = Arc::new(Recorder::default());
        let (tx, rx) = watch::channel(false);
        let handle = spawn_eviction_task(
            &Handle::current(),
            Arc::downgrade(&target),
            Duration::from_secs(60),
            Duration::from_secs(60),
            rx,
        );

        drop(tx);
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("eviction should exit once the cache is dropped")
            .unwrap();
    }
}
