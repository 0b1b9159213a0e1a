//! Background Tasks Module
//!
//! Long-lived workers owned by a cache instance.
//!
//! # Tasks
//! - Expiry sweep: removes entries whose expiry has passed
//! - Over-limit eviction: sheds the soonest-to-expire entries when the cache
//!   holds too many (only with [`EvictionStrategy::Scheduled`])
//!
//! Workers hold a weak reference to their target and stop when it is dropped
//! or when [`Workers::shutdown`] is called.

mod evict;
mod sweep;

use std::sync::Weak;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::EvictionStrategy;
use crate::error::{CacheError, Result};

pub(crate) use evict::spawn_eviction_task;
pub(crate) use sweep::spawn_sweep_task;

/// Period of the scheduled over-limit check
pub const EVICTION_INTERVAL: Duration = Duration::from_secs(1);

/// Delay before the first scheduled over-limit check
pub const EVICTION_INITIAL_DELAY: Duration = Duration::from_millis(500);

// == Maintain ==
/// Maintenance passes a worker can run against its target.
pub(crate) trait Maintain: Send + Sync + 'static {
    /// Removes expired entries, returning how many were removed.
    fn purge_expired(&self) -> usize;

    /// Evicts entries if over the count limit, returning how many were removed.
    fn enforce_count_limit(&self) -> usize;
}

// == Workers ==
/// Handles to the running workers of one cache.
#[derive(Debug)]
pub(crate) struct Workers {
    shutdown: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl Workers {
    /// Spawns the expiry sweep and, for the scheduled strategy, the eviction worker.
    pub fn spawn<T: Maintain>(
        runtime: &Handle,
        target: Weak<T>,
        sweep_interval: Duration,
        eviction: EvictionStrategy,
    ) -> Self {
        let (shutdown, signal) = watch::channel(false);

        let mut handles = vec![spawn_sweep_task(
            runtime,
            target.clone(),
            sweep_interval,
            signal.clone(),
        )];
        if eviction == EvictionStrategy::Scheduled {
            handles.push(spawn_eviction_task(
                runtime,
                target,
                EVICTION_INITIAL_DELAY,
                EVICTION_INTERVAL,
                signal,
            ));
        }

        Self { shutdown, handles }
    }

    /// Signals every worker to stop and waits for all of them.
    ///
    /// Returns the first worker failure, after every worker has been awaited.
    pub async fn shutdown(self) -> Result<()> {
        // Workers that already exited have dropped their receivers
        let _ = self.shutdown.send(true);

        let mut outcome = Ok(());
        for handle in self.handles {
            if let Err(err) = handle.await {
                warn!("Cache worker failed during shutdown: {}", err);
                if outcome.is_ok() {
                    outcome = Err(CacheError::from(err));
                }
            }
        }
        info!("Cache workers stopped");
        outcome
    }
}

/// Resolves once shutdown is signalled or every sender is gone.
async fn stopped(signal: &mut watch::Receiver<bool>) {
    while !*signal.borrow_and_update() {
        if signal.changed().await.is_err() {
            return;
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::Maintain;

    /// Counts maintenance passes instead of touching a cache.
    #[derive(Debug, Default)]
    pub struct Recorder {
        pub sweeps: AtomicUsize,
        pub evictions: AtomicUsize,
    }

    impl Maintain for Recorder {
        fn purge_expired(&self) -> usize {
            self.sweeps.fetch_add(1, Ordering::SeqCst);
            1
        }

        fn enforce_count_limit(&self) -> usize {
            self.evictions.fetch_add(1, Ordering::SeqCst);
            0
        }
    }
}
