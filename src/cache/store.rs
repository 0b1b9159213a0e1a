//! Cache Store Module
//!
//! Main cache engine: TTL bookkeeping and count-limit enforcement over an
//! ordered index whose scores are absolute expiry timestamps.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tracing::{debug, trace};

use crate::cache::{
    now_unix, CacheStats, StatsCounter, Ttl, EVICTION_RATE, INLINE_EVICTION_ODDS,
    KEEP_FALLBACK_TTL_SECS, MAX_TTL_SECS,
};
use crate::config::{normalize_count_limit, normalize_sweep_interval, CacheConfig, EvictionStrategy};
use crate::error::{CacheError, Result};
use crate::index::OrderedIndex;
use crate::tasks::{Maintain, Workers};

// == Cache Interior ==
/// State shared by every handle and by the background workers.
struct Inner<V> {
    /// Entries ordered by expiry timestamp
    index: OrderedIndex<V>,
    count_limit: AtomicUsize,
    eviction: EvictionStrategy,
    /// Makes "check length, then evict" atomic between evictors
    evict_lock: Mutex<()>,
    stats: StatsCounter,
    workers: Mutex<Option<Workers>>,
}

impl<V> Inner<V> {
    /// Remaining whole seconds for a live key, measured against `now`.
    fn remaining(&self, key: &str, now: i64) -> Option<i64> {
        let (score, _) = self.index.get(key)?;
        // Expired once the expiry second itself is reached
        (score > now).then_some(score - now)
    }

    fn maybe_evict_inline(&self) {
        if self.index.len() >= self.count_limit.load(Ordering::Relaxed)
            && fastrand::u32(..INLINE_EVICTION_ODDS) == 0
        {
            self.evict_over_limit();
        }
    }

    fn evict_over_limit(&self) -> usize {
        let limit = self.count_limit.load(Ordering::Relaxed);
        if self.index.len() < limit {
            return 0;
        }

        let _guard = self.evict_lock.lock();
        // Another evictor may have finished while we waited
        let len = self.index.len();
        if len < limit {
            return 0;
        }

        let evicted = self.index.remove_range_by_rank(0, eviction_batch(limit));
        self.stats.record_evictions(evicted);
        debug!(
            "Evicted {} soonest-to-expire entries ({} stored, limit {})",
            evicted, len, limit
        );
        evicted
    }

    fn sweep_expired(&self) -> usize {
        let removed = self.index.remove_range_by_score(i64::MIN, now_unix());
        self.stats.record_expired(removed);
        removed
    }
}

impl<V: Send + Sync + 'static> Maintain for Inner<V> {
    fn purge_expired(&self) -> usize {
        self.sweep_expired()
    }

    fn enforce_count_limit(&self) -> usize {
        self.evict_over_limit()
    }
}

/// Number of entries removed by one eviction pass.
fn eviction_batch(limit: usize) -> usize {
    ((limit as f64 * EVICTION_RATE) as usize).max(1)
}

// == Cache Handle ==
/// An in-process key-value cache with per-key TTL and a bounded entry count.
///
/// Reads and writes are synchronous. Construction spawns background workers
/// on the current tokio runtime: an expiry sweep and, with
/// [`EvictionStrategy::Scheduled`], an over-limit eviction pass once a second.
/// Call [`Cache::shutdown`] to stop them, or drop every handle and they exit
/// on their next tick.
///
/// Handles are cheap to clone and share one cache.
///
/// # Example
/// ```no_run
/// # async fn demo() -> fast_cache::Result<()> {
/// use fast_cache::{Cache, Ttl};
///
/// let cache = Cache::new()?;
/// cache.set("greeting", "hello".to_string(), Ttl::Seconds(60));
///
/// let (value, ttl) = cache.get("greeting").unwrap();
/// assert_eq!(*value, "hello");
/// assert!(ttl <= 60);
///
/// cache.shutdown().await?;
/// # Ok(())
/// # }
/// ```
pub struct Cache<V> {
    inner: Arc<Inner<V>>,
}

impl<V> Clone for Cache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V: Send + Sync + 'static> Cache<V> {
    // == Constructors ==
    /// Creates a cache with the default configuration.
    ///
    /// # Errors
    /// [`CacheError::NoRuntime`] if called outside a tokio runtime.
    pub fn new() -> Result<Self> {
        Self::with_config(CacheConfig::default())
    }

    /// Creates a cache sweeping expired entries every `secs` seconds.
    ///
    /// Values below one second fall back to the default interval; values
    /// above the maximum are clamped.
    pub fn with_interval(secs: i64) -> Result<Self> {
        Self::with_config(CacheConfig::default().with_sweep_interval(secs))
    }

    /// Creates a cache from an explicit configuration. Out-of-range values are
    /// normalized the same way as the `CacheConfig::with_*` setters.
    pub fn with_config(config: CacheConfig) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| CacheError::NoRuntime)?;

        let sweep_secs =
            normalize_sweep_interval(i64::try_from(config.sweep_interval_secs).unwrap_or(i64::MAX));
        let inner = Arc::new(Inner {
            index: OrderedIndex::new(),
            count_limit: AtomicUsize::new(normalize_count_limit(config.count_limit)),
            eviction: config.eviction,
            evict_lock: Mutex::new(()),
            stats: StatsCounter::new(),
            workers: Mutex::new(None),
        });

        let workers = Workers::spawn(
            &runtime,
            Arc::downgrade(&inner),
            Duration::from_secs(sweep_secs),
            config.eviction,
        );
        *inner.workers.lock() = Some(workers);

        debug!(
            "Cache created: sweep_interval={}s, count_limit={}, eviction={:?}",
            sweep_secs,
            inner.count_limit.load(Ordering::Relaxed),
            config.eviction
        );
        Ok(Self { inner })
    }

    // == Get ==
    /// Returns the value under `key` with its remaining TTL in seconds.
    ///
    /// An entry whose expiry second has been reached is reported as absent even
    /// if the sweep has not removed it yet.
    pub fn get(&self, key: &str) -> Option<(Arc<V>, i64)> {
        let hit = self.inner.index.get(key).and_then(|(score, value)| {
            let now = now_unix();
            (score > now).then(|| (value, score - now))
        });

        match hit {
            Some(_) => self.inner.stats.record_hit(),
            None => self.inner.stats.record_miss(),
        }
        hit
    }

    // == TTL ==
    /// Remaining TTL of a live key, in seconds.
    pub fn ttl(&self, key: &str) -> Option<i64> {
        self.inner.remaining(key, now_unix())
    }

    // == Set ==
    /// Stores `value` under `key`.
    ///
    /// - A negative TTL makes the call a no-op.
    /// - TTLs above [`MAX_TTL_SECS`] are clamped.
    /// - [`Ttl::Keep`] keeps the key's remaining TTL if it is live, otherwise
    ///   uses [`KEEP_FALLBACK_TTL_SECS`].
    ///
    /// Writing an existing key replaces its value and expiry.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: impl Into<Ttl>) {
        let key = key.into();
        let now = now_unix();
        let secs = match ttl.into() {
            Ttl::Seconds(secs) if secs < 0 => {
                trace!("Ignoring write of '{}' with negative TTL {}", key, secs);
                return;
            }
            Ttl::Seconds(secs) => secs.min(MAX_TTL_SECS),
            Ttl::Keep => self
                .inner
                .remaining(&key, now)
                .unwrap_or(KEEP_FALLBACK_TTL_SECS),
        };

        if self.inner.eviction == EvictionStrategy::Inline {
            self.inner.maybe_evict_inline();
        }
        self.inner.index.upsert(key, now + secs, Arc::new(value));
    }

    // == Delete ==
    /// Removes `key`. Returns true if it was stored, expired or not.
    pub fn delete(&self, key: &str) -> bool {
        self.inner.index.remove(key).is_some()
    }

    // == Length ==
    /// Number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.inner.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.index.is_empty()
    }

    // == Count Limit ==
    pub fn count_limit(&self) -> usize {
        self.inner.count_limit.load(Ordering::Relaxed)
    }

    /// Sets the count limit, floored to
    /// [`MIN_COUNT_LIMIT`](crate::config::MIN_COUNT_LIMIT).
    pub fn set_count_limit(&self, limit: usize) {
        self.inner
            .count_limit
            .store(normalize_count_limit(limit), Ordering::Relaxed);
    }

    // == Maintenance ==
    /// Runs one expiry sweep now. Returns the number of entries removed.
    pub fn purge_expired(&self) -> usize {
        self.inner.sweep_expired()
    }

    /// Runs one count-limit pass now: if the cache holds at least
    /// `count_limit` entries, removes 15% of the limit, soonest-to-expire first.
    /// Returns the number of entries removed.
    pub fn enforce_count_limit(&self) -> usize {
        self.inner.evict_over_limit()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.inner.stats.snapshot(self.inner.index.len())
    }

    // == Shutdown ==
    /// Stops the background workers and waits for them to exit.
    ///
    /// The cache stays usable afterwards, but nothing sweeps or evicts it.
    /// Calling this more than once is a no-op.
    ///
    /// # Errors
    /// [`CacheError::Worker`] if a worker panicked.
    pub async fn shutdown(&self) -> Result<()> {
        let workers = self.inner.workers.lock().take();
        match workers {
            Some(workers) => workers.shutdown().await,
            None => Ok(()),
        }
    }
}
