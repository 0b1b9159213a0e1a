//! Configuration Module
//!
//! Runtime tunables for a cache instance, loadable from environment variables.
//! Out-of-range values are clamped rather than rejected.

use std::env;
use std::str::FromStr;

use crate::error::{CacheError, Result};

// == Public Constants ==
/// Count limit used when none is configured
pub const DEFAULT_COUNT_LIMIT: usize = 1_000_000;

/// Lowest accepted count limit
pub const MIN_COUNT_LIMIT: usize = 10_000;

/// Sweep interval used when none (or a value below one second) is configured
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 5;

/// Longest accepted sweep interval
pub const MAX_SWEEP_INTERVAL_SECS: u64 = 300;

const ENV_SWEEP_INTERVAL: &str = "FAST_CACHE_SWEEP_INTERVAL";
const ENV_COUNT_LIMIT: &str = "FAST_CACHE_COUNT_LIMIT";
const ENV_EVICTION: &str = "FAST_CACHE_EVICTION";

// == Eviction Strategy ==
/// How a cache keeps its entry count under the limit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EvictionStrategy {
    /// A background worker checks the count once per second
    #[default]
    Scheduled,
    /// Writers occasionally check the count themselves
    Inline,
}

impl FromStr for EvictionStrategy {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "scheduled" => Ok(EvictionStrategy::Scheduled),
            "inline" => Ok(EvictionStrategy::Inline),
            other => Err(CacheError::InvalidConfig(format!(
                "unknown eviction strategy '{}'",
                other
            ))),
        }
    }
}

/// Cache configuration parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Seconds between expiry sweeps
    pub sweep_interval_secs: u64,
    /// Entry count that triggers eviction
    pub count_limit: usize,
    /// Count-limit enforcement strategy
    pub eviction: EvictionStrategy,
}

impl CacheConfig {
    /// Sets the sweep interval. Values below one second fall back to the
    /// default and values above the maximum are clamped.
    pub fn with_sweep_interval(mut self, secs: i64) -> Self {
        self.sweep_interval_secs = normalize_sweep_interval(secs);
        self
    }

    /// Sets the count limit, floored to [`MIN_COUNT_LIMIT`].
    pub fn with_count_limit(mut self, limit: usize) -> Self {
        self.count_limit = normalize_count_limit(limit);
        self
    }

    pub fn with_eviction(mut self, eviction: EvictionStrategy) -> Self {
        self.eviction = eviction;
        self
    }

    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `FAST_CACHE_SWEEP_INTERVAL` - Expiry sweep period in seconds (default: 5, max: 300)
    /// - `FAST_CACHE_COUNT_LIMIT` - Entry count limit (default: 1000000, min: 10000)
    /// - `FAST_CACHE_EVICTION` - `scheduled` or `inline` (default: scheduled)
    ///
    /// Unparsable values fall back to their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Like [`CacheConfig::from_env`], but reports unparsable values.
    pub fn try_from_env() -> Result<Self> {
        Self::try_from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            sweep_interval_secs: lookup(ENV_SWEEP_INTERVAL)
                .and_then(|v| v.trim().parse::<i64>().ok())
                .map(normalize_sweep_interval)
                .unwrap_or(defaults.sweep_interval_secs),
            count_limit: lookup(ENV_COUNT_LIMIT)
                .and_then(|v| v.trim().parse::<usize>().ok())
                .map(normalize_count_limit)
                .unwrap_or(defaults.count_limit),
            eviction: lookup(ENV_EVICTION)
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.eviction),
        }
    }

    fn try_from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(raw) = lookup(ENV_SWEEP_INTERVAL) {
            let secs = raw
                .trim()
                .parse::<i64>()
                .map_err(|_| invalid(ENV_SWEEP_INTERVAL, &raw))?;
            config = config.with_sweep_interval(secs);
        }
        if let Some(raw) = lookup(ENV_COUNT_LIMIT) {
            let limit = raw
                .trim()
                .parse::<usize>()
                .map_err(|_| invalid(ENV_COUNT_LIMIT, &raw))?;
            config = config.with_count_limit(limit);
        }
        if let Some(raw) = lookup(ENV_EVICTION) {
            config = config.with_eviction(raw.parse()?);
        }
        Ok(config)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
            count_limit: DEFAULT_COUNT_LIMIT,
            eviction: EvictionStrategy::default(),
        }
    }
}

// == Normalization ==
/// Maps a requested sweep interval onto `1..=MAX_SWEEP_INTERVAL_SECS`.
pub fn normalize_sweep_interval(secs: i64) -> u64 {
    if secs < 1 {
        DEFAULT_SWEEP_INTERVAL_SECS
    } else {
        (secs as u64).min(MAX_SWEEP_INTERVAL_SECS)
    }
}

/// Floors a requested count limit to [`MIN_COUNT_LIMIT`].
pub fn normalize_count_limit(limit: usize) -> usize {
    limit.max(MIN_COUNT_LIMIT)
}

fn invalid(name: &str, raw: &str) -> CacheError {
    CacheError::InvalidConfig(format!("{}={}", name, raw))
}
