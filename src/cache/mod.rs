//! Cache Module
//!
//! TTL semantics and count-limit policy on top of the ordered index.

mod clock;
mod stats;
mod store;
mod ttl;


// Re-export public types
pub use clock::now_unix;
pub use stats::CacheStats;
pub(crate) use stats::StatsCounter;
pub use store::Cache;
pub use ttl::Ttl;

// == Public Constants ==
/// Longest TTL a single write can request, in seconds
pub const MAX_TTL_SECS: i64 = 7200;

/// TTL used by [`Ttl::Keep`] when the key is absent or already expired
pub const KEEP_FALLBACK_TTL_SECS: i64 = 30;

/// Fraction of the count limit removed per eviction pass
pub const EVICTION_RATE: f64 = 0.15;

/// Inline eviction runs on one over-limit write in this many
pub const INLINE_EVICTION_ODDS: u32 = 10;
