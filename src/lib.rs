//! Fast Cache - an embeddable in-process key-value cache
//!
//! Entries carry a per-key TTL in whole seconds and the total entry count is
//! bounded. Entries live in an [`OrderedIndex`] scored by their expiry
//! timestamp, so expired entries and the soonest-to-expire entries can be
//! removed as ranges.

pub mod cache;
pub mod config;
pub mod error;
pub mod index;
mod tasks;

pub use cache::{Cache, CacheStats, Ttl};
pub use config::{CacheConfig, EvictionStrategy};
pub use error::{CacheError, Result};
pub use index::{Entry, OrderedIndex};
