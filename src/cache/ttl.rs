//! TTL Module
//!
//! The TTL requested by a write.

use std::time::Duration;

// == Ttl ==
/// Time-to-live requested by [`Cache::set`](crate::Cache::set).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// Expire this many seconds from now. Negative values make the write a no-op.
    Seconds(i64),
    /// Keep the key's current remaining TTL, or use
    /// [`KEEP_FALLBACK_TTL_SECS`](crate::cache::KEEP_FALLBACK_TTL_SECS)
    /// if the key is not live.
    Keep,
}

impl From<i64> for Ttl {
    fn from(secs: i64) -> Self {
        Ttl::Seconds(secs)
    }
}

impl From<i32> for Ttl {
    fn from(secs: i32) -> Self {
        Ttl::Seconds(i64::from(secs))
    }
}

impl From<Duration> for Ttl {
    fn from(duration: Duration) -> Self {
        Ttl::Seconds(i64::try_from(duration.as_secs()).unwrap_or(i64::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_from_seconds() {
        assert_eq!(Ttl::from(10), Ttl::Seconds(10));
        assert_eq!(Ttl::from(-1), Ttl::Seconds(-1));
        assert_eq!(Ttl::from(7_200i64), Ttl::Seconds(7_200));
    }

    #[test]
    fn test_ttl_from_duration_truncates() {
        assert_eq!(Ttl::from(Duration::from_millis(2_900)), Ttl::Seconds(2));
        assert_eq!(Ttl::from(Duration::MAX), Ttl::Seconds(i64::MAX));
    }
}
