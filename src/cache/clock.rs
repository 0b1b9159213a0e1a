//! Wall clock in whole Unix seconds.

use chrono::Utc;

/// Returns the current Unix timestamp in seconds.
pub fn now_unix() -> i64 {
    Utc::now().timestamp()
}
