//! Index Entry Module
//!
//! Snapshot of a single entry held by the ordered index.

use std::fmt;
use std::sync::Arc;

// == Entry ==
/// A key with its score and shared value, as seen at lookup time.
pub struct Entry<V> {
    /// Unique key
    pub key: String,
    /// Ordering score (an absolute Unix-second expiry for cache entries)
    pub score: i64,
    /// Shared payload
    pub value: Arc<V>,
}

impl<V> Entry<V> {
    /// Creates a new entry snapshot.
    pub fn new(key: String, score: i64, value: Arc<V>) -> Self {
        Self { key, score, value }
    }
}

impl<V> Clone for Entry<V> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            score: self.score,
            value: Arc::clone(&self.value),
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for Entry<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("key", &self.key)
            .field("score", &self.score)
            .field("value", &self.value)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_clone_shares_value() {
        let entry = Entry::new("k".to_string(), 10, Arc::new(vec![1u8, 2, 3]));
        let copy = entry.clone();

        assert_eq!(copy.key, "k");
        assert_eq!(copy.score, 10);
        assert!(Arc::ptr_eq(&entry.value, &copy.value));
    }
}
