//! Ordered Index Module
//!
//! Thread-safe front for the skip list. Structural changes take the write
//! lock; lookups share the read lock.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::index::{Entry, SkipList};

// == Ordered Index ==
/// Key -> (score, value) map kept in ascending score order.
///
/// Safe to share between threads. Knows nothing about time: a score is just
/// an ordering key to this type.
#[derive(Debug)]
pub struct OrderedIndex<V> {
    inner: RwLock<SkipList<V>>,
}

impl<V> OrderedIndex<V> {
    // == Constructor ==
    /// Creates an empty index.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(SkipList::new()),
        }
    }

    // == Upsert ==
    /// Inserts `key`, or replaces the score and value of an existing key.
    pub fn upsert(&self, key: impl Into<String>, score: i64, value: Arc<V>) {
        self.inner.write().insert(key.into(), score, value);
    }

    // == Get ==
    /// Returns the score and value under `key`. Does not compare the score
    /// against anything.
    pub fn get(&self, key: &str) -> Option<(i64, Arc<V>)> {
        self.inner.read().get(key)
    }

    // == Remove ==
    /// Removes a single key.
    pub fn remove(&self, key: &str) -> Option<Entry<V>> {
        self.inner.write().remove(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    // == Range Removal ==
    /// Removes every entry whose score lies in `[min, max]`.
    ///
    /// Returns the number of entries removed. An inverted range removes nothing.
    pub fn remove_range_by_score(&self, min: i64, max: i64) -> usize {
        self.inner.write().remove_range_by_score(min, max)
    }

    /// Removes `count` entries starting at zero-based rank `start`
    /// (rank 0 holds the smallest score).
    ///
    /// Returns the number of entries removed, which is short when fewer than
    /// `count` entries follow `start`.
    pub fn remove_range_by_rank(&self, start: usize, count: usize) -> usize {
        self.inner.write().remove_range_by_rank(start, count)
    }

    // == Ordered Inspection ==
    /// Zero-based rank of `key`.
    pub fn rank(&self, key: &str) -> Option<usize> {
        self.inner.read().rank(key)
    }

    /// Up to `count` entries starting at rank `start`, lowest score first.
    pub fn range_by_rank(&self, start: usize, count: usize) -> Vec<Entry<V>> {
        self.inner.read().range_by_rank(start, count)
    }

    /// The entry with the lowest score.
    pub fn first(&self) -> Option<Entry<V>> {
        self.range_by_rank(0, 1).pop()
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.inner.write().clear();
    }
}

impl<V> Default for OrderedIndex<V> {
    fn default() -> Self {
        Self::new()
    }
}
