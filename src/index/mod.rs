//! Ordered Index Module
//!
//! A key -> (score, value) map that also keeps every entry in ascending score
//! order, so ranges can be removed by score or by rank.

mod entry;
mod ordered;
mod skiplist;

pub use entry::Entry;
pub use ordered::OrderedIndex;
pub(crate) use skiplist::SkipList;

// == Public Constants ==
/// Maximum number of levels a skip list node can have
pub const MAX_LEVEL: usize = 32;
