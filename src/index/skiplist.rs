//! Skip List Module
//!
//! Indexable skip list backing the ordered index. Nodes live in an arena and
//! link to each other by slot number; every forward link records its span
//! (how many level-0 hops it covers) so rank queries stay logarithmic.

use std::collections::HashMap;
use std::sync::Arc;

use crate::index::{Entry, MAX_LEVEL};

/// Arena slot of the header node
const HEAD: usize = 0;

/// A node is promoted to the next level with probability 1 / PROMOTE_ODDS
const PROMOTE_ODDS: u32 = 4;

// == Level ==
#[derive(Debug, Clone, Copy, Default)]
struct Level {
    forward: Option<usize>,
    span: usize,
}

// == Node ==
#[derive(Debug)]
struct Node<V> {
    key: String,
    score: i64,
    /// `None` for the header and for vacant arena slots
    value: Option<Arc<V>>,
    levels: Vec<Level>,
}

impl<V> Node<V> {
    fn header() -> Self {
        Self {
            key: String::new(),
            score: i64::MIN,
            value: None,
            levels: vec![Level::default(); MAX_LEVEL],
        }
    }

    fn vacant() -> Self {
        Self {
            key: String::new(),
            score: 0,
            value: None,
            levels: Vec::new(),
        }
    }

    /// True if this node sorts strictly before `(score, key)`.
    fn precedes(&self, score: i64, key: &str) -> bool {
        self.score < score || (self.score == score && self.key.as_str() < key)
    }

    fn entry(&self) -> Option<Entry<V>> {
        self.value
            .as_ref()
            .map(|value| Entry::new(self.key.clone(), self.score, Arc::clone(value)))
    }

    fn into_entry(self) -> Option<Entry<V>> {
        let Node {
            key, score, value, ..
        } = self;
        value.map(|value| Entry::new(key, score, value))
    }
}

// == Skip List ==
/// Single-threaded indexable skip list ordered by ascending `(score, key)`.
#[derive(Debug)]
pub(crate) struct SkipList<V> {
    /// Node arena; slot 0 is the header
    nodes: Vec<Node<V>>,
    /// Vacant arena slots available for reuse
    free: Vec<usize>,
    /// Key -> arena slot
    lookup: HashMap<String, usize>,
    /// Number of levels currently in use (at least 1)
    level: usize,
    len: usize,
}

impl<V> SkipList<V> {
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::header()],
            free: Vec::new(),
            lookup: HashMap::new(),
            level: 1,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    // == Lookup ==
    /// Returns the score and value stored under `key`.
    pub fn get(&self, key: &str) -> Option<(i64, Arc<V>)> {
        let node = &self.nodes[*self.lookup.get(key)?];
        node.value.as_ref().map(|value| (node.score, Arc::clone(value)))
    }

    // == Upsert ==
    /// Inserts `key`, or replaces its score and value if it already exists.
    pub fn insert(&mut self, key: String, score: i64, value: Arc<V>) {
        if let Some(&slot) = self.lookup.get(&key) {
            if self.nodes[slot].score == score {
                // Position is unchanged, swap the payload in place
                self.nodes[slot].value = Some(value);
                return;
            }
            self.remove(&key);
        }

        let mut update = [HEAD; MAX_LEVEL];
        let mut rank = [0usize; MAX_LEVEL];
        let mut x = HEAD;
        for i in (0..self.level).rev() {
            rank[i] = if i == self.level - 1 { 0 } else { rank[i + 1] };
            while let Some(next) = self.nodes[x].levels[i].forward {
                if !self.nodes[next].precedes(score, &key) {
                    break;
                }
                rank[i] += self.nodes[x].levels[i].span;
                x = next;
            }
            update[i] = x;
        }

        let level = random_level();
        if level > self.level {
            for i in self.level..level {
                rank[i] = 0;
                update[i] = HEAD;
                self.nodes[HEAD].levels[i].span = self.len;
            }
            self.level = level;
        }

        let slot = self.alloc(Node {
            key: key.clone(),
            score,
            value: Some(value),
            levels: vec![Level::default(); level],
        });

        for i in 0..level {
            let prev = update[i];
            let hops = rank[0] - rank[i];
            self.nodes[slot].levels[i].forward = self.nodes[prev].levels[i].forward;
            self.nodes[slot].levels[i].span = self.nodes[prev].levels[i].span - hops;
            self.nodes[prev].levels[i].forward = Some(slot);
            self.nodes[prev].levels[i].span = hops + 1;
        }
        for i in level..self.level {
            self.nodes[update[i]].levels[i].span += 1;
        }

        self.len += 1;
        self.lookup.insert(key, slot);
    }

    // == Remove ==
    /// Removes `key` and returns what it held.
    pub fn remove(&mut self, key: &str) -> Option<Entry<V>> {
        let slot = *self.lookup.get(key)?;
        let score = self.nodes[slot].score;

        let mut update = [HEAD; MAX_LEVEL];
        let mut x = HEAD;
        for i in (0..self.level).rev() {
            while let Some(next) = self.nodes[x].levels[i].forward {
                if !self.nodes[next].precedes(score, key) {
                    break;
                }
                x = next;
            }
            update[i] = x;
        }

        if self.nodes[x].levels[0].forward != Some(slot) {
            return None;
        }
        self.unlink(slot, &update)
    }

    // == Remove By Score ==
    /// Removes every entry with `min <= score <= max`. Returns the removed count.
    pub fn remove_range_by_score(&mut self, min: i64, max: i64) -> usize {
        if min > max || self.is_empty() {
            return 0;
        }

        let mut update = [HEAD; MAX_LEVEL];
        let mut x = HEAD;
        for i in (0..self.level).rev() {
            while let Some(next) = self.nodes[x].levels[i].forward {
                if self.nodes[next].score >= min {
                    break;
                }
                x = next;
            }
            update[i] = x;
        }

        let mut removed = 0;
        let mut cursor = self.nodes[x].levels[0].forward;
        while let Some(slot) = cursor {
            if self.nodes[slot].score > max {
                break;
            }
            cursor = self.nodes[slot].levels[0].forward;
            self.unlink(slot, &update);
            removed += 1;
        }
        removed
    }

    // == Remove By Rank ==
    /// Removes `count` entries starting at zero-based rank `start`.
    /// Returns the removed count, which is short if the list runs out.
    pub fn remove_range_by_rank(&mut self, start: usize, count: usize) -> usize {
        if count == 0 || start >= self.len {
            return 0;
        }

        let mut update = [HEAD; MAX_LEVEL];
        let mut traversed = 0;
        let mut x = HEAD;
        for i in (0..self.level).rev() {
            while let Some(next) = self.nodes[x].levels[i].forward {
                if traversed + self.nodes[x].levels[i].span > start {
                    break;
                }
                traversed += self.nodes[x].levels[i].span;
                x = next;
            }
            update[i] = x;
        }

        let mut removed = 0;
        let mut cursor = self.nodes[x].levels[0].forward;
        while let Some(slot) = cursor {
            if removed == count {
                break;
            }
            cursor = self.nodes[slot].levels[0].forward;
            self.unlink(slot, &update);
            removed += 1;
        }
        removed
    }

    // == Rank ==
    /// Zero-based position of `key` in ascending score order.
    pub fn rank(&self, key: &str) -> Option<usize> {
        let slot = *self.lookup.get(key)?;
        let score = self.nodes[slot].score;

        let mut rank = 0;
        let mut x = HEAD;
        for i in (0..self.level).rev() {
            while let Some(next) = self.nodes[x].levels[i].forward {
                let node = &self.nodes[next];
                if !(node.precedes(score, key) || next == slot) {
                    break;
                }
                rank += self.nodes[x].levels[i].span;
                x = next;
            }
            if x == slot {
                return Some(rank - 1);
            }
        }
        None
    }

    // == Range By Rank ==
    /// Up to `count` entries starting at zero-based rank `start`, in order.
    pub fn range_by_rank(&self, start: usize, count: usize) -> Vec<Entry<V>> {
        if count == 0 || start >= self.len {
            return Vec::new();
        }

        let mut traversed = 0;
        let mut x = HEAD;
        for i in (0..self.level).rev() {
            while let Some(next) = self.nodes[x].levels[i].forward {
                if traversed + self.nodes[x].levels[i].span > start {
                    break;
                }
                traversed += self.nodes[x].levels[i].span;
                x = next;
            }
        }

        let mut out = Vec::with_capacity(count.min(self.len - start));
        let mut cursor = self.nodes[x].levels[0].forward;
        while let Some(slot) = cursor {
            if out.len() == count {
                break;
            }
            out.extend(self.nodes[slot].entry());
            cursor = self.nodes[slot].levels[0].forward;
        }
        out
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    // == Internals ==
    fn alloc(&mut self, node: Node<V>) -> usize {
        match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = node;
                slot
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    /// Splices `slot` out of every level. `update[i]` must be the last node
    /// before `slot` on level `i`.
    fn unlink(&mut self, slot: usize, update: &[usize; MAX_LEVEL]) -> Option<Entry<V>> {
        for (i, &prev) in update.iter().enumerate().take(self.level) {
            if self.nodes[prev].levels[i].forward == Some(slot) {
                let Level { forward, span } = self.nodes[slot].levels[i];
                let prev_level = &mut self.nodes[prev].levels[i];
                prev_level.span = prev_level.span + span - 1;
                prev_level.forward = forward;
            } else {
                self.nodes[prev].levels[i].span -= 1;
            }
        }
        while self.level > 1 && self.nodes[HEAD].levels[self.level - 1].forward.is_none() {
            self.level -= 1;
        }

        self.len -= 1;
        let node = std::mem::replace(&mut self.nodes[slot], Node::vacant());
        self.lookup.remove(&node.key);
        self.free.push(slot);
        node.into_entry()
    }
}

impl<V> Default for SkipList<V> {
    fn default() -> Self {
        Self::new()
    }
}

fn random_level() -> usize {
    let mut level = 1;
    while level < MAX_LEVEL && fastrand::u32(..PROMOTE_ODDS) == 0 {
        level += 1;
    }
    level
}
