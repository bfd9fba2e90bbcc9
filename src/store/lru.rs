//! LRU Tracker Module
//!
//! Implements Least Recently Used tracking for store eviction.

use std::collections::VecDeque;

// == LRU Tracker ==
/// Tracks access order for LRU eviction strategy.
///
/// Keys are stored in a VecDeque where:
/// - Front = Most recently used
/// - Back = Least recently used
#[derive(Debug, Default)]
pub struct LruTracker {
    /// Order of keys by access time
    order: VecDeque<String>,
}

impl LruTracker {
    // == Constructor ==
    /// Creates a new empty LRU tracker.
    pub fn new() -> Self {
        Self {
            order: VecDeque::new(),
        }
    }

    /// Rebuilds access order from persisted `(key, last_accessed)` pairs.
    ///
    /// Keys sharing a timestamp keep no particular relative order.
    pub fn from_recency<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, u64)>,
    {
        let mut entries: Vec<(String, u64)> = entries.into_iter().collect();
        // Newest first, matching the front-is-recent layout
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        Self {
            order: entries.into_iter().map(|(key, _)| key).collect(),
        }
    }

    // == Touch ==
    /// Marks a key as recently used (moves to front).
    pub fn touch(&mut self, key: &str) {
        self.remove(key);
        self.order.push_front(key.to_string());
    }

    // == Remove ==
    /// Removes a key from the tracker.
    pub fn remove(&mut self, key: &str) {
        self.order.retain(|k| k != key);
    }

    // == Evict Oldest ==
    /// Removes and returns the least recently used key accepted by `evictable`.
    ///
    /// Keys rejected by the predicate keep their position.
    pub fn evict_oldest_where<F>(&mut self, mut evictable: F) -> Option<String>
    where
        F: FnMut(&str) -> bool,
    {
        let index = self.order.iter().rposition(|k| evictable(k))?;
        self.order.remove(index)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.order.iter().any(|k| k == key)
    }

    #[cfg(test)]
    pub(crate) fn peek_oldest(&self) -> Option<&String> {
        self.order.back()
    }
}
