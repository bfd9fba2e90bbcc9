//! Store Module
//!
//! Bounded, persisted key-value storage with per-key expiry and LRU eviction.

mod backend;
mod bounded;
mod entry;
mod lru;
mod stats;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use backend::{FileBackend, MemoryBackend, StorageBackend};
pub use bounded::{BoundedStore, StoreOptions};
pub use entry::EntryMeta;
pub use lru::LruTracker;
pub use stats::StoreStats;

// == Public Constants ==
/// Backend key holding the JSON map of entry bookkeeping
pub const META_KEY: &str = "__nav_cache_meta__";

/// Store handle shared between the existence cache, resolver, and HTTP layer.
pub type SharedStore = std::sync::Arc<tokio::sync::RwLock<BoundedStore>>;

/// Joins `parts` with `:` into one store key.
///
/// `%` and `:` inside a part are percent-escaped, so distinct part lists never
/// produce the same key.
pub fn compose_key(parts: &[&str]) -> String {
    let mut key = String::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            key.push(':');
        }
        for ch in part.chars() {
            match ch {
                '%' => key.push_str("%25"),
                ':' => key.push_str("%3A"),
                _ => key.push(ch),
            }
        }
    }
    key
}
