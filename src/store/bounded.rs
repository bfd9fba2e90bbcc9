//! Bounded Store Module
//!
//! Capacity-limited store combining a persistent backend with LRU tracking and TTL expiration.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::config::{Config, DEFAULT_CAPACITY_BYTES, DEFAULT_PROTECTED_KEYS};
use crate::error::StoreError;
use crate::store::{EntryMeta, LruTracker, StorageBackend, StoreStats, META_KEY};

// == Store Options ==
/// Construction parameters for a [`BoundedStore`].
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Upper bound on the summed size of live entries
    pub capacity_bytes: usize,
    /// Keys an emergency purge or eviction never removes
    pub protected_keys: HashSet<String>,
}

impl StoreOptions {
    pub fn new(capacity_bytes: usize) -> Self {
        Self {
            capacity_bytes,
            ..Self::default()
        }
    }

    pub fn with_protected_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.protected_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.capacity_bytes).with_protected_keys(config.protected_keys.iter().cloned())
    }
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            capacity_bytes: DEFAULT_CAPACITY_BYTES,
            protected_keys: DEFAULT_PROTECTED_KEYS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

// == Bounded Store ==
/// Persisted key-value store with a hard byte ceiling.
///
/// Values are stored as JSON through a [`StorageBackend`]; bookkeeping for
/// every key lives in a metadata map persisted under [`META_KEY`]. The store
/// never panics or propagates storage failures from [`set`](Self::set) and
/// [`get`](Self::get): a cache that cannot be written is simply a cache miss
/// later.
///
/// Lifecycle: created once with [`open`](Self::open), used for the lifetime of
/// the process, no teardown beyond drop.
pub struct BoundedStore {
    /// Persistent namespace
    backend: Arc<dyn StorageBackend>,
    /// Time source for recency and expiry
    clock: Arc<dyn Clock>,
    /// Bookkeeping per live key
    entries: HashMap<String, EntryMeta>,
    /// LRU access tracker
    lru: LruTracker,
    /// Health and performance statistics
    stats: StoreStats,
    /// Summed `size_bytes` of `entries`
    used_bytes: usize,
    capacity_bytes: usize,
    protected: HashSet<String>,
    /// Recency changed by reads that has not been written back yet
    meta_dirty: bool,
}

impl BoundedStore {
    // == Constructor ==
    /// Opens a store over `backend`, recovering any persisted bookkeeping.
    ///
    /// Unreadable metadata is treated as empty. Entries whose value has gone
    /// missing are forgotten, expired entries are purged, and if the persisted
    /// total exceeds `capacity_bytes` the oldest entries are evicted.
    pub fn open(
        backend: Arc<dyn StorageBackend>,
        clock: Arc<dyn Clock>,
        options: StoreOptions,
    ) -> Self {
        let mut entries = load_meta(backend.as_ref());
        entries.retain(|key, _| {
            key != META_KEY && matches!(backend.get_item(key), Ok(Some(_)))
        });

        let lru = LruTracker::from_recency(
            entries
                .iter()
                .map(|(key, meta)| (key.clone(), meta.last_accessed)),
        );
        let used_bytes = entries.values().map(|meta| meta.size_bytes).sum();

        let mut store = Self {
            backend,
            clock,
            entries,
            lru,
            stats: StoreStats::new(options.capacity_bytes),
            used_bytes,
            capacity_bytes: options.capacity_bytes,
            protected: options.protected_keys,
            meta_dirty: false,
        };

        store.purge_expired();
        if store.used_bytes > store.capacity_bytes {
            store.evict_down_to(store.capacity_bytes, None);
        }
        store.persist_meta();

        debug!(
            entries = store.entries.len(),
            used_bytes = store.used_bytes,
            capacity_bytes = store.capacity_bytes,
            "Bounded store opened"
        );
        store
    }

    // == Set ==
    /// Stores `value` under `key`, returning whether the write happened.
    ///
    /// Failures are logged and counted; see [`try_set`](Self::try_set) for the reason.
    pub fn set<T: Serialize + ?Sized>(&mut self, key: &str, value: &T, ttl_ms: Option<u64>) -> bool {
        match self.try_set(key, value, ttl_ms) {
            Ok(()) => true,
            Err(err) => {
                self.stats.record_write_failure();
                warn!(key, error = %err, "Store write skipped");
                false
            }
        }
    }

    /// Stores `value` under `key`, reporting why the write did not happen.
    ///
    /// Before writing, expired entries are purged and least recently used
    /// entries are evicted until the new entry fits. If the backend rejects the
    /// write, every unprotected key is purged and the write is retried once.
    pub fn try_set<T: Serialize + ?Sized>(
        &mut self,
        key: &str,
        value: &T,
        ttl_ms: Option<u64>,
    ) -> Result<(), StoreError> {
        if key == META_KEY {
            return Err(StoreError::ReservedKey(key.to_string()));
        }

        let serialized = serde_json::to_string(value)?;
        let size = key.len() + serialized.len();
        if size > self.capacity_bytes {
            return Err(StoreError::TooLarge {
                size,
                capacity: self.capacity_bytes,
            });
        }

        self.purge_expired();

        // An overwrite releases the old entry's bytes
        let replaced = self.entries.get(key).map(|m| m.size_bytes).unwrap_or(0);
        let budget = self.capacity_bytes - size;
        if self.used_bytes - replaced > budget {
            let target = budget + replaced;
            self.evict_down_to(target, Some(key));
            if self.used_bytes > target {
                return Err(StoreError::NoSpace {
                    key: key.to_string(),
                    needed: size,
                });
            }
        }

        if let Err(err) = self.backend.set_item(key, &serialized) {
            warn!(key, error = %err, "Storage write failed, purging unprotected keys");
            self.emergency_purge();
            self.backend.set_item(key, &serialized)?;
        }

        let now = self.clock.now_ms();
        if let Some(previous) = self
            .entries
            .insert(key.to_string(), EntryMeta::new(size, now, ttl_ms))
        {
            self.used_bytes -= previous.size_bytes;
        }
        self.used_bytes += size;
        self.lru.touch(key);
        self.persist_meta();

        Ok(())
    }

    // == Get ==
    /// Retrieves the value stored under `key`.
    ///
    /// Returns None if missing, expired, or unreadable. An expired entry is
    /// removed as a side effect. A hit refreshes the entry's recency in memory
    /// only; see [`flush`](Self::flush).
    pub fn get<T: DeserializeOwned>(&mut self, key: &str) -> Option<T> {
        let now = self.clock.now_ms();
        let Some(meta) = self.entries.get(key).copied() else {
            self.stats.record_miss();
            return None;
        };

        if meta.is_expired(now) {
            debug!(key, "Entry expired on read");
            self.drop_entry(key);
            self.stats.record_expiration();
            self.stats.record_miss();
            self.persist_meta();
            return None;
        }

        let raw = match self.backend.get_item(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                // Value vanished underneath the bookkeeping
                self.drop_entry(key);
                self.stats.record_miss();
                self.persist_meta();
                return None;
            }
            Err(err) => {
                warn!(key, error = %err, "Storage read failed");
                self.stats.record_miss();
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => {
                if let Some(meta) = self.entries.get_mut(key) {
                    meta.touch(now);
                }
                self.lru.touch(key);
                self.stats.record_hit();
                // Written back with the next mutation or flush
                self.meta_dirty = true;
                Some(value)
            }
            Err(err) => {
                warn!(key, error = %err, "Stored value could not be decoded");
                self.stats.record_miss();
                None
            }
        }
    }

    // == Remove ==
    /// Deletes both the value and its bookkeeping. Returns whether the key was tracked.
    pub fn remove(&mut self, key: &str) -> bool {
        if key == META_KEY {
            return false;
        }
        let existed = self.entries.contains_key(key);
        self.drop_entry(key);
        self.persist_meta();
        existed
    }

    /// Whether `key` holds a live entry. Does not affect recency.
    pub fn contains(&self, key: &str) -> bool {
        let now = self.clock.now_ms();
        self.entries
            .get(key)
            .is_some_and(|meta| !meta.is_expired(now))
    }

    // == Purge Expired ==
    /// Removes all expired entries. Returns the number removed.
    pub fn purge_expired(&mut self) -> usize {
        let now = self.clock.now_ms();
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, meta)| meta.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.drop_entry(key);
            self.stats.record_expiration();
        }
        if !expired.is_empty() {
            debug!(count = expired.len(), "Purged expired entries");
            self.persist_meta();
        }
        expired.len()
    }

    // == Emergency Purge ==
    /// Removes every unprotected key from the backend namespace.
    ///
    /// Used when the backend refuses a write. Returns the number of keys removed.
    pub fn emergency_purge(&mut self) -> usize {
        let keys = match self.backend.keys() {
            Ok(keys) => keys,
            Err(err) => {
                warn!(error = %err, "Could not list storage keys, purging tracked keys only");
                self.entries.keys().cloned().collect()
            }
        };

        let mut removed = 0;
        for key in keys {
            if key == META_KEY || self.protected.contains(&key) {
                continue;
            }
            if let Err(err) = self.backend.remove_item(&key) {
                warn!(key, error = %err, "Emergency purge could not remove key");
                continue;
            }
            removed += 1;
        }

        let protected = &self.protected;
        self.entries.retain(|key, _| protected.contains(key));
        self.used_bytes = self.entries.values().map(|meta| meta.size_bytes).sum();
        self.lru = LruTracker::from_recency(
            self.entries
                .iter()
                .map(|(key, meta)| (key.clone(), meta.last_accessed)),
        );
        self.stats.record_emergency_purge();
        self.persist_meta();

        warn!(removed, "Emergency purge complete");
        removed
    }

    // == Flush ==
    /// Persists recency refreshed by reads since the last metadata write.
    ///
    /// Returns whether anything was written.
    pub fn flush(&mut self) -> bool {
        if !self.meta_dirty {
            return false;
        }
        self.persist_meta();
        !self.meta_dirty
    }

    // == Stats ==
    /// Returns current store statistics.
    pub fn stats(&self) -> StoreStats {
        let mut stats = self.stats.clone();
        stats.set_usage(self.entries.len(), self.used_bytes);
        stats
    }

    /// Bookkeeping for a tracked key, expired or not.
    pub fn entry_meta(&self, key: &str) -> Option<&EntryMeta> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn used_bytes(&self) -> usize {
        self.used_bytes
    }

    pub fn capacity_bytes(&self) -> usize {
        self.capacity_bytes
    }

    /// Evicts least recently used entries until `used_bytes <= target`.
    ///
    /// Protected keys and `keep` are never chosen.
    fn evict_down_to(&mut self, target: usize, keep: Option<&str>) {
        while self.used_bytes > target {
            let protected = &self.protected;
            let Some(victim) = self
                .lru
                .evict_oldest_where(|k| !protected.contains(k) && Some(k) != keep)
            else {
                break;
            };
            debug!(key = %victim, "Evicting least recently used entry");
            self.drop_entry(&victim);
            self.stats.record_eviction();
        }
    }

    fn drop_entry(&mut self, key: &str) {
        if let Some(meta) = self.entries.remove(key) {
            self.used_bytes -= meta.size_bytes;
        }
        self.lru.remove(key);
        if let Err(err) = self.backend.remove_item(key) {
            warn!(key, error = %err, "Storage remove failed");
        }
    }

    fn persist_meta(&mut self) {
        let result = serde_json::to_string(&self.entries)
            .map_err(crate::error::StorageError::from)
            .and_then(|encoded| self.backend.set_item(META_KEY, &encoded));
        match result {
            Ok(()) => self.meta_dirty = false,
            Err(err) => {
                self.meta_dirty = true;
                warn!(error = %err, "Could not persist store metadata");
            }
        }
    }
}

fn load_meta(backend: &dyn StorageBackend) -> HashMap<String, EntryMeta> {
    match backend.get_item(META_KEY) {
        Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|err| {
            warn!(error = %err, "Discarding unreadable store metadata");
            HashMap::new()
        }),
        Ok(None) => HashMap::new(),
        Err(err) => {
            warn!(error = %err, "Could not read store metadata");
            HashMap::new()
        }
    }
}
