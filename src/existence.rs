//! Existence Cache Module
//!
//! Short-lived answers to "does document X exist under project Y", persisted
//! through the bounded store so navigation guards can skip a backend round trip.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::store::{compose_key, BoundedStore, SharedStore};

/// Default lifetime of an existence record (10 minutes).
pub const EXISTENCE_TTL_MS: u64 = 10 * 60 * 1000;

const KEY_PREFIX: &str = "exists";

/// Persisted outcome of a single existence check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistenceRecord {
    pub exists: bool,
    /// When the check was made (Unix milliseconds)
    pub checked_at: u64,
}

/// Answer from [`ExistenceCache::check_existence`].
///
/// `Unknown` covers both a miss and a stale record. It never means "not found";
/// callers resolve through the backend instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Existence {
    Yes,
    No,
    Unknown,
}

/// Existence answers keyed by `(project_id, document_key)`.
///
/// Expiry is lazy: nothing sweeps records, a stale one is simply reported as
/// `Unknown` and dropped by the store on read.
#[derive(Clone)]
pub struct ExistenceCache {
    store: SharedStore,
    clock: Arc<dyn Clock>,
    ttl_ms: u64,
}

impl ExistenceCache {
    pub fn new(store: SharedStore, clock: Arc<dyn Clock>, ttl_ms: u64) -> Self {
        Self { store, clock, ttl_ms }
    }

    /// Store key for a `(project_id, document_key)` pair.
    pub fn record_key(project_id: &str, document_key: &str) -> String {
        compose_key(&[KEY_PREFIX, project_id, document_key])
    }

    /// Records whether `document_key` exists under `project_id`.
    ///
    /// Returns whether the record was persisted; a failed write only means the
    /// next check will be `Unknown`.
    pub async fn record_existence(&self, project_id: &str, document_key: &str, exists: bool) -> bool {
        let record = ExistenceRecord {
            exists,
            checked_at: self.clock.now_ms(),
        };
        let key = Self::record_key(project_id, document_key);
        let ttl_ms = self.ttl_ms;
        let written = self
            .with_store("record", move |store| store.set(&key, &record, Some(ttl_ms)))
            .await
            .unwrap_or(false);
        debug!(project_id, document_key, exists, written, "Recorded existence");
        written
    }

    /// Looks up a previously recorded answer.
    pub async fn check_existence(&self, project_id: &str, document_key: &str) -> Existence {
        let key = Self::record_key(project_id, document_key);
        // Write lock: a hit refreshes recency, a stale read evicts
        let record: Option<ExistenceRecord> = self
            .with_store("check", move |store| store.get::<ExistenceRecord>(&key))
            .await
            .flatten();

        match record {
            Some(record) if record.checked_at.saturating_add(self.ttl_ms) > self.clock.now_ms() => {
                if record.exists {
                    Existence::Yes
                } else {
                    Existence::No
                }
            }
            _ => Existence::Unknown,
        }
    }

    /// Forgets any answer for the pair. Returns whether one was held.
    pub async fn invalidate(&self, project_id: &str, document_key: &str) -> bool {
        let key = Self::record_key(project_id, document_key);
        self.with_store("invalidate", move |store| store.remove(&key))
            .await
            .unwrap_or(false)
    }

    pub fn ttl_ms(&self) -> u64 {
        self.ttl_ms
    }

    /// Runs `op` against the store on the blocking pool.
    ///
    /// Store operations may touch the file backend, which must stay off the
    /// async executor. `None` means the blocking task did not complete.
    async fn with_store<R, F>(&self, action: &'static str, op: F) -> Option<R>
    where
        R: Send + 'static,
        F: FnOnce(&mut BoundedStore) -> R + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let task = tokio::task::spawn_blocking(move || {
            let mut guard = store.blocking_write();
            op(&mut *guard)
        });
        match task.await {
            Ok(result) => Some(result),
            Err(err) => {
                warn!(action, error = %err, "Existence store task failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::store::{MemoryBackend, StoreOptions};
    use tokio::sync::RwLock;

    fn cache_with_clock() -> (ExistenceCache, Arc<ManualClock>, SharedStore) {
        let clock = Arc::new(ManualClock::new(10_000));
        let store = Arc::new(RwLock::new(BoundedStore::open(
            Arc::new(MemoryBackend::new()),
            clock.clone(),
            StoreOptions::new(64 * 1024),
        )));
        let cache = ExistenceCache::new(store.clone(), clock.clone(), EXISTENCE_TTL_MS);
        (cache, clock, store)
    }

    #[tokio::test]
    async fn test_unknown_on_miss() {
        let (cache, _, _) = cache_with_clock();
        assert_eq!(cache.check_existence("proj", "doc").await, Existence::Unknown);
    }

    #[tokio::test]
    async fn test_record_yes_and_no() {
        let (cache, _, _) = cache_with_clock();

        assert!(cache.record_existence("proj", "doc-a", true).await);
        assert!(cache.record_existence("proj", "doc-b", false).await);

        assert_eq!(cache.check_existence("proj", "doc-a").await, Existence::Yes);
        assert_eq!(cache.check_existence("proj", "doc-b").await, Existence::No);
        // Keys are scoped by project
        assert_eq!(cache.check_existence("other", "doc-a").await, Existence::Unknown);
    }

    #[tokio::test]
    async fn test_stale_record_is_unknown() {
        let (cache, clock, store) = cache_with_clock();

        cache.record_existence("proj", "doc", true).await;
        clock.advance(EXISTENCE_TTL_MS - 1);
        assert_eq!(cache.check_existence("proj", "doc").await, Existence::Yes);

        clock.advance(1);
        assert_eq!(cache.check_existence("proj", "doc").await, Existence::Unknown);
        assert!(store
            .read()
            .await
            .entry_meta(&ExistenceCache::record_key("proj", "doc"))
            .is_none());
    }

    #[tokio::test]
    async fn test_rerecord_refreshes() {
        let (cache, clock, _) = cache_with_clock();

        cache.record_existence("proj", "doc", false).await;
        clock.advance(EXISTENCE_TTL_MS / 2);
        cache.record_existence("proj", "doc", true).await;
        clock.advance(EXISTENCE_TTL_MS / 2 + 1);

        assert_eq!(cache.check_existence("proj", "doc").await, Existence::Yes);
    }

    #[tokio::test]
    async fn test_invalidate() {
        let (cache, _, _) = cache_with_clock();

        cache.record_existence("proj", "doc", true).await;
        assert!(cache.invalidate("proj", "doc").await);
        assert_eq!(cache.check_existence("proj", "doc").await, Existence::Unknown);
        assert!(!cache.invalidate("proj", "doc").await);
    }

    #[test]
    fn test_record_key_layout() {
        assert_eq!(ExistenceCache::record_key("p1", "doc-x"), "exists:p1:doc-x");
    }

    #[tokio::test]
    async fn test_ids_containing_separator_stay_distinct() {
        let (cache, _, _) = cache_with_clock();

        cache.record_existence("a:b", "c", true).await;

        assert_eq!(cache.check_existence("a:b", "c").await, Existence::Yes);
        assert_eq!(cache.check_existence("a", "b:c").await, Existence::Unknown);
    }

    #[test]
    fn test_existence_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Existence::Unknown).unwrap(), "\"unknown\"");
        assert_eq!(serde_json::to_string(&Existence::Yes).unwrap(), "\"yes\"");
    }
}
