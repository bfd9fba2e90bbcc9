//! Entry Metadata Module
//!
//! Bookkeeping kept for every stored key: size, recency, and optional expiry.

use serde::{Deserialize, Serialize};

// == Entry Meta ==
/// Size and lifetime bookkeeping for a single stored key.
///
/// Persisted as part of the metadata map, so field names follow the
/// camelCase layout other readers of the namespace expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryMeta {
    /// Bytes charged against capacity (key + serialized value)
    pub size_bytes: usize,
    /// Last read or write (Unix milliseconds)
    pub last_accessed: u64,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
}

impl EntryMeta {
    // == Constructor ==
    /// Creates bookkeeping for an entry written at `now_ms`.
    ///
    /// # Arguments
    /// * `size_bytes` - Bytes charged against capacity
    /// * `now_ms` - Write time
    /// * `ttl_ms` - Optional lifetime in milliseconds
    pub fn new(size_bytes: usize, now_ms: u64, ttl_ms: Option<u64>) -> Self {
        Self {
            size_bytes,
            last_accessed: now_ms,
            expires_at: ttl_ms.map(|ttl| now_ms.saturating_add(ttl)),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now_ms`.
    ///
    /// An entry is expired once the current time reaches its expiration time.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        match self.expires_at {
            Some(expires) => now_ms >= expires,
            None => false,
        }
    }

    /// Records an access at `now_ms`.
    pub fn touch(&mut self, now_ms: u64) {
        self.last_accessed = now_ms;
    }
}
