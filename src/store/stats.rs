//! Store Statistics Module
//!
//! Tracks store metrics including hits, misses, evictions, and write failures.

use serde::Serialize;

// == Store Stats ==
/// Tracks store performance and health metrics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StoreStats {
    /// Number of successful reads
    pub hits: u64,
    /// Number of reads that found nothing live
    pub misses: u64,
    /// Number of entries evicted to make room
    pub evictions: u64,
    /// Number of entries dropped because their TTL elapsed
    pub expirations: u64,
    /// Number of writes that did not take place
    pub write_failures: u64,
    /// Number of emergency purges after a backend write failure
    pub emergency_purges: u64,
    /// Current number of entries
    pub total_entries: usize,
    /// Bytes currently charged against capacity
    pub used_bytes: usize,
    /// Configured capacity in bytes
    pub capacity_bytes: usize,
}

impl StoreStats {
    /// Creates a new StoreStats with all counters at zero.
    pub fn new(capacity_bytes: usize) -> Self {
        Self {
            capacity_bytes,
            ..Self::default()
        }
    }

    /// Calculates hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_expiration(&mut self) {
        self.expirations += 1;
    }

    pub fn record_write_failure(&mut self) {
        self.write_failures += 1;
    }

    pub fn record_emergency_purge(&mut self) {
        self.emergency_purges += 1;
    }

    // == Update Usage ==
    /// Updates the entry count and used bytes.
    pub fn set_usage(&mut self, total_entries: usize, used_bytes: usize) {
        self.total_entries = total_entries;
        self.used_bytes = used_bytes;
    }
}
