//! In-flight guard for prefetch de-duplication.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::clock::Clock;
use crate::lock::mutex_lock;

const SOURCE: &str = "prefetch::inflight";

/// Default lifetime of an in-flight marker (10 minutes).
pub const INFLIGHT_WINDOW_MS: u64 = 10 * 60 * 1000;

/// Keys of work currently considered in flight.
///
/// A marker lives for a fixed window from when it was set, whether or not the
/// work finished. Expired markers are ignored on the next check and dropped by
/// [`sweep`](Self::sweep).
pub struct InflightGuard {
    /// Key -> marked-at (Unix milliseconds)
    markers: Mutex<HashMap<String, u64>>,
    clock: Arc<dyn Clock>,
    window_ms: u64,
}

impl InflightGuard {
    pub fn new(clock: Arc<dyn Clock>, window_ms: u64) -> Self {
        Self {
            markers: Mutex::new(HashMap::new()),
            clock,
            window_ms,
        }
    }

    /// Marks `key` unless a live marker already exists. Returns whether it marked.
    ///
    /// Check and mark happen under one lock, so two callers can never both win.
    pub fn try_mark(&self, key: &str) -> bool {
        let now = self.clock.now_ms();
        let mut markers = mutex_lock(&self.markers, SOURCE, "try_mark");
        match markers.get(key) {
            Some(&marked_at) if !self.expired(marked_at, now) => false,
            _ => {
                markers.insert(key.to_string(), now);
                true
            }
        }
    }

    pub fn is_marked(&self, key: &str) -> bool {
        let now = self.clock.now_ms();
        mutex_lock(&self.markers, SOURCE, "is_marked")
            .get(key)
            .is_some_and(|&marked_at| !self.expired(marked_at, now))
    }

    /// Drops the marker for `key` early. Returns whether one existed.
    pub fn release(&self, key: &str) -> bool {
        mutex_lock(&self.markers, SOURCE, "release")
            .remove(key)
            .is_some()
    }

    /// Removes every expired marker. Returns the number removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now_ms();
        let mut markers = mutex_lock(&self.markers, SOURCE, "sweep");
        let before = markers.len();
        markers.retain(|_, marked_at| !self.expired(*marked_at, now));
        before - markers.len()
    }

    /// Markers held, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        mutex_lock(&self.markers, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn expired(&self, marked_at: u64, now: u64) -> bool {
        now >= marked_at.saturating_add(self.window_ms)
    }
}
