//! Property-Based Tests for the Bounded Store
//!
//! Uses proptest to check capacity, recency, and expiry behavior over random operation sequences.

use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

use crate::clock::ManualClock;
use crate::store::{BoundedStore, MemoryBackend, StoreOptions};

// == Strategies ==
/// Keys of a fixed width so entry sizes are predictable
fn fixed_key_strategy() -> impl Strategy<Value = String> {
    "[a-z]{8}".prop_map(|s| s)
}

/// Values of a fixed width: 16 chars, 18 bytes once serialized
fn fixed_value_strategy() -> impl Strategy<Value = String> {
    "[a-z]{16}".prop_map(|s| s)
}

const FIXED_ENTRY_SIZE: usize = 8 + 18;

#[derive(Debug, Clone)]
enum StoreOp {
    Set { key: String, value: String, ttl: Option<u64> },
    Get { key: String },
    Remove { key: String },
    Advance { ms: u64 },
}

fn store_op_strategy() -> impl Strategy<Value = StoreOp> {
    prop_oneof![
        4 => ("[a-z0-9_]{1,12}", "[a-zA-Z0-9 ]{0,120}", prop::option::of(1u64..500))
            .prop_map(|(key, value, ttl)| StoreOp::Set { key, value, ttl }),
        2 => "[a-z0-9_]{1,12}".prop_map(|key| StoreOp::Get { key }),
        1 => "[a-z0-9_]{1,12}".prop_map(|key| StoreOp::Remove { key }),
        1 => (1u64..300).prop_map(|ms| StoreOp::Advance { ms }),
    ]
}

fn unprotected_store(capacity: usize, clock: Arc<ManualClock>) -> BoundedStore {
    let options = StoreOptions::new(capacity).with_protected_keys(Vec::<String>::new());
    BoundedStore::open(Arc::new(MemoryBackend::new()), clock, options)
}

fn unique(keys: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    keys.into_iter().filter(|k| seen.insert(k.clone())).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // After any sequence of operations the live entries fit within capacity,
    // and the tracked byte total matches the entries' sizes.
    #[test]
    fn prop_capacity_invariant(
        capacity in 32usize..600,
        ops in prop::collection::vec(store_op_strategy(), 1..120)
    ) {
        let clock = Arc::new(ManualClock::new(0));
        let mut store = unprotected_store(capacity, clock.clone());
        let mut tracked: HashSet<String> = HashSet::new();

        for op in ops {
            match op {
                StoreOp::Set { key, value, ttl } => {
                    if store.set(&key, &value, ttl) {
                        tracked.insert(key);
                    }
                }
                StoreOp::Get { key } => {
                    let _ = store.get::<String>(&key);
                }
                StoreOp::Remove { key } => {
                    store.remove(&key);
                }
                StoreOp::Advance { ms } => clock.advance(ms),
            }

            prop_assert!(
                store.used_bytes() <= capacity,
                "Used {} bytes exceeds capacity {}",
                store.used_bytes(),
                capacity
            );
            let summed: usize = tracked
                .iter()
                .filter_map(|k| store.entry_meta(k))
                .map(|m| m.size_bytes)
                .sum();
            prop_assert_eq!(summed, store.used_bytes());
        }
    }

    // Filling the store and inserting one more equally sized entry evicts
    // exactly the least recently written key.
    #[test]
    fn prop_lru_eviction_order(
        initial_keys in prop::collection::vec(fixed_key_strategy(), 3..10),
        new_key in fixed_key_strategy(),
        new_value in fixed_value_strategy()
    ) {
        let keys = unique(initial_keys);
        prop_assume!(keys.len() >= 2);
        prop_assume!(!keys.contains(&new_key));

        let clock = Arc::new(ManualClock::new(0));
        let mut store = unprotected_store(keys.len() * FIXED_ENTRY_SIZE, clock.clone());

        for key in &keys {
            prop_assert!(store.set(key, &"v".repeat(16), None));
            clock.advance(1);
        }
        prop_assert_eq!(store.used_bytes(), store.capacity_bytes());

        prop_assert!(store.set(&new_key, &new_value, None));

        prop_assert!(!store.contains(&keys[0]), "Oldest key should have been evicted");
        prop_assert!(store.contains(&new_key));
        for key in keys.iter().skip(1) {
            prop_assert!(store.contains(key), "Key '{}' should still exist", key);
        }
        prop_assert_eq!(store.stats().evictions, 1);
    }

    // A read makes a key the most recently used, so the next oldest key is
    // evicted instead.
    #[test]
    fn prop_lru_access_tracking(
        initial_keys in prop::collection::vec(fixed_key_strategy(), 3..8),
        new_key in fixed_key_strategy()
    ) {
        let keys = unique(initial_keys);
        prop_assume!(keys.len() >= 3);
        prop_assume!(!keys.contains(&new_key));

        let clock = Arc::new(ManualClock::new(0));
        let mut store = unprotected_store(keys.len() * FIXED_ENTRY_SIZE, clock.clone());

        for key in &keys {
            store.set(key, &"v".repeat(16), None);
            clock.advance(1);
        }

        prop_assert!(store.get::<String>(&keys[0]).is_some());
        clock.advance(1);
        store.set(&new_key, &"w".repeat(16), None);

        prop_assert!(store.contains(&keys[0]), "Accessed key should survive");
        prop_assert!(!store.contains(&keys[1]), "Next oldest key should be evicted");
    }

    // Entries are readable until their TTL elapses and absent afterwards,
    // with the bookkeeping dropped by the read.
    #[test]
    fn prop_ttl_lazy_expiry(
        key in "[a-z0-9_]{1,32}",
        value in "[a-zA-Z0-9 ]{1,64}",
        ttl in 1u64..10_000,
        overshoot in 0u64..10_000
    ) {
        let clock = Arc::new(ManualClock::new(1_000));
        let mut store = unprotected_store(4096, clock.clone());

        prop_assert!(store.set(&key, &value, Some(ttl)));
        clock.advance(ttl - 1);
        prop_assert_eq!(store.get::<String>(&key), Some(value));

        clock.advance(1 + overshoot);
        prop_assert_eq!(store.get::<String>(&key), None);
        prop_assert!(store.entry_meta(&key).is_none());
    }
}
