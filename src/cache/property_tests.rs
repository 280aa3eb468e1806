//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the bounded store against a plain model.

use proptest::prelude::*;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::cache::{BoundedCache, CacheStore, Statistics};
use crate::clock::ManualClock;

// == Test Configuration ==
const TEST_MAX_OBJECTS: usize = 100;
const TEST_LIFETIME: i64 = 300_000;

// == Strategies ==
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9_]{1,8}"
}

fn value_strategy() -> impl Strategy<Value = i64> {
    any::<i64>()
}

#[derive(Debug, Clone)]
enum CacheOp {
    Put { key: String, value: i64 },
    Get { key: String },
    Delete { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (key_strategy(), value_strategy()).prop_map(|(key, value)| CacheOp::Put { key, value }),
        key_strategy().prop_map(|key| CacheOp::Get { key }),
        key_strategy().prop_map(|key| CacheOp::Delete { key }),
    ]
}

fn store(max_objects: usize) -> (BoundedCache<String, i64>, ManualClock) {
    let clock = ManualClock::new(0);
    let store = BoundedCache::with_clock(max_objects, TEST_LIFETIME, Arc::new(clock.clone()))
        .expect("positive capacity");
    (store, clock)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Without capacity pressure the store behaves like a HashMap, and the
    // hit/miss counters match what the reads observed.
    #[test]
    fn prop_matches_map_model(ops in prop::collection::vec(cache_op_strategy(), 1..60)) {
        let (store, _) = store(TEST_MAX_OBJECTS);
        let mut model: HashMap<String, i64> = HashMap::new();
        let mut hits = 0u64;
        let mut misses = 0u64;

        for op in ops {
            match op {
                CacheOp::Put { key, value } => {
                    store.put(key.clone(), value).unwrap();
                    model.insert(key, value);
                }
                CacheOp::Get { key } => {
                    let got = store.get(&key).unwrap();
                    prop_assert_eq!(got, model.get(&key).copied());
                    if got.is_some() { hits += 1 } else { misses += 1 }
                }
                CacheOp::Delete { key } => {
                    store.delete(&key).unwrap();
                    model.remove(&key);
                }
            }
        }

        prop_assert_eq!(store.size().unwrap(), model.len() as u64);
        match store.statistics().unwrap() {
            Statistics::InProcess(stats) => {
                prop_assert_eq!(stats.hits, hits);
                prop_assert_eq!(stats.misses, misses);
                prop_assert_eq!(stats.total_entries, model.len());
            }
            other => prop_assert!(false, "unexpected statistics {:?}", other),
        }
    }

    // The store never holds more than its capacity, and every distinct key
    // beyond capacity costs at least one eviction.
    #[test]
    fn prop_capacity_enforcement(
        keys in prop::collection::vec(key_strategy(), 1..200),
        max_objects in 1usize..20
    ) {
        let (store, _) = store(max_objects);

        for key in &keys {
            store.put(key.clone(), 0).unwrap();
            prop_assert!(store.size().unwrap() <= max_objects as u64);
        }

        let distinct = keys.iter().collect::<HashSet<_>>().len();
        if let Statistics::InProcess(stats) = store.statistics().unwrap() {
            let expected_min = distinct.saturating_sub(max_objects) as u64;
            prop_assert!(stats.evictions >= expected_min);
        }
    }

    // Entries of one batch expire together no matter how big the batch is.
    #[test]
    fn prop_batch_expires_together(
        batch in prop::collection::hash_map(key_strategy(), value_strategy(), 1..50),
        lifetime in 1i64..100_000
    ) {
        let (store, clock) = store(TEST_MAX_OBJECTS);
        let keys: Vec<String> = batch.keys().cloned().collect();

        store.put_all_with_lifetime(batch, lifetime).unwrap();

        let expirations: HashSet<i64> = keys
            .iter()
            .map(|key| store.get_entry(key).unwrap().unwrap().expiration_time())
            .collect();
        prop_assert_eq!(expirations.len(), 1);

        clock.advance(lifetime);
        prop_assert_eq!(store.get_all(&keys).unwrap().len(), keys.len());
        clock.advance(1);
        prop_assert!(store.get_all(&keys).unwrap().is_empty());
    }

    // A fresh put is readable until its lifetime runs out, and the raw entry
    // survives expiry.
    #[test]
    fn prop_expiration_behavior(
        key in key_strategy(),
        value in value_strategy(),
        lifetime in 1i64..1_000_000
    ) {
        let (store, clock) = store(TEST_MAX_OBJECTS);

        store.put_with_lifetime(key.clone(), value, lifetime).unwrap();
        prop_assert_eq!(store.get(&key).unwrap(), Some(value));

        clock.advance(lifetime + 1);
        prop_assert_eq!(store.get(&key).unwrap(), None);
        prop_assert_eq!(store.get_entry(&key).unwrap().map(|e| e.into_value()), Some(value));
    }
}
