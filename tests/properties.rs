use std::collections::HashMap;

use lfu_store::LfuStore;
use proptest::prelude::*;

/// A linear-scan LFU used as the reference behaviour.
#[derive(Default)]
struct Model {
    capacity: usize,
    clock: u64,
    // key -> (value, frequency, last touch)
    entries: HashMap<u8, (u32, usize, u64)>,
}

impl Model {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn get(&mut self, key: u8) -> Option<u32> {
        let now = self.tick();
        let entry = self.entries.get_mut(&key)?;
        entry.1 += 1;
        entry.2 = now;
        Some(entry.0)
    }

    fn put(&mut self, key: u8, value: u32) -> Option<(u8, u32)> {
        if self.capacity == 0 {
            return None;
        }
        let now = self.tick();
        if let Some(entry) = self.entries.get_mut(&key) {
            *entry = (value, entry.1 + 1, now);
            return None;
        }

        let mut evicted = None;
        if self.entries.len() >= self.capacity {
            let victim = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| (entry.1, entry.2))
                .map(|(&key, _)| key);
            if let Some(victim) = victim {
                evicted = self.entries.remove(&victim).map(|(v, _, _)| (victim, v));
            }
        }
        self.entries.insert(key, (value, 1, now));
        evicted
    }

    fn min_frequency(&self) -> Option<usize> {
        self.entries.values().map(|&(_, frequency, _)| frequency).min()
    }
}

#[derive(Debug, Clone)]
enum Op {
    Get(u8),
    Put(u8, u32),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..16).prop_map(Op::Get),
        (0u8..16, any::<u32>()).prop_map(|(k, v)| Op::Put(k, v)),
    ]
}

proptest! {
    /// Property: the store matches the reference LFU after every operation
    #[test]
    fn prop_matches_reference(
        capacity in 0usize..6,
        ops in prop::collection::vec(op(), 0..200)
    ) {
        let mut store = LfuStore::with_capacity(capacity);
        let mut model = Model::new(capacity);

        for op in ops {
            match op {
                Op::Get(key) => {
                    prop_assert_eq!(store.get(&key).copied(), model.get(key));
                }
                Op::Put(key, value) => {
                    prop_assert_eq!(store.insert(key, value), model.put(key, value));
                }
            }

            prop_assert!(store.len() <= capacity);
            prop_assert_eq!(store.len(), model.entries.len());
            prop_assert_eq!(store.min_frequency(), model.min_frequency());
            prop_assert!(store.check_invariants().is_ok());
        }

        for (key, &(_, frequency, _)) in &model.entries {
            prop_assert_eq!(store.frequency(key), Some(frequency));
        }
    }

    /// Property: a value put is read back while its key stays resident
    #[test]
    fn prop_round_trip(
        capacity in 1usize..8,
        key in any::<u16>(),
        value in any::<u64>(),
        warmup in prop::collection::vec(any::<u16>(), 0..32)
    ) {
        let mut store = LfuStore::with_capacity(capacity);
        for k in warmup {
            store.put(k, u64::from(k));
        }

        store.put(key, value);
        prop_assert_eq!(store.get(&key), Some(&value));
    }

    /// Property: a zero capacity store never holds anything
    #[test]
    fn prop_zero_capacity_misses(
        puts in prop::collection::vec((any::<u8>(), any::<u8>()), 0..32)
    ) {
        let mut store = LfuStore::new(0).unwrap();
        for (k, v) in puts {
            store.put(k, v);
            prop_assert_eq!(store.get(&k), None);
        }
        prop_assert!(store.is_empty());
    }

    /// Property: eviction removes exactly one entry at the minimum frequency
    #[test]
    fn prop_eviction_takes_minimum(
        capacity in 1usize..6,
        touches in prop::collection::vec(0u8..6, 0..40)
    ) {
        let mut store = LfuStore::with_capacity(capacity);
        for key in 0..capacity {
            store.put(key as u8, ());
        }
        for key in touches {
            store.get(&key);
        }

        let floor = store.min_frequency();
        let evicted = store.insert(u8::MAX, ());
        prop_assert!(evicted.is_some());
        if let Some((key, ())) = evicted {
            prop_assert!(!store.contains_key(&key));
            prop_assert_eq!(store.len(), capacity);
            // Every survivor other than the new key is at or above the floor.
            for other in 0..capacity as u8 {
                if let Some(frequency) = store.frequency(&other) {
                    prop_assert!(Some(frequency) >= floor);
                }
            }
        }
    }

    /// Property: among tied keys, the least recently touched is evicted first
    #[test]
    fn prop_recency_breaks_ties(order in Just((0u8..5).collect::<Vec<_>>()).prop_shuffle()) {
        let mut store = LfuStore::with_capacity(5);
        for key in 0..5u8 {
            store.put(key, ());
        }
        // Bring every key to frequency two, in a shuffled order.
        for &key in &order {
            store.get(&key);
        }

        prop_assert_eq!(store.insert(100, ()).map(|(k, ())| k), Some(order[0]));
    }

    /// Property: a miss leaves every frequency and the floor untouched
    #[test]
    fn prop_miss_is_pure(
        ops in prop::collection::vec(op(), 0..64),
        absent in 16u8..32
    ) {
        let mut store = LfuStore::with_capacity(4);
        for op in ops {
            match op {
                Op::Get(key) => { store.get(&key); }
                Op::Put(key, value) => store.put(key, value),
            }
        }

        let snapshot = |store: &LfuStore<u8, u32>| {
            let per_key: Vec<_> = (0u8..16).map(|k| store.frequency(&k)).collect();
            (per_key, store.frequencies(), store.min_frequency(), store.peek_lfu_key_value().map(|(k, _)| *k))
        };

        let before = snapshot(&store);
        prop_assert_eq!(store.get(&absent), None);
        prop_assert_eq!(snapshot(&store), before);
    }
}
