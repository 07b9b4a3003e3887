//! Bulk tests for skipdict-core
//!
//! Large workloads under the overwrite policy: distinct keys, per-slot
//! delete and reinsert rounds, and a full search pass after each round.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use skipdict_core::{DuplicatePolicy, MAX_LEVEL, SkipDict};

const SAMPLE_SIZE: usize = 65_536;
const ROUNDS: usize = 4;

fn value_for(key: i32) -> i32 {
    key ^ 0x5A5A
}

fn fresh_key(rng: &mut StdRng, live: &mut HashSet<i32>) -> i32 {
    loop {
        let key = rng.random_range(0..i32::MAX);
        if live.insert(key) {
            return key;
        }
    }
}

fn assert_all_found(dict: &SkipDict<i32, i32>, keys: &[i32], round: usize) {
    for &key in keys {
        assert_eq!(
            dict.search(&key).unwrap(),
            Some(&value_for(key)),
            "key {key} after round {round}"
        );
    }
}

// ============================================================================
// Overwrite Policy
// ============================================================================

#[test]
fn overwrite_bulk_rounds_keep_every_key_searchable() {
    let mut rng = StdRng::seed_from_u64(0xB01D);
    let mut dict = SkipDict::seeded(DuplicatePolicy::Overwrite, 0xB01E);
    let mut live = HashSet::with_capacity(SAMPLE_SIZE * 2);

    let mut keys: Vec<i32> = (0..SAMPLE_SIZE).map(|_| fresh_key(&mut rng, &mut live)).collect();
    for &key in &keys {
        assert!(dict.insert(key, value_for(key)).unwrap());
    }
    dict.verify().unwrap();
    assert_eq!(dict.len().unwrap(), SAMPLE_SIZE);
    assert_all_found(&dict, &keys, 0);

    for round in 1..=ROUNDS {
        let mut retired = Vec::with_capacity(SAMPLE_SIZE);
        for slot in keys.iter_mut() {
            assert!(dict.delete(&*slot).unwrap(), "delete {} in round {round}", *slot);
            live.remove(&*slot);
            retired.push(*slot);

            let key = fresh_key(&mut rng, &mut live);
            assert!(dict.insert(key, value_for(key)).unwrap());
            *slot = key;
        }

        dict.verify().unwrap();
        assert_eq!(dict.len().unwrap(), SAMPLE_SIZE);
        assert!(dict.level().unwrap() <= MAX_LEVEL);
        assert_all_found(&dict, &keys, round);
        for key in retired.iter().filter(|k| !live.contains(*k)) {
            assert_eq!(dict.search(key).unwrap(), None, "retired key {key} in round {round}");
        }
    }

    let stats = dict.stats().unwrap();
    assert_eq!(stats.len, SAMPLE_SIZE);
    assert_eq!(stats.nodes_per_level[0], SAMPLE_SIZE);
    assert_eq!(dict.destroy(), SAMPLE_SIZE);
}

#[test]
fn overwrite_bulk_reinsert_replaces_values_in_place() {
    let mut rng = StdRng::seed_from_u64(0xC0DE);
    let mut dict = SkipDict::seeded(DuplicatePolicy::Overwrite, 0xC0DF);
    let mut live = HashSet::with_capacity(SAMPLE_SIZE);

    let keys: Vec<i32> = (0..SAMPLE_SIZE).map(|_| fresh_key(&mut rng, &mut live)).collect();
    for &key in &keys {
        assert!(dict.insert(key, key).unwrap());
    }
    for &key in &keys {
        assert!(!dict.insert(key, value_for(key)).unwrap());
    }

    dict.verify().unwrap();
    assert_eq!(dict.len().unwrap(), SAMPLE_SIZE);
    assert_all_found(&dict, &keys, 0);
}
