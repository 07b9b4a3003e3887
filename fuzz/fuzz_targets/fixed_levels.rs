//! Fuzz harness for adversarial level sequences
//!
//! The first half of the input picks node levels (including draws above the
//! cap), the second half picks keys to insert and then delete. The max level
//! must stay within bounds and drop back to 0 once the list is empty.

#![no_main]

use libfuzzer_sys::fuzz_target;
use skipdict_core::{DuplicatePolicy, FixedLevels, MAX_LEVEL, SkipDict};

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }
    let (levels, keys) = data.split_at(data.len() / 2);
    let levels: Vec<usize> = levels.iter().map(|&b| usize::from(b % 24)).collect();

    let mut dict = SkipDict::with_generator(DuplicatePolicy::AllowFifo, FixedLevels::new(levels));
    for &key in keys {
        dict.insert(key, ()).unwrap();
        assert!(dict.level().unwrap() <= MAX_LEVEL);
    }
    dict.verify().unwrap();

    for key in keys {
        assert!(dict.delete(key).unwrap());
        dict.verify().unwrap();
    }
    assert!(dict.is_empty().unwrap());
    assert_eq!(dict.level().unwrap(), 0);
});
