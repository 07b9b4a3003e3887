//! Fuzz harness for dictionary operation sequences
//!
//! Each 3-byte chunk decodes to one operation on a small key range. The
//! dictionary must answer like the reference model and pass `verify()`
//! after every step, under both duplicate policies.

#![no_main]

use libfuzzer_sys::fuzz_target;
use skipdict_core::{DuplicatePolicy, SkipDict};
use skipdict_testkit::{Model, Op, Outcome};

fn decode(chunk: &[u8]) -> Op {
    let key = i32::from(chunk[1] % 32) - 16;
    let value = i32::from(chunk[2]);
    match chunk[0] % 8 {
        0..=2 => Op::Insert(key, value),
        3 | 4 => Op::Delete(key),
        5 => Op::Search(key),
        6 => Op::PopFirst,
        _ => Op::PopLast,
    }
}

fn run(policy: DuplicatePolicy, seed: u64, ops: &[Op]) {
    let mut dict = SkipDict::seeded(policy, seed);
    let mut model = match policy {
        DuplicatePolicy::Overwrite => Model::overwrite(),
        DuplicatePolicy::AllowFifo => Model::fifo(),
    };

    for &op in ops {
        let got = match op {
            Op::Insert(k, v) => Outcome::Inserted(dict.insert(k, v).unwrap()),
            Op::Delete(k) => Outcome::Deleted(dict.delete(&k).unwrap()),
            Op::Search(k) => Outcome::Found(dict.search(&k).unwrap().copied()),
            Op::PopFirst => Outcome::Popped(dict.pop_first().unwrap()),
            Op::PopLast => Outcome::Popped(dict.pop_last().unwrap()),
        };
        assert_eq!(got, model.apply(op), "{op:?}");
        dict.verify().unwrap();
    }
    assert_eq!(dict.len().unwrap(), model.len());
    assert_eq!(dict.destroy(), model.len());
}

fuzz_target!(|data: &[u8]| {
    let Some((&seed, rest)) = data.split_first() else {
        return;
    };
    let ops: Vec<Op> = rest.chunks_exact(3).map(decode).collect();

    run(DuplicatePolicy::Overwrite, u64::from(seed), &ops);
    run(DuplicatePolicy::AllowFifo, u64::from(seed), &ops);
});
