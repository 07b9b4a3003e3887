//! Test support shared by the skipdict crates.
//!
//! Keeping these in a microcrate avoids copy-paste across the core, stress
//! and CLI tests: an operation type, a reference model built on std
//! collections, deterministic fixtures, and proptest strategies.

use std::collections::{BTreeMap, VecDeque};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub mod proptest;

/// One dictionary operation, as generated by the strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Insert(i32, i32),
    Delete(i32),
    Search(i32),
    PopFirst,
    PopLast,
}

/// What a dictionary should answer for each [`Op`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Inserted(bool),
    Deleted(bool),
    Found(Option<i32>),
    Popped(Option<(i32, i32)>),
}

/// Reference dictionary over `BTreeMap`.
///
/// With `fifo` set, equal keys queue up in insertion order; otherwise an
/// insert of a present key replaces its value.
#[derive(Debug, Clone, Default)]
pub struct Model {
    fifo: bool,
    entries: BTreeMap<i32, VecDeque<i32>>,
}

impl Model {
    pub fn overwrite() -> Self {
        Self {
            fifo: false,
            entries: BTreeMap::new(),
        }
    }

    pub fn fifo() -> Self {
        Self {
            fifo: true,
            entries: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, key: i32, value: i32) -> bool {
        let queue = self.entries.entry(key).or_default();
        if !self.fifo && !queue.is_empty() {
            queue[0] = value;
            return false;
        }
        queue.push_back(value);
        true
    }

    pub fn delete(&mut self, key: i32) -> bool {
        let Some(queue) = self.entries.get_mut(&key) else {
            return false;
        };
        queue.pop_front();
        if queue.is_empty() {
            self.entries.remove(&key);
        }
        true
    }

    pub fn search(&self, key: i32) -> Option<i32> {
        self.entries.get(&key).and_then(|queue| queue.front().copied())
    }

    pub fn pop_first(&mut self) -> Option<(i32, i32)> {
        let key = *self.entries.keys().next()?;
        let value = self.search(key)?;
        self.delete(key);
        Some((key, value))
    }

    /// Removes the newest binding of the largest key, matching a skip list
    /// that unlinks its last level-0 node.
    pub fn pop_last(&mut self) -> Option<(i32, i32)> {
        let mut last = self.entries.last_entry()?;
        let key = *last.key();
        let value = last.get_mut().pop_back()?;
        if last.get().is_empty() {
            last.remove();
        }
        Some((key, value))
    }

    pub fn apply(&mut self, op: Op) -> Outcome {
        match op {
            Op::Insert(key, value) => Outcome::Inserted(self.insert(key, value)),
            Op::Delete(key) => Outcome::Deleted(self.delete(key)),
            Op::Search(key) => Outcome::Found(self.search(key)),
            Op::PopFirst => Outcome::Popped(self.pop_first()),
            Op::PopLast => Outcome::Popped(self.pop_last()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(VecDeque::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All bindings in level-0 order.
    pub fn entries(&self) -> Vec<(i32, i32)> {
        self.entries
            .iter()
            .flat_map(|(&key, queue)| queue.iter().map(move |&value| (key, value)))
            .collect()
    }
}

/// `count` pseudo-random `(key, key)` pairs from a fixed seed.
///
/// Keys are non-negative 31-bit integers, like the classic stress driver.
pub fn random_pairs(seed: u64, count: usize) -> Vec<(i32, i32)> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let key = rng.random_range(0..i32::MAX);
            (key, key)
        })
        .collect()
}
