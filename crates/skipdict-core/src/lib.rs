//! Probabilistic ordered dictionary for skipdict.
//!
//! [`SkipDict`] is a skip list: level 0 links every entry in key order, and
//! each higher level links a random subset of the level below it. Nodes live
//! in an index arena owned by the dictionary. A header node starts every
//! level and a sentinel that sorts after every key ends every level, so the
//! shared search walk needs no end-of-chain checks.
//!
//! Duplicate keys are governed by [`DuplicatePolicy`]: overwrite the existing
//! value, or keep every binding in insertion order.

mod dict;
mod list;
mod options;
mod stats;
mod store;

pub use dict::SkipDict;
pub use list::Iter;
pub use options::{DictOptions, DuplicatePolicy};
pub use skipdict_levels::{BitPairLevels, FixedLevels, LevelGenerator, MAX_LEVEL, MAX_LEVELS};
pub use stats::DictStats;
