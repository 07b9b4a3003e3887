//! Proptest strategies for skipdict property-based testing
//!
//! Reusable strategies for generating keys, values and operation sequences
//! across the skipdict crates.

pub mod strategies;

pub use strategies::{
    strategy_distinct_keys, strategy_key, strategy_level_sequence, strategy_op, strategy_ops,
    strategy_value, strategy_wide_key,
};
