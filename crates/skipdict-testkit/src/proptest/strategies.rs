//! Proptest strategies for skipdict property-based testing

use proptest::prelude::*;

use crate::Op;

// ============================================================================
// Base Strategies
// ============================================================================

/// Keys from a narrow range so sequences revisit the same keys often.
pub fn strategy_key() -> impl Strategy<Value = i32> {
    -64i32..64
}

/// Keys from the full range, including the extremes.
pub fn strategy_wide_key() -> impl Strategy<Value = i32> {
    prop_oneof![
        1 => Just(i32::MIN),
        1 => Just(i32::MAX),
        8 => any::<i32>(),
    ]
}

pub fn strategy_value() -> impl Strategy<Value = i32> {
    any::<i32>()
}

/// Up to `max` distinct keys in random order.
pub fn strategy_distinct_keys(max: usize) -> impl Strategy<Value = Vec<i32>> {
    proptest::collection::hash_set(strategy_wide_key(), 0..=max)
        .prop_map(|keys| keys.into_iter().collect::<Vec<_>>())
        .prop_shuffle()
}

/// Level draws, some of them above the cap.
pub fn strategy_level_sequence() -> impl Strategy<Value = Vec<usize>> {
    proptest::collection::vec(0usize..20, 1..32)
}

// ============================================================================
// Operation Strategies
// ============================================================================

pub fn strategy_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (strategy_key(), strategy_value()).prop_map(|(key, value)| Op::Insert(key, value)),
        2 => strategy_key().prop_map(Op::Delete),
        2 => strategy_key().prop_map(Op::Search),
        1 => Just(Op::PopFirst),
        1 => Just(Op::PopLast),
    ]
}

pub fn strategy_ops(max_len: usize) -> impl Strategy<Value = Vec<Op>> {
    proptest::collection::vec(strategy_op(), 0..=max_len)
}
