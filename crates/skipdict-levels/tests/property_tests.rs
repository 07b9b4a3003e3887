//! Property tests for skipdict-levels

use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use skipdict_levels::{BitPairLevels, LevelGenerator, MAX_LEVEL, MAX_PROMOTION_BITS};

proptest! {
    /// Every draw stays within the level cap, whatever the seed and ratio.
    #[test]
    fn prop_levels_within_cap(seed in any::<u64>(), bits in 1u32..=MAX_PROMOTION_BITS) {
        let mut levels = BitPairLevels::with_promotion_bits(StdRng::seed_from_u64(seed), bits).unwrap();
        for _ in 0..2_000 {
            prop_assert!(levels.next_level() <= MAX_LEVEL);
        }
    }

    /// Two generators built from the same seed agree draw for draw.
    #[test]
    fn prop_same_seed_same_levels(seed in any::<u64>()) {
        let mut a = BitPairLevels::seeded(seed);
        let mut b = BitPairLevels::seeded(seed);
        for _ in 0..500 {
            prop_assert_eq!(a.next_level(), b.next_level());
        }
    }

    /// Out-of-range ratios are rejected instead of silently clamped.
    #[test]
    fn prop_bits_out_of_range_rejected(bits in (MAX_PROMOTION_BITS + 1)..64u32) {
        prop_assert!(BitPairLevels::with_promotion_bits(StdRng::seed_from_u64(0), bits).is_err());
    }
}
