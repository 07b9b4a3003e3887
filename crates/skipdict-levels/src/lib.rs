//! Level generation for skipdict.
//!
//! A new node occupies levels `0..=L`, where `L` is geometrically distributed:
//! level `L` is drawn with probability `p^L * (1 - p)`, clamped at
//! [`MAX_LEVEL`]. The default generator samples `p = 1/4` by reading bit
//! pairs out of a cached 31-bit random word, so most draws cost a shift and a
//! mask instead of a call into the RNG.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use skipdict_error::{Result, config_error};

/// Number of levels a dictionary can link, header included.
pub const MAX_LEVELS: usize = 16;

/// Highest level index a node can occupy.
pub const MAX_LEVEL: usize = MAX_LEVELS - 1;

/// Usable random bits per word pulled from the RNG.
const BITS_IN_RANDOM: u32 = 31;

/// Default number of bits per promotion draw (`p = 1/4`).
pub const DEFAULT_PROMOTION_BITS: u32 = 2;

/// Upper bound for [`BitPairLevels::with_promotion_bits`].
pub const MAX_PROMOTION_BITS: u32 = 8;

/// Produces the level of each newly inserted node.
pub trait LevelGenerator {
    /// Draw a level in `0..=MAX_LEVEL`.
    ///
    /// Implementations must never return a level above [`MAX_LEVEL`].
    fn next_level(&mut self) -> usize;
}

impl<G: LevelGenerator + ?Sized> LevelGenerator for Box<G> {
    fn next_level(&mut self) -> usize {
        (**self).next_level()
    }
}

impl<G: LevelGenerator + ?Sized> LevelGenerator for &mut G {
    fn next_level(&mut self) -> usize {
        (**self).next_level()
    }
}

/// Geometric level generator that consumes `bits` random bits per draw.
///
/// A draw of all-zero bits promotes the node one level, so the promotion
/// probability is `1 / 2^bits`. Words are refilled from the RNG once their
/// bits are used up.
#[derive(Debug, Clone)]
pub struct BitPairLevels<R = StdRng> {
    rng: R,
    bits: u32,
    mask: u32,
    random_bits: u32,
    draws_left: u32,
}

impl BitPairLevels<StdRng> {
    /// Reference generator (`p = 1/4`) seeded from a fixed value.
    pub fn seeded(seed: u64) -> Self {
        Self::build(StdRng::seed_from_u64(seed), DEFAULT_PROMOTION_BITS)
    }

    /// Reference generator (`p = 1/4`) seeded from the operating system.
    pub fn from_os_rng() -> Self {
        Self::build(StdRng::from_os_rng(), DEFAULT_PROMOTION_BITS)
    }
}

impl Default for BitPairLevels<StdRng> {
    fn default() -> Self {
        Self::from_os_rng()
    }
}

impl<R: RngCore> BitPairLevels<R> {
    /// Generator with the reference promotion probability over a caller RNG.
    pub fn new(rng: R) -> Self {
        Self::build(rng, DEFAULT_PROMOTION_BITS)
    }

    /// Generator with promotion probability `1 / 2^bits`.
    ///
    /// `bits` must be in `1..=MAX_PROMOTION_BITS`.
    pub fn with_promotion_bits(rng: R, bits: u32) -> Result<Self> {
        if bits == 0 || bits > MAX_PROMOTION_BITS {
            return Err(config_error(format!(
                "promotion bits must be in 1..={MAX_PROMOTION_BITS}"
            ))
            .with_context("bits", bits));
        }
        Ok(Self::build(rng, bits))
    }

    fn build(rng: R, bits: u32) -> Self {
        let mut levels = Self {
            rng,
            bits,
            mask: (1 << bits) - 1,
            random_bits: 0,
            draws_left: 0,
        };
        levels.refill();
        levels
    }

    /// Probability that a node is promoted to the next level.
    pub fn promotion_probability(&self) -> f64 {
        1.0 / f64::from(1u32 << self.bits)
    }

    pub fn promotion_bits(&self) -> u32 {
        self.bits
    }

    fn refill(&mut self) {
        self.random_bits = self.rng.next_u32() >> (32 - BITS_IN_RANDOM);
        self.draws_left = BITS_IN_RANDOM / self.bits;
    }

    fn take_draw(&mut self) -> u32 {
        let draw = self.random_bits & self.mask;
        self.random_bits >>= self.bits;
        self.draws_left -= 1;
        if self.draws_left == 0 {
            self.refill();
        }
        draw
    }
}

impl<R: RngCore> LevelGenerator for BitPairLevels<R> {
    fn next_level(&mut self) -> usize {
        let mut level = 0;
        // Stop drawing at the cap; a clamped draw and an early stop are
        // indistinguishable to the caller.
        while level < MAX_LEVEL && self.take_draw() == 0 {
            level += 1;
        }
        level
    }
}

/// Replays a fixed level sequence, cycling when it runs out.
///
/// Useful for building a dictionary with a known shape.
#[derive(Debug, Clone)]
pub struct FixedLevels {
    levels: Vec<usize>,
    next: usize,
}

impl FixedLevels {
    /// An empty sequence always yields level 0.
    pub fn new(levels: impl Into<Vec<usize>>) -> Self {
        Self {
            levels: levels.into(),
            next: 0,
        }
    }
}

impl LevelGenerator for FixedLevels {
    fn next_level(&mut self) -> usize {
        if self.levels.is_empty() {
            return 0;
        }
        let level = self.levels[self.next % self.levels.len()];
        self.next += 1;
        level.min(MAX_LEVEL)
    }
}
