//! Construction options for [`SkipDict`](crate::SkipDict).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use skipdict_error::{DictError, config_error};
use skipdict_levels::DEFAULT_PROMOTION_BITS;

/// What `insert` does when the key is already present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Replace the stored value and report that no key was added.
    #[default]
    Overwrite,
    /// Keep every binding. Equal keys sit in insertion order, so `search`
    /// and `delete` see the oldest binding first.
    AllowFifo,
}

impl fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DuplicatePolicy::Overwrite => f.write_str("overwrite"),
            DuplicatePolicy::AllowFifo => f.write_str("allow_fifo"),
        }
    }
}

impl FromStr for DuplicatePolicy {
    type Err = DictError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "overwrite" => Ok(DuplicatePolicy::Overwrite),
            "allow_fifo" | "allow-fifo" | "fifo" => Ok(DuplicatePolicy::AllowFifo),
            other => Err(config_error("unknown duplicate policy").with_context("value", other)),
        }
    }
}

/// Options for building a dictionary with the default level generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictOptions {
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,
    /// Promotion probability is `1 / 2^promotion_bits`.
    #[serde(default = "default_promotion_bits")]
    pub promotion_bits: u32,
    /// Seed for the level generator; `None` seeds from the OS.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_promotion_bits() -> u32 {
    DEFAULT_PROMOTION_BITS
}

impl Default for DictOptions {
    fn default() -> Self {
        Self {
            duplicate_policy: DuplicatePolicy::Overwrite,
            promotion_bits: DEFAULT_PROMOTION_BITS,
            seed: None,
        }
    }
}

impl DictOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_promotion_bits(mut self, bits: u32) -> Self {
        self.promotion_bits = bits;
        self
    }
}
