//! Shape statistics for a dictionary.

use serde::{Deserialize, Serialize};

use crate::DuplicatePolicy;

/// Snapshot of a dictionary's shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictStats {
    pub len: usize,
    /// Current max occupied level.
    pub level: usize,
    pub policy: DuplicatePolicy,
    /// Nodes linked at each level `0..=level`.
    pub nodes_per_level: Vec<usize>,
}

impl DictStats {
    /// Forward links held by entry nodes.
    pub fn total_links(&self) -> usize {
        self.nodes_per_level.iter().sum()
    }

    /// Average forward links per entry; `0.0` when empty.
    pub fn links_per_entry(&self) -> f64 {
        if self.len == 0 {
            0.0
        } else {
            self.total_links() as f64 / self.len as f64
        }
    }
}
