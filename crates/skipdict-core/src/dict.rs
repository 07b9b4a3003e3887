//! The public dictionary handle.

use std::fmt;

use rand::SeedableRng;
use rand::rngs::StdRng;
use skipdict_error::{Result, destroyed_error};
use skipdict_levels::{BitPairLevels, LevelGenerator};

use crate::list::{Iter, List};
use crate::{DictOptions, DictStats, DuplicatePolicy};

/// A probabilistic ordered dictionary backed by a skip list.
///
/// Entries are kept in key order on level 0; each entry is also linked on
/// a random number of higher levels, drawn from the level generator `G`, so
/// insert, delete and search take `O(log n)` expected steps.
///
/// After [`destroy`](Self::destroy) every operation except `destroy` itself
/// returns an error in the [`Destroyed`](skipdict_error::ErrorCategory::Destroyed)
/// category.
///
/// # Example
///
/// ```
/// use skipdict_core::SkipDict;
///
/// let mut dict = SkipDict::new();
/// for key in [5, 1, 9, 3] {
///     assert!(dict.insert(key, key).unwrap());
/// }
/// assert_eq!(dict.search(&9).unwrap(), Some(&9));
/// assert!(dict.delete(&1).unwrap());
/// assert_eq!(dict.search(&1).unwrap(), None);
///
/// let keys: Vec<_> = dict.keys().unwrap().copied().collect();
/// assert_eq!(keys, vec![3, 5, 9]);
/// ```
pub struct SkipDict<K, V, G = BitPairLevels> {
    list: Option<List<K, V>>,
    levels: G,
    policy: DuplicatePolicy,
}

fn live<'a, K, V>(list: &'a Option<List<K, V>>, operation: &str) -> Result<&'a List<K, V>> {
    list.as_ref().ok_or_else(|| destroyed_error(operation))
}

fn live_mut<'a, K, V>(
    list: &'a mut Option<List<K, V>>,
    operation: &str,
) -> Result<&'a mut List<K, V>> {
    list.as_mut().ok_or_else(|| destroyed_error(operation))
}

impl<K: Ord, V> SkipDict<K, V> {
    /// Empty dictionary with overwrite-on-insert semantics and an OS-seeded
    /// reference level generator.
    pub fn new() -> Self {
        Self::with_generator(DuplicatePolicy::Overwrite, BitPairLevels::from_os_rng())
    }

    /// Empty dictionary built from [`DictOptions`].
    ///
    /// Fails when `promotion_bits` is out of range.
    pub fn with_options(options: &DictOptions) -> Result<Self> {
        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let levels = BitPairLevels::with_promotion_bits(rng, options.promotion_bits)?;
        Ok(Self::with_generator(options.duplicate_policy, levels))
    }

    /// Empty dictionary with a reproducible level sequence.
    pub fn seeded(policy: DuplicatePolicy, seed: u64) -> Self {
        Self::with_generator(policy, BitPairLevels::seeded(seed))
    }
}

impl<K: Ord, V> Default for SkipDict<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord, V, G: LevelGenerator> SkipDict<K, V, G> {
    /// Empty dictionary drawing node levels from `levels`.
    pub fn with_generator(policy: DuplicatePolicy, levels: G) -> Self {
        Self {
            list: Some(List::new()),
            levels,
            policy,
        }
    }

    /// Duplicate policy chosen at construction.
    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Whether [`destroy`](Self::destroy) has run.
    pub fn is_destroyed(&self) -> bool {
        self.list.is_none()
    }

    /// Number of live entries.
    pub fn len(&self) -> Result<usize> {
        Ok(live(&self.list, "len")?.len)
    }

    /// Whether the dictionary holds no entries.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(live(&self.list, "is_empty")?.len == 0)
    }

    /// Current max occupied level, in `0..=MAX_LEVEL`.
    pub fn level(&self) -> Result<usize> {
        Ok(live(&self.list, "level")?.level)
    }

    // ========================================================================
    // Core operations
    // ========================================================================

    /// Insert a binding.
    ///
    /// Under [`DuplicatePolicy::Overwrite`] an existing key has its value
    /// replaced and `false` is returned. Otherwise a new node is linked and
    /// `true` is returned. Node memory is reserved before any link changes,
    /// so an allocation error leaves the dictionary as it was.
    pub fn insert(&mut self, key: K, value: V) -> Result<bool> {
        let list = live_mut(&mut self.list, "insert")?;
        list.insert(key, value, self.policy, &mut self.levels)
    }

    /// Remove the binding for `key`, returning whether one existed.
    ///
    /// Under [`DuplicatePolicy::AllowFifo`] only the oldest binding goes.
    pub fn delete(&mut self, key: &K) -> Result<bool> {
        Ok(self.remove(key)?.is_some())
    }

    /// Remove the binding for `key` and return its value.
    pub fn remove(&mut self, key: &K) -> Result<Option<V>> {
        let list = live_mut(&mut self.list, "remove")?;
        Ok(list.delete(key).map(|(_, v)| v))
    }

    /// Look up the value bound to `key`.
    pub fn search(&self, key: &K) -> Result<Option<&V>> {
        Ok(live(&self.list, "search")?.search(key))
    }

    /// Mutable access to the value bound to `key`.
    pub fn search_mut(&mut self, key: &K) -> Result<Option<&mut V>> {
        Ok(live_mut(&mut self.list, "search_mut")?.search_mut(key))
    }

    /// Whether `key` has a binding.
    pub fn contains(&self, key: &K) -> Result<bool> {
        Ok(self.search(key)?.is_some())
    }

    /// Release every node and the header.
    ///
    /// Returns the number of entries released. A second call is a no-op
    /// returning 0; every other operation fails from now on.
    pub fn destroy(&mut self) -> usize {
        match self.list.take() {
            Some(mut list) => list.release_all(),
            None => 0,
        }
    }

    /// Release every entry but keep the dictionary usable.
    pub fn clear(&mut self) -> Result<usize> {
        Ok(live_mut(&mut self.list, "clear")?.release_all())
    }

    /// Insert every pair, returning how many created a new node.
    pub fn try_extend<I>(&mut self, pairs: I) -> Result<usize>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let mut inserted = 0;
        for (key, value) in pairs {
            if self.insert(key, value)? {
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    // ========================================================================
    // Ordered access
    // ========================================================================

    /// Smallest entry.
    pub fn first(&self) -> Result<Option<(&K, &V)>> {
        Ok(live(&self.list, "first")?.first())
    }

    /// Largest entry.
    pub fn last(&self) -> Result<Option<(&K, &V)>> {
        Ok(live(&self.list, "last")?.last())
    }

    /// Largest entry whose key is `<= key`.
    pub fn floor(&self, key: &K) -> Result<Option<(&K, &V)>> {
        Ok(live(&self.list, "floor")?.floor(key))
    }

    /// Smallest entry whose key is `>= key`.
    pub fn ceiling(&self, key: &K) -> Result<Option<(&K, &V)>> {
        Ok(live(&self.list, "ceiling")?.ceiling(key))
    }

    /// Remove and return the smallest entry.
    pub fn pop_first(&mut self) -> Result<Option<(K, V)>> {
        Ok(live_mut(&mut self.list, "pop_first")?.pop_first())
    }

    /// Remove and return the largest entry.
    pub fn pop_last(&mut self) -> Result<Option<(K, V)>> {
        Ok(live_mut(&mut self.list, "pop_last")?.pop_last())
    }

    /// Number of entries with key `< key`. Walks level 0.
    pub fn rank(&self, key: &K) -> Result<usize> {
        Ok(live(&self.list, "rank")?.rank(key))
    }

    /// The `index`-th smallest entry (0-based). Walks level 0.
    pub fn select(&self, index: usize) -> Result<Option<(&K, &V)>> {
        Ok(live(&self.list, "select")?.iter().nth(index))
    }

    // ========================================================================
    // Iteration
    // ========================================================================

    /// Entries in key order.
    pub fn iter(&self) -> Result<Iter<'_, K, V>> {
        Ok(live(&self.list, "iter")?.iter())
    }

    /// Keys in order.
    pub fn keys(&self) -> Result<impl Iterator<Item = &K> + '_> {
        Ok(self.iter()?.map(|(k, _)| k))
    }

    /// Values in key order.
    pub fn values(&self) -> Result<impl Iterator<Item = &V> + '_> {
        Ok(self.iter()?.map(|(_, v)| v))
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// Number of nodes linked at `level`; 0 above the cap.
    pub fn level_len(&self, level: usize) -> Result<usize> {
        Ok(live(&self.list, "level_len")?.level_len(level))
    }

    /// Length, level and per-level occupancy.
    pub fn stats(&self) -> Result<DictStats> {
        Ok(live(&self.list, "stats")?.stats(self.policy))
    }

    /// Check ordering, level bounds, the tight max level and per-level
    /// link counts, failing with an `Invariant` error on the first problem.
    pub fn verify(&self) -> Result<()> {
        live(&self.list, "verify")?.verify(self.policy)
    }
}

impl<K, V, G> fmt::Debug for SkipDict<K, V, G>
where
    K: Ord + fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.list {
            Some(list) => f.debug_map().entries(list.iter()).finish(),
            None => f.write_str("SkipDict(destroyed)"),
        }
    }
}
