//! Skip list algorithms over a [`NodeStore`].
//!
//! Every keyed operation runs the same top-down walk: starting at the header
//! on the current top level, move right while the next key sorts before the
//! target, remember the last node visited on that level, then drop a level.
//! The sentinel ends every chain, so the walk has no end-of-list checks.

use std::cmp::Ordering;

use skipdict_error::{Result, invariant_error};
use skipdict_levels::{LevelGenerator, MAX_LEVEL, MAX_LEVELS};

use crate::store::{Bound, HEADER, NIL, NodeId, NodeStore};
use crate::{DictStats, DuplicatePolicy};

/// Last node before the target on each level.
type Update = [NodeId; MAX_LEVELS];

/// Where the walk stops relative to keys equal to the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    /// Before the first equal key.
    BeforeEqual,
    /// After the last equal key.
    AfterEqual,
}

#[derive(Debug)]
pub(crate) struct List<K, V> {
    pub(crate) store: NodeStore<K, V>,
    /// Max occupied level.
    pub(crate) level: usize,
    pub(crate) len: usize,
}

impl<K: Ord, V> List<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            store: NodeStore::new(),
            level: 0,
            len: 0,
        }
    }

    /// Fill `update` and return the node right after the final position.
    fn walk(&self, key: &K, stop: Stop, update: &mut Update) -> NodeId {
        let mut p = HEADER;
        for level in (0..=self.level).rev() {
            loop {
                let q = self.store.next(p, level);
                let advance = match self.store.node(q).cmp_key(key) {
                    Ordering::Less => true,
                    Ordering::Equal => stop == Stop::AfterEqual,
                    Ordering::Greater => false,
                };
                if !advance {
                    break;
                }
                p = q;
            }
            update[level] = p;
        }
        self.store.next(p, 0)
    }

    fn find(&self, key: &K) -> Option<NodeId> {
        let mut update = [HEADER; MAX_LEVELS];
        let q = self.walk(key, Stop::BeforeEqual, &mut update);
        (self.store.node(q).cmp_key(key) == Ordering::Equal).then_some(q)
    }

    pub(crate) fn insert<G: LevelGenerator + ?Sized>(
        &mut self,
        key: K,
        value: V,
        policy: DuplicatePolicy,
        levels: &mut G,
    ) -> Result<bool> {
        let mut update = [HEADER; MAX_LEVELS];
        let stop = match policy {
            DuplicatePolicy::Overwrite => Stop::BeforeEqual,
            DuplicatePolicy::AllowFifo => Stop::AfterEqual,
        };
        let q = self.walk(&key, stop, &mut update);

        if policy == DuplicatePolicy::Overwrite && self.store.node(q).cmp_key(&key) == Ordering::Equal {
            if let Some(slot) = self.store.node_mut(q).value_mut() {
                *slot = value;
            }
            return Ok(false);
        }

        // A draw above the current top only grows the list by one level;
        // the header is the predecessor there.
        let drawn = levels.next_level().min(MAX_LEVEL);
        let grows = drawn > self.level;
        let k = if grows { self.level + 1 } else { drawn };

        let id = self.store.alloc(key, value, k)?;
        if grows {
            self.level = k;
            update[k] = HEADER;
        }
        for (i, &prev) in update.iter().enumerate().take(k + 1) {
            let next = self.store.next(prev, i);
            self.store.set_next(id, i, next);
            self.store.set_next(prev, i, id);
        }
        self.len += 1;
        Ok(true)
    }

    pub(crate) fn delete(&mut self, key: &K) -> Option<(K, V)> {
        let mut update = [HEADER; MAX_LEVELS];
        let q = self.walk(key, Stop::BeforeEqual, &mut update);
        if self.store.node(q).cmp_key(key) != Ordering::Equal {
            return None;
        }
        self.unlink(&update, q)
    }

    pub(crate) fn pop_first(&mut self) -> Option<(K, V)> {
        let q = self.store.next(HEADER, 0);
        if q == NIL {
            return None;
        }
        self.unlink(&[HEADER; MAX_LEVELS], q)
    }

    pub(crate) fn pop_last(&mut self) -> Option<(K, V)> {
        let mut update = [HEADER; MAX_LEVELS];
        let mut p = HEADER;
        for level in (0..=self.level).rev() {
            loop {
                let q = self.store.next(p, level);
                if q == NIL || self.store.next(q, level) == NIL {
                    break;
                }
                p = q;
            }
            update[level] = p;
        }
        let q = self.store.next(p, 0);
        if q == NIL {
            return None;
        }
        self.unlink(&update, q)
    }

    /// Splice `q` out of every level it occupies, release it and shrink the
    /// top level while the header's top slot is empty.
    fn unlink(&mut self, update: &Update, q: NodeId) -> Option<(K, V)> {
        for (i, &prev) in update.iter().enumerate().take(self.level + 1) {
            if self.store.next(prev, i) != q {
                break;
            }
            let next = self.store.next(q, i);
            self.store.set_next(prev, i, next);
        }

        let node = self.store.release(q);
        while self.level > 0 && self.store.next(HEADER, self.level) == NIL {
            self.level -= 1;
        }
        self.len -= 1;

        match node.bound {
            Bound::Entry(k, v) => Some((k, v)),
            _ => None,
        }
    }

    pub(crate) fn search(&self, key: &K) -> Option<&V> {
        self.find(key)
            .and_then(|q| self.store.node(q).entry())
            .map(|(_, v)| v)
    }

    pub(crate) fn search_mut(&mut self, key: &K) -> Option<&mut V> {
        let q = self.find(key)?;
        self.store.node_mut(q).value_mut()
    }

    pub(crate) fn first(&self) -> Option<(&K, &V)> {
        self.store.node(self.store.next(HEADER, 0)).entry()
    }

    pub(crate) fn last(&self) -> Option<(&K, &V)> {
        let mut p = HEADER;
        for level in (0..=self.level).rev() {
            while self.store.next(p, level) != NIL {
                p = self.store.next(p, level);
            }
        }
        self.store.node(p).entry()
    }

    pub(crate) fn floor(&self, key: &K) -> Option<(&K, &V)> {
        let mut update = [HEADER; MAX_LEVELS];
        self.walk(key, Stop::AfterEqual, &mut update);
        self.store.node(update[0]).entry()
    }

    pub(crate) fn ceiling(&self, key: &K) -> Option<(&K, &V)> {
        let mut update = [HEADER; MAX_LEVELS];
        let q = self.walk(key, Stop::BeforeEqual, &mut update);
        self.store.node(q).entry()
    }

    pub(crate) fn rank(&self, key: &K) -> usize {
        self.iter().take_while(|(k, _)| *k < key).count()
    }

    pub(crate) fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            store: &self.store,
            next: self.store.next(HEADER, 0),
            remaining: self.len,
        }
    }

    /// Release every entry by walking level 0, leaving an empty list.
    pub(crate) fn release_all(&mut self) -> usize {
        let mut released = 0;
        let mut p = self.store.next(HEADER, 0);
        while p != NIL {
            let next = self.store.next(p, 0);
            self.store.release(p);
            released += 1;
            p = next;
        }
        for level in 0..MAX_LEVELS {
            self.store.set_next(HEADER, level, NIL);
        }
        self.level = 0;
        self.len = 0;
        released
    }

    pub(crate) fn level_len(&self, level: usize) -> usize {
        if level > MAX_LEVEL {
            return 0;
        }
        let mut count = 0;
        let mut p = self.store.next(HEADER, level);
        while p != NIL {
            count += 1;
            p = self.store.next(p, level);
        }
        count
    }

    pub(crate) fn stats(&self, policy: DuplicatePolicy) -> DictStats {
        DictStats {
            len: self.len,
            level: self.level,
            policy,
            nodes_per_level: (0..=self.level).map(|level| self.level_len(level)).collect(),
        }
    }

    /// Check every structural invariant, reporting the first violation.
    pub(crate) fn verify(&self, policy: DuplicatePolicy) -> Result<()> {
        if self.level > MAX_LEVEL {
            return Err(invariant_error("max level above cap").with_context("level", self.level));
        }
        if !self.store.node(NIL).forward.is_empty() {
            return Err(invariant_error("sentinel has forward links"));
        }
        if self.level > 0 && self.store.next(HEADER, self.level) == NIL {
            return Err(invariant_error("max level is not tight").with_context("level", self.level));
        }
        for level in self.level + 1..MAX_LEVELS {
            if self.store.next(HEADER, level) != NIL {
                return Err(invariant_error("header linked above max level").with_context("level", level));
            }
        }
        if self.store.live() != self.len {
            return Err(invariant_error("live nodes differ from len")
                .with_context("live", self.store.live())
                .with_context("len", self.len));
        }

        // occupancy[i]: level-0 nodes tall enough to be linked at level i
        let mut occupancy = [0usize; MAX_LEVELS];
        for level in 0..=self.level {
            let mut seen = 0;
            let mut prev_key: Option<&K> = None;
            let mut p = self.store.next(HEADER, level);
            while p != NIL {
                seen += 1;
                if seen > self.len {
                    return Err(invariant_error("chain longer than len").with_context("level", level));
                }
                let node = self.store.node(p);
                let Some(key) = node.key() else {
                    return Err(invariant_error("chain reaches a non-entry node").with_context("level", level));
                };
                if node.level() < level {
                    return Err(invariant_error("node linked above its height").with_context("level", level));
                }
                if let Some(prev) = prev_key {
                    let ordered = match policy {
                        DuplicatePolicy::Overwrite => prev < key,
                        DuplicatePolicy::AllowFifo => prev <= key,
                    };
                    if !ordered {
                        return Err(invariant_error("keys out of order")
                            .with_context("level", level)
                            .with_context("position", seen - 1));
                    }
                }
                if level == 0 {
                    for slot in occupancy.iter_mut().take(node.level().min(self.level) + 1) {
                        *slot += 1;
                    }
                    if node.level() > self.level {
                        return Err(invariant_error("node taller than max level")
                            .with_context("height", node.level())
                            .with_context("level", self.level));
                    }
                }
                prev_key = Some(key);
                p = node.forward[level];
            }
            if level == 0 && seen != self.len {
                return Err(invariant_error("level 0 count differs from len")
                    .with_context("count", seen)
                    .with_context("len", self.len));
            }
            if seen != occupancy[level] {
                return Err(invariant_error("node missing from a level it occupies")
                    .with_context("level", level)
                    .with_context("linked", seen)
                    .with_context("expected", occupancy[level]));
            }
        }
        Ok(())
    }
}

/// In-order iterator over a dictionary's entries.
#[derive(Debug)]
pub struct Iter<'a, K, V> {
    store: &'a NodeStore<K, V>,
    next: NodeId,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.next == NIL {
            return None;
        }
        let node = self.store.node(self.next);
        self.next = node.forward[0];
        self.remaining -= 1;
        node.entry()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> std::iter::FusedIterator for Iter<'_, K, V> {}
