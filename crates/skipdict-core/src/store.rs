//! Index arena holding every node of one dictionary.
//!
//! Slot 0 is the header and slot 1 the sentinel; both live as long as the
//! store. Entry nodes are allocated at insert and released at delete, and
//! released slots are reused by later inserts.

use std::cmp::Ordering;

use skipdict_error::{Result, allocation_error};
use skipdict_levels::MAX_LEVELS;

/// Stable index of a node inside its [`NodeStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(usize);

/// The header node, start of every traversal.
pub(crate) const HEADER: NodeId = NodeId(0);

/// The sentinel node, end of every level's chain.
pub(crate) const NIL: NodeId = NodeId(1);

/// What a node holds.
///
/// Variant order is also key order: the header sorts before every entry and
/// the sentinel after every entry, so walks never special-case either end.
#[derive(Debug)]
pub(crate) enum Bound<K, V> {
    Head,
    Entry(K, V),
    Nil,
}

#[derive(Debug)]
pub(crate) struct Node<K, V> {
    pub(crate) bound: Bound<K, V>,
    /// `forward[i]` is the next node at level `i`.
    pub(crate) forward: Vec<NodeId>,
}

impl<K: Ord, V> Node<K, V> {
    /// Compare this node's key with `key`.
    pub(crate) fn cmp_key(&self, key: &K) -> Ordering {
        match &self.bound {
            Bound::Head => Ordering::Less,
            Bound::Entry(k, _) => k.cmp(key),
            Bound::Nil => Ordering::Greater,
        }
    }
}

impl<K, V> Node<K, V> {
    pub(crate) fn entry(&self) -> Option<(&K, &V)> {
        match &self.bound {
            Bound::Entry(k, v) => Some((k, v)),
            _ => None,
        }
    }

    pub(crate) fn key(&self) -> Option<&K> {
        self.entry().map(|(k, _)| k)
    }

    pub(crate) fn value_mut(&mut self) -> Option<&mut V> {
        match &mut self.bound {
            Bound::Entry(_, v) => Some(v),
            _ => None,
        }
    }

    /// Highest level this node is linked at.
    pub(crate) fn level(&self) -> usize {
        self.forward.len().saturating_sub(1)
    }
}

#[derive(Debug)]
pub(crate) struct NodeStore<K, V> {
    slots: Vec<Option<Node<K, V>>>,
    free: Vec<NodeId>,
}

impl<K, V> NodeStore<K, V> {
    /// Store holding only the header (all slots pointing at the sentinel)
    /// and the sentinel.
    pub(crate) fn new() -> Self {
        let header = Node {
            bound: Bound::Head,
            forward: vec![NIL; MAX_LEVELS],
        };
        let sentinel = Node {
            bound: Bound::Nil,
            forward: Vec::new(),
        };
        Self {
            slots: vec![Some(header), Some(sentinel)],
            free: Vec::new(),
        }
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node<K, V> {
        match &self.slots[id.0] {
            Some(node) => node,
            None => unreachable!("link to released node {id:?}"),
        }
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node<K, V> {
        match &mut self.slots[id.0] {
            Some(node) => node,
            None => unreachable!("link to released node {id:?}"),
        }
    }

    /// Next node after `id` at `level`.
    pub(crate) fn next(&self, id: NodeId, level: usize) -> NodeId {
        self.node(id).forward[level]
    }

    pub(crate) fn set_next(&mut self, id: NodeId, level: usize, to: NodeId) {
        self.node_mut(id).forward[level] = to;
    }

    /// Allocate an unlinked node for levels `0..=level`.
    ///
    /// All memory is reserved before the node is stored, so on error the
    /// store is untouched.
    pub(crate) fn alloc(&mut self, key: K, value: V, level: usize) -> Result<NodeId> {
        let mut forward = Vec::new();
        forward.try_reserve_exact(level + 1).map_err(allocation_error)?;
        forward.resize(level + 1, NIL);

        let node = Node {
            bound: Bound::Entry(key, value),
            forward,
        };
        match self.free.pop() {
            Some(id) => {
                self.slots[id.0] = Some(node);
                Ok(id)
            }
            None => {
                self.slots.try_reserve(1).map_err(allocation_error)?;
                self.slots.push(Some(node));
                Ok(NodeId(self.slots.len() - 1))
            }
        }
    }

    /// Release an entry node that is no longer linked anywhere.
    pub(crate) fn release(&mut self, id: NodeId) -> Node<K, V> {
        debug_assert!(id != HEADER && id != NIL, "header and sentinel are never released");
        match self.slots[id.0].take() {
            Some(node) => {
                self.free.push(id);
                node
            }
            None => unreachable!("double release of node {id:?}"),
        }
    }

    /// Number of occupied entry slots.
    pub(crate) fn live(&self) -> usize {
        self.slots.len() - 2 - self.free.len()
    }
}
