//! Arena allocation for search-tree nodes.
//!
//! Provides `TreeNodeId` (a dense, total-orderable identifier) and
//! `NodeArena` (contiguous append-only storage). Nodes accumulate for the
//! duration of one canonicalization and the arena is dropped wholesale when
//! the search ends.
//!
//! # Determinism
//! - `TreeNodeId` ordering is by its inner `u32` and therefore by creation
//!   order.
//! - Iteration over slots is by index (0..len).
//! - Ids are never reused within a run, so integer ids can be held across
//!   pruning without invalidation.

use std::fmt;

/// Dense identifier for an arena-allocated search-tree node.
///
/// `TreeNodeId(u32)` is `Copy`, `Eq`, `Ord`, `Hash`. The inner value is an
/// index into the arena's slot vector.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TreeNodeId(u32);

impl TreeNodeId {
    /// Creates a new `TreeNodeId` from a raw `u32`.
    ///
    /// The caller must ensure the index is within bounds of the arena that
    /// holds the node; prefer ids returned by [`NodeArena::allocate`].
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw `u32` index.
    #[inline]
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for TreeNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TreeNodeId({})", self.0)
    }
}

/// Contiguous append-only storage for search-tree node data.
#[derive(Debug, Clone)]
pub struct NodeArena<T> {
    slots: Vec<T>,
}

impl<T> NodeArena<T> {
    /// Creates a new empty arena.
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Allocates a new slot and returns its `TreeNodeId`.
    pub fn allocate(&mut self, data: T) -> TreeNodeId {
        let idx = u32::try_from(self.slots.len()).expect("arena exceeds u32 index space");
        self.slots.push(data);
        TreeNodeId(idx)
    }

    /// Returns a reference to the data stored at `id`.
    ///
    /// # Panics
    /// Panics if `id` was not allocated by this arena.
    #[inline]
    pub fn get(&self, id: TreeNodeId) -> &T {
        &self.slots[id.0 as usize]
    }

    /// Returns a mutable reference to the data stored at `id`.
    ///
    /// # Panics
    /// Panics if `id` was not allocated by this arena.
    #[inline]
    pub fn get_mut(&mut self, id: TreeNodeId) -> &mut T {
        &mut self.slots[id.0 as usize]
    }

    /// Number of allocated nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the arena holds no nodes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Iterates over all nodes in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (TreeNodeId, &T)> {
        self.slots
            .iter()
            .enumerate()
            .map(|(idx, data)| (TreeNodeId(idx as u32), data))
    }
}

impl<T> Default for NodeArena<T> {
    fn default() -> Self {
        Self::new()
    }
}
