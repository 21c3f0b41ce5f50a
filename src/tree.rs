//! The individualization-refinement search tree.
//!
//! `SearchTree` owns an arena of [`TreeNode`]s. Each interior node carries
//! the ordered partition valid at that node and a target cell; the child at
//! local index `i` corresponds to individualizing the vertex at position
//! `child_refiner_cell + i` of the node's partition. The tree tracks the
//! currently elected canonical leaf, and pruning marks whole subtrees dead
//! without deallocating their slots.
//!
//! # Invariants
//! - Parent links form a tree rooted at `root`; `level` is the distance from
//!   the root.
//! - `children` and `child_pruned` are sized once, at node creation, from
//!   the target cell width and never grow.
//! - A pruned node has every descendant pruned; the canonical leaf and its
//!   ancestors are never pruned.

use crate::arena::{NodeArena, TreeNodeId};
use crate::partition::OrderedPartition;
use crate::pruner::PruneData;
use log::trace;

/// One node of the search tree.
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub(crate) level: usize,
    pub(crate) parent: Option<TreeNodeId>,
    pub(crate) pi: OrderedPartition,
    /// Begin position of the target cell; equal to `pi.len()` on leaves.
    pub(crate) child_refiner_cell: usize,
    /// Child slot per target-cell position, filled as the driver descends.
    pub(crate) children: Vec<Option<TreeNodeId>>,
    /// Per-child pruned bit; set means the slot need not (or must not) be
    /// descended into.
    pub(crate) child_pruned: Vec<bool>,
    /// Absolute position in the parent's partition that was individualized
    /// to produce this node. Unused on the root.
    pub(crate) individualized_position: usize,
    pub(crate) is_pruned: bool,
    /// Pruning-engine auxiliary data, created and destroyed with the node.
    pub(crate) prune: PruneData,
}

impl TreeNode {
    /// Depth of this node; the root has level 0.
    #[inline]
    pub fn level(&self) -> usize {
        self.level
    }

    /// The owning parent, if any.
    #[inline]
    pub fn parent(&self) -> Option<TreeNodeId> {
        self.parent
    }

    /// The ordered partition valid at this node.
    #[inline]
    pub fn pi(&self) -> &OrderedPartition {
        &self.pi
    }

    /// Begin position of the cell whose vertices are individualized to
    /// produce children. Equal to `pi.len()` when the partition is discrete.
    #[inline]
    pub fn child_refiner_cell(&self) -> usize {
        self.child_refiner_cell
    }

    /// Absolute position in the parent's partition that was individualized
    /// to produce this node.
    #[inline]
    pub fn child_individualized_position(&self) -> usize {
        self.individualized_position
    }

    /// Child slots in target-cell order.
    #[inline]
    pub fn children(&self) -> &[Option<TreeNodeId>] {
        &self.children
    }

    /// Per-child pruned bits.
    #[inline]
    pub fn child_pruned(&self) -> &[bool] {
        &self.child_pruned
    }

    /// Whether the subtree rooted here is pruned.
    #[inline]
    pub fn is_pruned(&self) -> bool {
        self.is_pruned
    }

    /// Whether the partition at this node is discrete.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// The pruning-engine auxiliary data of this node.
    #[inline]
    pub fn prune_data(&self) -> &crate::pruner::PruneData {
        &self.prune
    }
}

/// The search tree of one canonicalization run.
#[derive(Debug, Clone, Default)]
pub struct SearchTree {
    arena: NodeArena<TreeNode>,
    root: Option<TreeNodeId>,
    canon_leaf: Option<TreeNodeId>,
    subtree_prunes: usize,
}

impl SearchTree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the root node.
    ///
    /// `target_cell` is the begin position of the cell to individualize, or
    /// `None` when `pi` is discrete (the root is then the only leaf).
    ///
    /// # Panics
    /// Panics if a root already exists.
    pub fn create_root(&mut self, pi: OrderedPartition, target_cell: Option<usize>) -> TreeNodeId {
        assert!(self.root.is_none(), "tree already has a root");
        let id = self.allocate(None, 0, pi, target_cell, 0);
        self.root = Some(id);
        id
    }

    /// Creates the child of `parent` at local index `local_idx`.
    ///
    /// `pi` is the refined partition after individualizing the vertex at
    /// position `child_refiner_cell + local_idx` of the parent's partition.
    ///
    /// # Panics
    /// Panics if the slot is occupied or marked pruned.
    pub fn create_child(
        &mut self,
        parent: TreeNodeId,
        local_idx: usize,
        pi: OrderedPartition,
        target_cell: Option<usize>,
    ) -> TreeNodeId {
        let parent_node = self.arena.get(parent);
        assert!(parent_node.children[local_idx].is_none(), "child slot occupied");
        assert!(!parent_node.child_pruned[local_idx], "child slot is pruned");
        let level = parent_node.level + 1;
        let position = parent_node.child_refiner_cell + local_idx;
        let id = self.allocate(Some(parent), level, pi, target_cell, position);
        self.arena.get_mut(parent).children[local_idx] = Some(id);
        id
    }

    fn allocate(
        &mut self,
        parent: Option<TreeNodeId>,
        level: usize,
        pi: OrderedPartition,
        target_cell: Option<usize>,
        individualized_position: usize,
    ) -> TreeNodeId {
        let (child_refiner_cell, width) = match target_cell {
            Some(begin) => (begin, pi.cell_end(begin) - begin),
            None => (pi.len(), 0),
        };
        self.arena.allocate(TreeNode {
            level,
            parent,
            pi,
            child_refiner_cell,
            children: vec![None; width],
            child_pruned: vec![false; width],
            individualized_position,
            is_pruned: false,
            prune: PruneData::default(),
        })
    }

    /// The root node, if created.
    #[inline]
    pub fn root(&self) -> Option<TreeNodeId> {
        self.root
    }

    /// The currently elected canonical leaf.
    #[inline]
    pub fn canon_leaf(&self) -> Option<TreeNodeId> {
        self.canon_leaf
    }

    /// Elects `leaf` as the canonical leaf.
    pub fn set_canon_leaf(&mut self, leaf: TreeNodeId) {
        self.canon_leaf = Some(leaf);
    }

    /// Shared access to a node.
    #[inline]
    pub fn node(&self, id: TreeNodeId) -> &TreeNode {
        self.arena.get(id)
    }

    /// Mutable access to a node.
    #[inline]
    pub(crate) fn node_mut(&mut self, id: TreeNodeId) -> &mut TreeNode {
        self.arena.get_mut(id)
    }

    /// Number of nodes ever created.
    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.arena.len()
    }

    /// Number of `prune_subtree` calls that newly pruned something.
    #[inline]
    pub fn subtree_prunes(&self) -> usize {
        self.subtree_prunes
    }

    /// Marks `id` and every descendant pruned and drops the partition
    /// storage of the pruned nodes. Idempotent; the slots stay allocated so
    /// ids held elsewhere remain valid.
    pub fn prune_subtree(&mut self, id: TreeNodeId) {
        if self.arena.get(id).is_pruned {
            return;
        }
        trace!("pruning subtree at {}", id);
        self.subtree_prunes += 1;

        // Reflect the prune in the parent's bit so slot-level checks and the
        // merge priority see externally pruned children.
        if let Some(parent) = self.arena.get(id).parent {
            let position = self.arena.get(id).individualized_position;
            let parent_node = self.arena.get_mut(parent);
            let local_idx = position - parent_node.child_refiner_cell;
            parent_node.child_pruned[local_idx] = true;
        }

        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let node = self.arena.get_mut(current);
            if node.is_pruned {
                continue;
            }
            node.is_pruned = true;
            node.pi.release();
            for slot in 0..node.children.len() {
                if let Some(child) = self.arena.get(current).children[slot] {
                    stack.push(child);
                }
            }
        }
    }

    /// Lowest common ancestor of two nodes.
    ///
    /// Reference two-pointer routine: level the deeper node, then walk both
    /// up in lockstep.
    ///
    /// # Panics
    /// Panics if the nodes are not in the same tree.
    pub fn lowest_common_ancestor(&self, a: TreeNodeId, b: TreeNodeId) -> TreeNodeId {
        let mut a = a;
        let mut b = b;
        while self.node(a).level > self.node(b).level {
            a = self.node(a).parent.expect("level implies a parent");
        }
        while self.node(b).level > self.node(a).level {
            b = self.node(b).parent.expect("level implies a parent");
        }
        while a != b {
            a = self.node(a).parent.expect("nodes share no ancestor");
            b = self.node(b).parent.expect("nodes share no ancestor");
        }
        a
    }

    /// The vertices individualized on the path from the root to `id`, in
    /// root-to-node order.
    pub fn individualized_prefix(&self, id: TreeNodeId) -> Vec<usize> {
        let mut prefix = Vec::with_capacity(self.node(id).level);
        let mut current = id;
        while let Some(parent) = self.node(current).parent {
            let position = self.node(current).individualized_position;
            prefix.push(self.node(parent).pi.get(position));
            current = parent;
        }
        prefix.reverse();
        prefix
    }
}
