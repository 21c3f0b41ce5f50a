//! Automorphism-based subtree pruning for the canonicalization search.
//!
//! `AutPruner` reacts to two kinds of events raised by the search driver:
//! an automorphism discovered at a leaf, and an imminent descent from an
//! interior node. The first prunes the witnessing branch below the lowest
//! common ancestor with the canonical leaf; the second folds freshly
//! reported stabilizer generators into a per-node union-find over the
//! node's children and prunes every child that lands in the same orbit
//! class as a kept sibling.
//!
//! # Invariants
//! - The canonical leaf and its ancestors are never pruned; the canonical
//!   child always wins a merge.
//! - Union-find classes only merge; `num_roots` only decreases;
//!   `child_pruned` bits transition only from false to true.
//! - Per-node union-find state is materialized lazily, on the first merge
//!   attempt at that node, and never reset: child slots are sized once and
//!   pruned bits never clear, so the state stays valid across descents.
//!
//! # Citations
//! - McKay & Piperno, "Practical graph isomorphism, II" (2014) — orbit
//!   pruning in individualization-refinement searches.
//! - Tarjan & van Leeuwen, "Worst-case analysis of set union algorithms"
//!   (1984) — path-halving union-find.

use crate::arena::TreeNodeId;
use crate::group::AutomorphismGroup;
use crate::perm::Perm;
use crate::tree::SearchTree;
use log::trace;

/// Per-node auxiliary state of the pruning engine.
///
/// Created together with its tree node and destroyed with it. The
/// union-find `parent` array stays empty until pruning first becomes
/// possible at the node.
#[derive(Debug, Clone, Default)]
pub struct PruneData {
    /// Number of children ever created under this node.
    pub(crate) child_count: usize,
    /// Union-find parent array over local child indices; empty until
    /// materialized.
    pub(crate) parent: Vec<usize>,
    /// Number of union-find roots minus one, so exhaustion compares
    /// against zero.
    pub(crate) num_roots: usize,
}

impl PruneData {
    /// Number of children ever created under the owning node.
    #[inline]
    pub fn child_count(&self) -> usize {
        self.child_count
    }

    /// Whether the union-find array has been materialized.
    #[inline]
    pub fn is_materialized(&self) -> bool {
        !self.parent.is_empty()
    }

    /// Current number of union-find roots minus one. Only meaningful once
    /// materialized.
    #[inline]
    pub fn num_roots(&self) -> usize {
        self.num_roots
    }
}

/// Root lookup with path halving: every visited node is redirected to its
/// grandparent, halving the path per traversal.
fn find_root(parent: &mut [usize], mut current: usize) -> usize {
    loop {
        let p = parent[current];
        if p == current {
            return current;
        }
        let pp = parent[p];
        if pp == p {
            return p;
        }
        parent[current] = pp;
        current = p;
    }
}

/// Control flow of one step of the ancestor walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Break,
}

/// The pruning engine of one canonicalization run.
///
/// Holds only reusable buffers; all per-node state lives in [`PruneData`]
/// inside the tree nodes. Buffers are cleared, not freed, between events.
#[derive(Debug, Default)]
pub struct AutPruner {
    /// Ancestors of the descending node that still need a group update,
    /// bottom-up.
    t_path: Vec<TreeNodeId>,
    /// Ancestors of the canonical leaf that still need a group update,
    /// bottom-up.
    c_path: Vec<TreeNodeId>,
    /// Generators returned by the latest `update` call.
    new_auts: Vec<Perm>,
    /// Children whose subtrees must be pruned once the current merge scan
    /// releases its node borrow.
    prune_queue: Vec<TreeNodeId>,
}

impl AutPruner {
    /// Creates a pruner with empty buffers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bookkeeping for a node being created: counts the child on its
    /// parent. Returns `true` ("proceed") so drivers can fold visitor
    /// results.
    pub fn tree_create_node_begin(&mut self, tree: &mut SearchTree, node: TreeNodeId) -> bool {
        if let Some(parent) = tree.node(node).parent() {
            tree.node_mut(parent).prune.child_count += 1;
        }
        true
    }

    /// Handles an automorphism discovered at a leaf.
    ///
    /// Stores `aut` in the group adapter, walks the witnessing leaf and the
    /// canonical leaf up to their lowest common ancestor, and prunes the
    /// witnessing side's child of that ancestor. The driver may rely on the
    /// pruned subtree being either skipped entirely or already visited.
    ///
    /// # Panics
    /// Panics if no canonical leaf is elected, or if `leaf` is the
    /// canonical leaf itself.
    pub fn automorphism_leaf<A: AutomorphismGroup>(
        &mut self,
        tree: &mut SearchTree,
        group: &mut A,
        leaf: TreeNodeId,
        aut: &Perm,
    ) {
        trace!("automorphism at {}: {}", leaf, aut);
        group.add_automorphism(tree, leaf, aut);

        let canon = tree
            .canon_leaf()
            .expect("an automorphism needs an elected canonical leaf to compare against");
        assert_ne!(canon, leaf, "the canonical leaf cannot witness an automorphism with itself");

        // Level the deeper side, then walk up in lockstep until the parents
        // coincide; the remaining pair are the two children of the LCA.
        let mut t_canon = canon;
        let mut t_aut = leaf;
        while tree.node(t_canon).level() > tree.node(t_aut).level() {
            t_canon = tree.node(t_canon).parent().expect("positive level implies a parent");
        }
        while tree.node(t_aut).level() > tree.node(t_canon).level() {
            t_aut = tree.node(t_aut).parent().expect("positive level implies a parent");
        }
        assert_ne!(t_canon, t_aut, "distinct leaves cannot be related by ancestry");
        while tree.node(t_canon).parent() != tree.node(t_aut).parent() {
            t_canon = tree.node(t_canon).parent().expect("leveled nodes run out of ancestors");
            t_aut = tree.node(t_aut).parent().expect("leveled nodes run out of ancestors");
        }
        debug_assert_ne!(t_canon, t_aut);
        tree.prune_subtree(t_aut);
    }

    /// Handles an automorphism discovered without a full leaf path: same
    /// group accounting as [`Self::automorphism_leaf`], no pruning.
    pub fn automorphism_implicit<A: AutomorphismGroup>(
        &mut self,
        tree: &mut SearchTree,
        group: &mut A,
        node: TreeNodeId,
        aut: &Perm,
        tag: usize,
    ) {
        trace!("implicit automorphism at {} (tag {}): {}", node, tag, aut);
        group.add_automorphism(tree, node, aut);
    }

    /// Invoked before the driver descends from `t` into a child. May mark
    /// children of `t` and of its ancestors pruned and prune their
    /// subtrees.
    pub fn tree_before_descend<A: AutomorphismGroup>(
        &mut self,
        tree: &mut SearchTree,
        group: &mut A,
        t: TreeNodeId,
    ) {
        if tree.node(t).is_pruned() {
            return;
        }
        // Leaves and nodes without created children have nothing to prune.
        if tree.node(t).prune_data().child_count() == 0 {
            return;
        }
        if !group.need_update(tree, t) {
            return;
        }

        // Find the lowest ancestor that needs updating, and the same for
        // the canonical leaf: its path must be known to protect it.
        self.t_path.clear();
        self.c_path.clear();
        let mut walk = Some(t);
        while let Some(id) = walk {
            if !group.need_update(tree, id) {
                break;
            }
            self.t_path.push(id);
            walk = tree.node(id).parent();
        }
        debug_assert!(!self.t_path.is_empty());
        let mut walk = tree.canon_leaf();
        while let Some(id) = walk {
            if !group.need_update(tree, id) {
                break;
            }
            self.c_path.push(id);
            walk = tree.node(id).parent();
        }
        // Independent paths: the canonical leaf is not affected by any node
        // processed below, forget it.
        if !self.c_path.is_empty() && self.t_path.last() != self.c_path.last() {
            self.c_path.clear();
        }

        // Topmost needs-update ancestor first, popping the canonical path
        // in lockstep.
        while let Some(&ancestor) = self.t_path.last() {
            if self.update_ancestor(tree, group, ancestor) == Flow::Break {
                break;
            }
            if !self.c_path.is_empty() {
                self.c_path.pop();
            }
            self.t_path.pop();
        }
    }

    /// Pulls fresh generators at `a_t` and merges its children's orbit
    /// classes. Returns whether the walk continues toward the descending
    /// node.
    fn update_ancestor<A: AutomorphismGroup>(
        &mut self,
        tree: &mut SearchTree,
        group: &mut A,
        a_t: TreeNodeId,
    ) -> Flow {
        if tree.node(a_t).is_pruned() {
            return Flow::Break;
        }

        group.update(tree, a_t, &mut self.new_auts);
        if self.new_auts.is_empty() {
            // The root always stays relevant: merges recorded at deeper
            // levels on earlier descents may still apply there.
            return if tree.node(a_t).parent().is_some() { Flow::Break } else { Flow::Continue };
        }

        let num_children = tree.node(a_t).children().len();
        debug_assert!(num_children > 0);
        {
            let data = &mut tree.node_mut(a_t).prune;
            if data.parent.is_empty() {
                data.parent.extend(0..num_children);
                data.num_roots = num_children - 1;
            } else if data.num_roots == 0 {
                // Everything already collapsed into one class.
                return Flow::Continue;
            }
        }

        // The canonical child of `a_t`, if the canonical leaf lies in this
        // subtree; it may never lose a merge nor be marked pruned.
        let canon_child_local_idx: Option<usize> = if self.c_path.is_empty() {
            None
        } else if *self.c_path.last().expect("checked non-empty") != a_t {
            // The canonical leaf left the processed subtree; forget the
            // rest of its path.
            self.c_path.clear();
            None
        } else {
            debug_assert!(self.c_path.len() > 1, "the canonical path cannot stop at an interior node");
            let canon_child = self.c_path[self.c_path.len() - 2];
            let position = tree.node(canon_child).child_individualized_position();
            let node = tree.node(a_t);
            debug_assert_eq!(node.pi().get_inverse(node.pi().get(position)), position);
            Some(position - node.child_refiner_cell())
        };

        let cell_begin = tree.node(a_t).child_refiner_cell();
        debug_assert!(self.prune_queue.is_empty());
        'generators: for aut in &self.new_auts {
            trace!("merging children of {} with generator {}", a_t, aut);
            let node = tree.node_mut(a_t);
            let cell_end = node.pi.cell_end(cell_begin);
            debug_assert_eq!(cell_end - cell_begin, num_children);

            for idx_local in 0..num_children {
                let v = node.pi.get(cell_begin + idx_local);
                let v_image = aut.image(v);
                if v == v_image {
                    continue;
                }
                let image_idx = node.pi.get_inverse(v_image);
                assert!(
                    image_idx >= cell_begin && image_idx < cell_end,
                    "generator does not stabilize the target cell"
                );
                let image_local = image_idx - cell_begin;
                let root = find_root(&mut node.prune.parent, idx_local);
                let image_root = find_root(&mut node.prune.parent, image_local);
                if root == image_root {
                    continue;
                }

                // Merge priority: the canonical child wins, then a root
                // whose subtree is already dead, then the smaller index.
                let (winner, loser) = if Some(root) == canon_child_local_idx {
                    (root, image_root)
                } else if Some(image_root) == canon_child_local_idx {
                    (image_root, root)
                } else if node.child_pruned[root] {
                    (root, image_root)
                } else if node.child_pruned[image_root] {
                    (image_root, root)
                } else if root < image_root {
                    (root, image_root)
                } else {
                    (image_root, root)
                };

                node.prune.parent[loser] = winner;
                node.prune.num_roots -= 1;
                node.child_pruned[loser] = true;
                if let Some(child) = node.children[loser] {
                    self.prune_queue.push(child);
                }
                trace!("child {} of {} joins class of {}", loser, a_t, winner);

                if node.prune.num_roots == 0 {
                    break 'generators;
                }
            }
            if tree.node(a_t).prune_data().num_roots() == 0 {
                break;
            }
        }

        while let Some(child) = self.prune_queue.pop() {
            tree.prune_subtree(child);
        }
        Flow::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::OrderedPartition;
    use std::collections::HashMap;

    /// Test adapter that reports exactly the generators queued per node.
    /// A node with an entry (even an empty one) reports `need_update`.
    #[derive(Default)]
    struct ScriptedGroup {
        queued: HashMap<TreeNodeId, Vec<Perm>>,
        stored: Vec<Perm>,
    }

    impl ScriptedGroup {
        fn queue(&mut self, node: TreeNodeId, auts: Vec<Perm>) {
            self.queued.insert(node, auts);
        }
    }

    impl AutomorphismGroup for ScriptedGroup {
        fn add_automorphism(&mut self, _tree: &SearchTree, _node: TreeNodeId, aut: &Perm) {
            self.stored.push(aut.clone());
        }

        fn need_update(&self, _tree: &SearchTree, node: TreeNodeId) -> bool {
            self.queued.contains_key(&node)
        }

        fn update(&mut self, _tree: &SearchTree, node: TreeNodeId, out: &mut Vec<Perm>) {
            out.clear();
            if let Some(auts) = self.queued.get_mut(&node) {
                out.append(auts);
            }
        }
    }

    fn perm(images: Vec<usize>) -> Perm {
        Perm::from_images(images).unwrap()
    }

    /// Root over four vertices, one target cell `[0, 4)`, four leaf
    /// children. Returns `(tree, root, leaves)`.
    fn flat_tree() -> (SearchTree, TreeNodeId, Vec<TreeNodeId>) {
        let mut tree = SearchTree::new();
        let pi = OrderedPartition::unit(4);
        let root = tree.create_root(pi.clone(), Some(0));
        let mut pruner = AutPruner::new();
        pruner.tree_create_node_begin(&mut tree, root);
        let leaves: Vec<_> = (0..4)
            .map(|i| {
                let child = tree.create_child(root, i, pi.individualize(i), None);
                pruner.tree_create_node_begin(&mut tree, child);
                child
            })
            .collect();
        (tree, root, leaves)
    }

    #[test]
    fn create_node_counts_children_on_the_parent() {
        let (tree, root, leaves) = flat_tree();
        assert_eq!(tree.node(root).prune_data().child_count(), 4);
        assert_eq!(tree.node(leaves[0]).prune_data().child_count(), 0);
    }

    #[test]
    fn leaf_automorphism_prunes_the_witnessing_branch() {
        let (mut tree, root, leaves) = flat_tree();
        let mut pruner = AutPruner::new();
        let mut group = ScriptedGroup::default();
        tree.set_canon_leaf(leaves[0]);

        let aut = perm(vec![1, 0, 2, 3]);
        pruner.automorphism_leaf(&mut tree, &mut group, leaves[1], &aut);

        assert_eq!(group.stored, vec![aut]);
        assert!(tree.node(leaves[1]).is_pruned());
        assert!(tree.node(root).child_pruned()[1]);
        assert!(!tree.node(leaves[0]).is_pruned());
        assert!(!tree.node(root).is_pruned());
        // The pruned node hangs directly below the two leaves' LCA.
        assert_eq!(
            tree.node(leaves[1]).parent().unwrap(),
            tree.lowest_common_ancestor(leaves[0], leaves[1])
        );
    }

    #[test]
    fn deep_leaf_automorphism_prunes_below_the_lca() {
        // Root -> {a, b}; each with one leaf below, so the LCA walk has to
        // level mismatching depths first.
        let mut tree = SearchTree::new();
        let mut pruner = AutPruner::new();
        let mut group = ScriptedGroup::default();
        let pi = OrderedPartition::unit(3);
        let root = tree.create_root(pi.clone(), Some(0));
        pruner.tree_create_node_begin(&mut tree, root);
        let a = tree.create_child(root, 0, pi.individualize(0), Some(1));
        pruner.tree_create_node_begin(&mut tree, a);
        let a_leaf = tree.create_child(a, 0, pi.individualize(0).individualize(1), None);
        pruner.tree_create_node_begin(&mut tree, a_leaf);
        let b = tree.create_child(root, 1, pi.individualize(1), Some(1));
        pruner.tree_create_node_begin(&mut tree, b);
        let b_leaf = tree.create_child(b, 0, pi.individualize(1).individualize(1), None);
        pruner.tree_create_node_begin(&mut tree, b_leaf);

        tree.set_canon_leaf(a_leaf);
        pruner.automorphism_leaf(&mut tree, &mut group, b_leaf, &perm(vec![1, 0, 2]));

        // The witnessing side's child of the LCA (the root) is pruned.
        assert_eq!(tree.lowest_common_ancestor(a_leaf, b_leaf), root);
        assert!(tree.node(b).is_pruned());
        assert!(tree.node(b_leaf).is_pruned());
        assert!(!tree.node(a).is_pruned());
        assert!(!tree.node(a_leaf).is_pruned());
    }

    #[test]
    fn implicit_automorphism_only_stores() {
        let (mut tree, root, leaves) = flat_tree();
        let mut pruner = AutPruner::new();
        let mut group = ScriptedGroup::default();
        tree.set_canon_leaf(leaves[0]);

        pruner.automorphism_implicit(&mut tree, &mut group, leaves[1], &perm(vec![1, 0, 2, 3]), 7);

        assert_eq!(group.stored.len(), 1);
        assert_eq!(tree.subtree_prunes(), 0);
        assert!(!tree.node(root).child_pruned().iter().any(|&bit| bit));
    }

    #[test]
    fn descend_merges_orbit_and_protects_the_canonical_child() {
        let (mut tree, root, leaves) = flat_tree();
        let mut pruner = AutPruner::new();
        let mut group = ScriptedGroup::default();
        tree.set_canon_leaf(leaves[2]);

        // (0 2) maps the canonical child's vertex; local 2 must win even
        // though 0 is the smaller index. (1 3) merges the remaining pair.
        group.queue(root, vec![perm(vec![2, 3, 0, 1])]);
        group.queue(leaves[2], Vec::new());
        pruner.tree_before_descend(&mut tree, &mut group, root);

        let node = tree.node(root);
        assert!(node.prune_data().is_materialized());
        assert_eq!(node.prune_data().num_roots(), 1);
        assert_eq!(node.child_pruned(), &[true, false, false, true]);
        assert!(tree.node(leaves[0]).is_pruned());
        assert!(tree.node(leaves[3]).is_pruned());
        assert!(!tree.node(leaves[2]).is_pruned());
    }

    #[test]
    fn already_pruned_root_absorbs_the_live_side() {
        let (mut tree, root, leaves) = flat_tree();
        let mut pruner = AutPruner::new();
        let mut group = ScriptedGroup::default();
        tree.set_canon_leaf(leaves[0]);

        // Child 3 dies via a leaf automorphism first.
        pruner.automorphism_leaf(&mut tree, &mut group, leaves[3], &perm(vec![3, 1, 2, 0]));
        assert!(tree.node(root).child_pruned()[3]);

        // (1 3): the dead class wins, the live child 1 is pruned with it.
        group.queue(root, vec![perm(vec![0, 3, 2, 1])]);
        group.queue(leaves[0], Vec::new());
        pruner.tree_before_descend(&mut tree, &mut group, root);

        assert!(tree.node(root).child_pruned()[1]);
        assert!(tree.node(leaves[1]).is_pruned());
        assert!(!tree.node(root).child_pruned()[0]);
        assert!(!tree.node(root).child_pruned()[2]);
    }

    #[test]
    fn num_roots_is_monotone_and_bits_never_clear() {
        let (mut tree, root, leaves) = flat_tree();
        let mut pruner = AutPruner::new();
        let mut group = ScriptedGroup::default();
        tree.set_canon_leaf(leaves[0]);

        let mut last_roots = tree.node(root).children().len() - 1;
        let mut pruned_so_far = vec![false; 4];
        for aut in [perm(vec![0, 2, 1, 3]), perm(vec![0, 1, 3, 2]), perm(vec![0, 2, 1, 3])] {
            group.queue(root, vec![aut]);
            group.queue(leaves[0], Vec::new());
            pruner.tree_before_descend(&mut tree, &mut group, root);

            let node = tree.node(root);
            assert!(node.prune_data().num_roots() <= last_roots);
            last_roots = node.prune_data().num_roots();
            for (bit, seen) in node.child_pruned().iter().zip(&pruned_so_far) {
                assert!(*bit || !*seen, "a pruned bit went back to false");
            }
            pruned_so_far = node.child_pruned().to_vec();
        }
        assert_eq!(last_roots, 1);
    }

    #[test]
    fn exhausted_union_find_short_circuits() {
        let (mut tree, root, leaves) = flat_tree();
        let mut pruner = AutPruner::new();
        let mut group = ScriptedGroup::default();
        tree.set_canon_leaf(leaves[0]);

        // The 4-cycle (0 1 2 3) collapses everything into one class.
        group.queue(root, vec![perm(vec![1, 2, 3, 0])]);
        group.queue(leaves[0], Vec::new());
        pruner.tree_before_descend(&mut tree, &mut group, root);
        assert_eq!(tree.node(root).prune_data().num_roots(), 0);
        assert_eq!(tree.node(root).child_pruned(), &[false, true, true, true]);

        // Further generators find nothing left to merge.
        group.queue(root, vec![perm(vec![0, 2, 1, 3])]);
        group.queue(leaves[0], Vec::new());
        pruner.tree_before_descend(&mut tree, &mut group, root);
        assert_eq!(tree.node(root).prune_data().num_roots(), 0);
    }

    #[test]
    fn surviving_siblings_are_unrelated_by_processed_generators() {
        let (mut tree, root, leaves) = flat_tree();
        let mut pruner = AutPruner::new();
        let mut group = ScriptedGroup::default();
        tree.set_canon_leaf(leaves[0]);

        let generators = [perm(vec![0, 2, 1, 3]), perm(vec![0, 1, 3, 2])];
        for aut in &generators {
            group.queue(root, vec![aut.clone()]);
            group.queue(leaves[0], Vec::new());
            pruner.tree_before_descend(&mut tree, &mut group, root);
        }

        // Any generator mapping one surviving child's vertex onto another's
        // would have merged them.
        let node = tree.node(root);
        let cell_begin = node.child_refiner_cell();
        let survivors: Vec<usize> = (0..node.children().len())
            .filter(|&i| !node.child_pruned()[i])
            .collect();
        assert!(survivors.len() >= 2);
        for &i in &survivors {
            for &j in &survivors {
                if i == j {
                    continue;
                }
                let v = node.pi().get(cell_begin + i);
                let w = node.pi().get(cell_begin + j);
                for aut in &generators {
                    assert_ne!(aut.image(v), w, "{} relates surviving siblings {} and {}", aut, i, j);
                }
            }
        }
    }

    #[test]
    fn nodes_without_children_are_skipped() {
        let mut tree = SearchTree::new();
        let mut pruner = AutPruner::new();
        let mut group = ScriptedGroup::default();
        let root = tree.create_root(OrderedPartition::unit(2), Some(0));
        pruner.tree_create_node_begin(&mut tree, root);

        group.queue(root, vec![perm(vec![1, 0])]);
        pruner.tree_before_descend(&mut tree, &mut group, root);
        // No child was ever created, so the engine does not even look at
        // the generators.
        assert!(!tree.node(root).prune_data().is_materialized());
        assert!(group.queued.get(&root).map_or(false, |q| !q.is_empty()));
    }

    #[test]
    #[should_panic(expected = "does not stabilize the target cell")]
    fn cell_escaping_generator_is_a_contract_violation() {
        let mut tree = SearchTree::new();
        let mut pruner = AutPruner::new();
        let mut group = ScriptedGroup::default();
        // Two cells: {0, 1} and {2, 3}; target cell is the first.
        let mut pi = OrderedPartition::unit(4);
        pi.split_cell(0, &[0, 1, 2, 3], &[2]);
        let root = tree.create_root(pi.clone(), Some(0));
        pruner.tree_create_node_begin(&mut tree, root);
        for i in 0..2 {
            let child = tree.create_child(root, i, pi.individualize(i), None);
            pruner.tree_create_node_begin(&mut tree, child);
        }
        tree.set_canon_leaf(tree.node(root).children()[0].unwrap());

        // (1 2) maps vertex 1 out of the target cell.
        group.queue(root, vec![perm(vec![0, 2, 1, 3])]);
        pruner.tree_before_descend(&mut tree, &mut group, root);
    }
}
