//! Group adapter seam between the search and a permutation-group store.
//!
//! The pruning engine does not implement group theory; it talks to an
//! [`AutomorphismGroup`] through three calls. `NoOpGroup` is the null
//! implementation for composition and baseline runs; [`GeneratorStore`] is
//! the reference implementation: a flat generator list filtered per node by
//! pointwise stabilization of the individualization prefix. Stronger
//! adapters (stabilizer chains in the style of Schreier–Sims) fit behind
//! the same trait.
//!
//! # Citations
//! - Seress, "Permutation Group Algorithms" (2003) — stabilizer chains and
//!   the adapter's contract vocabulary.

use crate::arena::TreeNodeId;
use crate::perm::Perm;
use crate::tree::SearchTree;
use std::collections::HashMap;

/// The contract the pruning engine requires from a group implementation.
///
/// For a tree node `T`, `update` must report exactly the generators of the
/// stabilizer at `T` that are new since the last `update` call at `T`, and
/// `need_update` must be a cheap over-approximation of "`update` would
/// report something". `update` must be safe to call with nothing pending
/// (it reports nothing).
pub trait AutomorphismGroup {
    /// Incorporates a discovered automorphism. Must be idempotent if `aut`
    /// is already known.
    fn add_automorphism(&mut self, tree: &SearchTree, node: TreeNodeId, aut: &Perm);

    /// Cheap predicate: true iff the stabilizer at `node` has (or may have)
    /// generators not yet reported there.
    fn need_update(&self, tree: &SearchTree, node: TreeNodeId) -> bool;

    /// Fills `out` with the generators newly added to the stabilizer at
    /// `node` since the last call there, then records them as consumed.
    /// `out` is cleared first.
    fn update(&mut self, tree: &SearchTree, node: TreeNodeId, out: &mut Vec<Perm>);

    /// All generators discovered so far, for result reporting. The default
    /// reports none.
    fn discovered_generators(&self) -> &[Perm] {
        &[]
    }
}

/// Null adapter: stores nothing, never requests work. With it attached, the
/// engine's descent hook returns immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NoOpGroup;

impl AutomorphismGroup for NoOpGroup {
    fn add_automorphism(&mut self, _tree: &SearchTree, _node: TreeNodeId, _aut: &Perm) {}

    fn need_update(&self, _tree: &SearchTree, _node: TreeNodeId) -> bool {
        false
    }

    fn update(&mut self, _tree: &SearchTree, _node: TreeNodeId, out: &mut Vec<Perm>) {
        out.clear();
    }
}

/// Reference adapter: a deduplicated generator list with per-node
/// consumption cursors.
///
/// The stabilizer at a node is approximated by filtering: a generator
/// belongs to it iff it fixes every vertex of the node's individualization
/// prefix pointwise. This is sound (everything reported is an automorphism
/// fixing the prefix) but not complete (products of generators are not
/// synthesized); at the root the filter is empty and every generator
/// qualifies.
#[derive(Debug, Clone, Default)]
pub struct GeneratorStore {
    generators: Vec<Perm>,
    /// Per node, how many of `generators` have been reported there.
    consumed: HashMap<TreeNodeId, usize>,
}

impl GeneratorStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored generators.
    pub fn len(&self) -> usize {
        self.generators.len()
    }

    /// Whether no generator has been stored.
    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }
}

impl AutomorphismGroup for GeneratorStore {
    fn add_automorphism(&mut self, _tree: &SearchTree, _node: TreeNodeId, aut: &Perm) {
        if aut.is_identity() {
            return;
        }
        if self.generators.iter().any(|known| known == aut) {
            return;
        }
        self.generators.push(aut.clone());
    }

    fn need_update(&self, _tree: &SearchTree, node: TreeNodeId) -> bool {
        self.consumed.get(&node).copied().unwrap_or(0) < self.generators.len()
    }

    fn update(&mut self, tree: &SearchTree, node: TreeNodeId, out: &mut Vec<Perm>) {
        out.clear();
        let start = self.consumed.get(&node).copied().unwrap_or(0);
        if start < self.generators.len() {
            let prefix = tree.individualized_prefix(node);
            for generator in &self.generators[start..] {
                if prefix.iter().all(|&v| generator.image(v) == v) {
                    out.push(generator.clone());
                }
            }
        }
        self.consumed.insert(node, self.generators.len());
    }

    fn discovered_generators(&self) -> &[Perm] {
        &self.generators
    }
}
