//! The canonicalization search driver.
//!
//! `Canonicalizer` runs the individualization-refinement search over a
//! graph: refine, pick a target cell, individualize each of its vertices in
//! turn, and recurse. Leaves carry discrete partitions; the
//! lexicographically smallest permuted adjacency among them is elected
//! canonical, and every later leaf with an equal form witnesses an
//! automorphism. The driver raises the pruning engine's events in the
//! order the engine requires: node creation once per node,
//! `tree_before_descend` before every child pick, and `automorphism_leaf`
//! at equal-form leaves.
//!
//! # Citations
//! - McKay & Piperno, "Practical graph isomorphism, II" (2014) — the
//!   search-tree shape and leaf election.

use crate::graph::{edge_id_order, Digraph, OrderedGraph, OrderedViewError};
use crate::group::{AutomorphismGroup, GeneratorStore};
use crate::partition::OrderedPartition;
use crate::perm::Perm;
use crate::pruner::AutPruner;
use crate::refine::Refiner;
use crate::arena::TreeNodeId;
use crate::tree::SearchTree;
use log::debug;

/// Options of one canonicalization run.
#[derive(Debug, Clone, Copy)]
pub struct CanonOptions {
    /// Materialize in-edge order in the view and use in-neighbor
    /// signatures during refinement. Requires a graph that tracks
    /// in-edges.
    pub materialize_in_edges: bool,
    /// Attach the pruning engine. Disabled, the search enumerates every
    /// leaf; the elected canonical form is the same either way, but no
    /// automorphisms reach the group adapter, so the result reports no
    /// generators.
    pub prune: bool,
}

impl Default for CanonOptions {
    fn default() -> Self {
        Self { materialize_in_edges: false, prune: true }
    }
}

/// Counters of one canonicalization run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Tree nodes created.
    pub nodes_created: usize,
    /// Leaves whose form was computed.
    pub leaves_visited: usize,
    /// Automorphisms reported at equal-form leaves.
    pub automorphisms_found: usize,
    /// Canonical-leaf elections (including the first).
    pub canon_elections: usize,
    /// Subtree prunes that newly pruned something.
    pub subtree_prunes: usize,
}

/// Result of a canonicalization run.
#[derive(Debug, Clone)]
pub struct CanonResult {
    /// The canonical labeling: vertex to canonical position.
    pub labeling: Perm,
    /// Per canonical position, the sorted canonical positions of the
    /// out-neighbors. Equal for two graphs iff they are isomorphic.
    pub canonical_adjacency: Vec<Vec<usize>>,
    /// Generators of the discovered automorphism group.
    pub generators: Vec<Perm>,
    /// Run counters.
    pub stats: SearchStats,
}

impl CanonResult {
    /// The hashable indexing token of the canonical form.
    pub fn canonical_key(&self) -> crate::fingerprint::CanonicalKey {
        crate::fingerprint::canonical_key(&self.canonical_adjacency)
    }
}

/// The elected leaf's labeling and form.
struct BestLeaf {
    /// Canonical position to vertex.
    vert_at: Vec<usize>,
    /// Vertex to canonical position.
    pos_of: Vec<usize>,
    /// Permuted sorted adjacency.
    form: Vec<Vec<usize>>,
}

/// First non-singleton cell of `pi`, if any.
fn select_target_cell(pi: &OrderedPartition) -> Option<usize> {
    pi.cells().find(|&(begin, end)| end - begin > 1).map(|(begin, _)| begin)
}

/// One canonicalization run over a borrowed graph.
pub struct Canonicalizer<'g, G: Digraph, A: AutomorphismGroup> {
    view: OrderedGraph<'g, G>,
    tree: SearchTree,
    pruner: AutPruner,
    refiner: Refiner,
    group: A,
    options: CanonOptions,
    best: Option<BestLeaf>,
    stats: SearchStats,
}

impl<'g, G: Digraph> Canonicalizer<'g, G, GeneratorStore> {
    /// Creates a run with the reference generator-store adapter.
    pub fn new(graph: &'g G, options: CanonOptions) -> Result<Self, OrderedViewError> {
        Self::with_group(graph, GeneratorStore::new(), options)
    }
}

impl<'g, G: Digraph, A: AutomorphismGroup> Canonicalizer<'g, G, A> {
    /// Creates a run with a caller-supplied group adapter.
    pub fn with_group(graph: &'g G, group: A, options: CanonOptions) -> Result<Self, OrderedViewError> {
        let n = graph.num_vertices();
        let view = OrderedGraph::new(
            graph,
            (0..n).collect(),
            edge_id_order,
            options.materialize_in_edges,
        )?;
        Ok(Self {
            view,
            tree: SearchTree::new(),
            pruner: AutPruner::new(),
            refiner: Refiner::new(),
            group,
            options,
            best: None,
            stats: SearchStats::default(),
        })
    }

    /// Runs the search to completion and returns the canonical form.
    pub fn run(mut self) -> CanonResult {
        let n = self.view.num_vertices();
        if n == 0 {
            return CanonResult {
                labeling: Perm::identity(0),
                canonical_adjacency: Vec::new(),
                generators: Vec::new(),
                stats: self.stats,
            };
        }

        let mut pi = OrderedPartition::unit(n);
        self.refiner.refine(&self.view, &mut pi);
        let target = select_target_cell(&pi);
        let root = self.tree.create_root(pi, target);
        self.stats.nodes_created += 1;
        if self.options.prune {
            self.pruner.tree_create_node_begin(&mut self.tree, root);
        }
        self.descend(root);

        let best = self.best.take().expect("a non-empty graph has at least one leaf");
        self.stats.subtree_prunes = self.tree.subtree_prunes();
        CanonResult {
            labeling: Perm::from_images(best.pos_of)
                .expect("a discrete partition is a bijection"),
            canonical_adjacency: best.form,
            generators: self.group.discovered_generators().to_vec(),
            stats: self.stats,
        }
    }

    fn descend(&mut self, node: TreeNodeId) {
        if self.tree.node(node).is_leaf() {
            self.handle_leaf(node);
            return;
        }
        let width = self.tree.node(node).children().len();
        for local_idx in 0..width {
            // The node itself may have been pruned while a child was
            // explored; stop touching it then.
            if self.tree.node(node).is_pruned() {
                break;
            }
            if self.options.prune {
                self.pruner.tree_before_descend(&mut self.tree, &mut self.group, node);
                if self.tree.node(node).is_pruned() {
                    break;
                }
                if self.tree.node(node).child_pruned()[local_idx] {
                    continue;
                }
            }

            let parent = self.tree.node(node);
            let position = parent.child_refiner_cell() + local_idx;
            let mut child_pi = parent.pi().individualize(position);
            self.refiner.refine(&self.view, &mut child_pi);
            let target = select_target_cell(&child_pi);

            let child = self.tree.create_child(node, local_idx, child_pi, target);
            self.stats.nodes_created += 1;
            if self.options.prune {
                self.pruner.tree_create_node_begin(&mut self.tree, child);
            }
            self.descend(child);
        }
    }

    fn handle_leaf(&mut self, leaf: TreeNodeId) {
        self.stats.leaves_visited += 1;

        let (vert_at, pos_of, form) = {
            let pi = self.tree.node(leaf).pi();
            let n = pi.len();
            let mut vert_at = vec![0; n];
            let mut pos_of = vec![0; n];
            for pos in 0..n {
                let v = pi.get(pos);
                vert_at[pos] = v;
                pos_of[v] = pos;
            }
            let mut form = Vec::with_capacity(n);
            for &v in &vert_at {
                let mut row: Vec<usize> =
                    self.view.adjacent_vertices(v).map(|u| pos_of[u]).collect();
                row.sort_unstable();
                form.push(row);
            }
            (vert_at, pos_of, form)
        };

        let verdict = match &self.best {
            None => std::cmp::Ordering::Less,
            Some(best) => form.cmp(&best.form),
        };
        match verdict {
            std::cmp::Ordering::Less => {
                debug!("canonical leaf elected at {}", leaf);
                self.stats.canon_elections += 1;
                self.tree.set_canon_leaf(leaf);
                self.best = Some(BestLeaf { vert_at, pos_of, form });
            }
            std::cmp::Ordering::Equal => {
                let best = self.best.as_ref().expect("equal verdict implies an elected leaf");
                let images: Vec<usize> = (0..pos_of.len())
                    .map(|v| best.vert_at[pos_of[v]])
                    .collect();
                let aut = Perm::from_images(images)
                    .expect("composition of two labelings is a bijection");
                debug!("equal-form leaf at {} witnesses {}", leaf, aut);
                self.stats.automorphisms_found += 1;
                if self.options.prune {
                    self.pruner.automorphism_leaf(&mut self.tree, &mut self.group, leaf, &aut);
                }
            }
            std::cmp::Ordering::Greater => {}
        }
    }
}

/// Canonicalizes `graph` with default options and the reference adapter.
///
/// Fails only if the graph is malformed for view construction; the default
/// identity index map over `0..n` cannot fail, so errors surface only from
/// option combinations (requesting in-edges on a graph without them).
pub fn canonical_form<G: Digraph>(graph: &G) -> Result<CanonResult, OrderedViewError> {
    Ok(Canonicalizer::new(graph, CanonOptions::default())?.run())
}
