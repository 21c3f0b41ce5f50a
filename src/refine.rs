//! Equitable partition refinement.
//!
//! `Refiner` refines an ordered partition until every cell is equitable:
//! all vertices of a cell see the same multiset of cells across their
//! neighbors. Refinement is the workhorse between individualizations; the
//! search calls it once per tree node.
//!
//! # Determinism
//! - Cells are processed in position order; a pass re-snapshots nothing, so
//!   splits apply in a fixed sequence.
//! - A vertex's signature is the sorted multiset of the cell-begin
//!   positions of its out-neighbors (and of its in-neighbors when the view
//!   materializes them). Signatures are cell-structure data only, which
//!   makes the refinement equivariant under automorphisms that stabilize
//!   the current cells — the property the pruning engine's target-cell
//!   assertion relies on.
//! - Subcells are ordered by signature; ties keep position order.
//!
//! # Citations
//! - McKay, "Practical graph isomorphism" (1981) — equitable refinement in
//!   canonical labeling.

use crate::graph::{Digraph, OrderedGraph};
use crate::partition::OrderedPartition;

/// Signature of one cell member: neighbor cells seen along out-edges and,
/// optionally, along in-edges.
type Signature = (Vec<usize>, Vec<usize>);

/// Refines ordered partitions to equitability. Holds reusable scratch.
#[derive(Debug, Default)]
pub struct Refiner {
    members: Vec<(Signature, usize)>,
    order: Vec<usize>,
    splits: Vec<usize>,
}

impl Refiner {
    /// Creates a refiner with empty scratch buffers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Refines `pi` in place to the coarsest equitable partition refining
    /// it, traversing neighbors through `view`.
    pub fn refine<G: Digraph>(&mut self, view: &OrderedGraph<'_, G>, pi: &mut OrderedPartition) {
        loop {
            let mut changed = false;
            // Snapshot the cells of this pass; splitting subdivides in
            // place, so entries for cells not yet processed stay valid.
            let cells: Vec<(usize, usize)> =
                pi.cells().filter(|&(begin, end)| end - begin > 1).collect();
            for (begin, end) in cells {
                if self.split_one_cell(view, pi, begin, end) {
                    changed = true;
                }
            }
            if !changed {
                return;
            }
        }
    }

    /// Splits the cell `[begin, end)` by member signatures. Returns whether
    /// anything split.
    fn split_one_cell<G: Digraph>(
        &mut self,
        view: &OrderedGraph<'_, G>,
        pi: &mut OrderedPartition,
        begin: usize,
        end: usize,
    ) -> bool {
        self.members.clear();
        for pos in begin..end {
            let v = pi.get(pos);
            let mut out_sig: Vec<usize> = view
                .adjacent_vertices(v)
                .map(|u| pi.cell_begin(pi.get_inverse(u)))
                .collect();
            out_sig.sort_unstable();
            let in_sig = if view.has_in_edges() {
                let mut sig: Vec<usize> = view
                    .inv_adjacent_vertices(v)
                    .map(|u| pi.cell_begin(pi.get_inverse(u)))
                    .collect();
                sig.sort_unstable();
                sig
            } else {
                Vec::new()
            };
            self.members.push(((out_sig, in_sig), v));
        }

        // Stable: equal signatures keep their position order.
        self.members.sort_by(|a, b| a.0.cmp(&b.0));

        self.splits.clear();
        for i in 1..self.members.len() {
            if self.members[i].0 != self.members[i - 1].0 {
                self.splits.push(i);
            }
        }
        if self.splits.is_empty() {
            return false;
        }

        self.order.clear();
        self.order.extend(self.members.iter().map(|member| member.1));
        pi.split_cell(begin, &self.order, &self.splits);
        true
    }
}
