//! Index-ordered graph view.
//!
//! `OrderedGraph` is a read-only view on an underlying [`Digraph`] in which
//! iteration through vertices, out-edges, in-edges, and adjacent vertices is
//! ordered according to a given index map over the vertices. The search
//! builds one view per canonicalization; every neighbor traversal during
//! refinement and leaf comparison goes through it, which is what makes the
//! whole search deterministic.
//!
//! Edge-list iteration is not supported. Parallel edges are ordered by a
//! tie-breaker supplied at construction.

use super::{Digraph, EdgeId};
use std::cmp::Ordering;
use std::fmt;

/// Error type for ordered-view construction failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderedViewError {
    /// The index map is not a bijection of `[0, n)`.
    IndexMapNotBijective {
        /// An index that is out of range or repeated.
        value: usize,
    },
    /// In-edge materialization was requested but the underlying graph does
    /// not track in-edges.
    InEdgesUnavailable,
}

impl fmt::Display for OrderedViewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderedViewError::IndexMapNotBijective { value } => {
                write!(f, "index map is not a bijection: index {} out of range or repeated", value)
            }
            OrderedViewError::InEdgesUnavailable => {
                write!(f, "underlying graph does not track in-edges")
            }
        }
    }
}

impl std::error::Error for OrderedViewError {}

/// Tie-breaker that orders parallel edges by their id.
///
/// Edge ids are assigned in insertion order, so this is deterministic for a
/// fixed construction sequence. Simple graphs never reach the tie-breaker.
pub fn edge_id_order(lhs: EdgeId, rhs: EdgeId) -> Ordering {
    lhs.cmp(&rhs)
}

/// Per-vertex sorted adjacency of the view.
#[derive(Debug, Clone)]
struct OrderedAdj {
    /// The vertex stored at this index slot.
    v: usize,
    /// Out-edges sorted by `(idx(target), tie_breaker)`.
    out_edges: Vec<EdgeId>,
    /// In-edges sorted by `(idx(source), tie_breaker)`; empty unless
    /// materialized.
    in_edges: Vec<EdgeId>,
}

/// A graph view whose iteration orders follow a vertex index map.
///
/// Pure view: only the constructor allocates.
#[derive(Debug)]
pub struct OrderedGraph<'g, G: Digraph> {
    graph: &'g G,
    /// Vertex to index.
    idx: Vec<usize>,
    /// Slot per index value.
    data: Vec<OrderedAdj>,
    materialized_in_edges: bool,
}

impl<'g, G: Digraph> OrderedGraph<'g, G> {
    /// Constructs the view.
    ///
    /// `idx` must be a bijection `vertex -> [0, n)`. `edge_less` breaks ties
    /// between parallel edges (use [`edge_id_order`] for simple graphs).
    /// With `with_in_edges` set, in-edge lists are materialized and sorted
    /// as well; the underlying graph must track in-edges.
    pub fn new<F>(
        graph: &'g G,
        idx: Vec<usize>,
        mut edge_less: F,
        with_in_edges: bool,
    ) -> Result<Self, OrderedViewError>
    where
        F: FnMut(EdgeId, EdgeId) -> Ordering,
    {
        let n = graph.num_vertices();
        if idx.len() != n {
            return Err(OrderedViewError::IndexMapNotBijective { value: idx.len() });
        }
        let mut seen = vec![false; n];
        for &i in &idx {
            if i >= n || seen[i] {
                return Err(OrderedViewError::IndexMapNotBijective { value: i });
            }
            seen[i] = true;
        }
        if with_in_edges && n > 0 && graph.in_edges(0).is_none() {
            return Err(OrderedViewError::InEdgesUnavailable);
        }

        let mut data: Vec<OrderedAdj> = (0..n)
            .map(|_| OrderedAdj { v: 0, out_edges: Vec::new(), in_edges: Vec::new() })
            .collect();
        for v in 0..n {
            let slot = &mut data[idx[v]];
            slot.v = v;
            slot.out_edges = graph.out_edges(v).to_vec();
            slot.out_edges.sort_by(|&lhs, &rhs| {
                idx[graph.target(lhs)]
                    .cmp(&idx[graph.target(rhs)])
                    .then_with(|| edge_less(lhs, rhs))
            });
            if with_in_edges {
                slot.in_edges = graph.in_edges(v).expect("in-edge tracking checked above").to_vec();
                slot.in_edges.sort_by(|&lhs, &rhs| {
                    idx[graph.source(lhs)]
                        .cmp(&idx[graph.source(rhs)])
                        .then_with(|| edge_less(lhs, rhs))
                });
            }
        }

        Ok(Self { graph, idx, data, materialized_in_edges: with_in_edges })
    }

    /// The adapted graph.
    #[inline]
    pub fn graph(&self) -> &'g G {
        self.graph
    }

    /// The index of vertex `v` under the stored map.
    #[inline]
    pub fn index_of(&self, v: usize) -> usize {
        self.idx[v]
    }

    /// Whether in-edge lists were materialized.
    #[inline]
    pub fn has_in_edges(&self) -> bool {
        self.materialized_in_edges
    }

    /// Number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.data.len()
    }

    /// Number of edges (pass-through).
    #[inline]
    pub fn num_edges(&self) -> usize {
        self.graph.num_edges()
    }

    /// Source vertex of `e` (pass-through).
    #[inline]
    pub fn source(&self, e: EdgeId) -> usize {
        self.graph.source(e)
    }

    /// Target vertex of `e` (pass-through).
    #[inline]
    pub fn target(&self, e: EdgeId) -> usize {
        self.graph.target(e)
    }

    /// Vertices in increasing index order.
    pub fn vertices(&self) -> impl Iterator<Item = usize> + '_ {
        self.data.iter().map(|adj| adj.v)
    }

    /// Out-edges of `v` sorted by `(idx(target), tie_breaker)`.
    #[inline]
    pub fn out_edges(&self, v: usize) -> &[EdgeId] {
        &self.data[self.idx[v]].out_edges
    }

    /// In-edges of `v` sorted by `(idx(source), tie_breaker)`.
    ///
    /// # Panics
    /// Panics if in-edges were not materialized.
    #[inline]
    pub fn in_edges(&self, v: usize) -> &[EdgeId] {
        assert!(self.materialized_in_edges, "in-edges were not materialized");
        &self.data[self.idx[v]].in_edges
    }

    /// Out-degree of `v`.
    #[inline]
    pub fn out_degree(&self, v: usize) -> usize {
        self.out_edges(v).len()
    }

    /// In-degree of `v`.
    ///
    /// # Panics
    /// Panics if in-edges were not materialized.
    #[inline]
    pub fn in_degree(&self, v: usize) -> usize {
        self.in_edges(v).len()
    }

    /// Degree of `v`: out-degree plus in-degree when in-edges are
    /// materialized, out-degree alone otherwise.
    pub fn degree(&self, v: usize) -> usize {
        if self.materialized_in_edges {
            self.out_degree(v) + self.in_degree(v)
        } else {
            self.out_degree(v)
        }
    }

    /// Targets of the out-edges of `v`, in out-edge order.
    pub fn adjacent_vertices(&self, v: usize) -> impl Iterator<Item = usize> + '_ {
        self.out_edges(v).iter().map(move |&e| self.graph.target(e))
    }

    /// Sources of the in-edges of `v`, in in-edge order.
    ///
    /// # Panics
    /// Panics if in-edges were not materialized.
    pub fn inv_adjacent_vertices(&self, v: usize) -> impl Iterator<Item = usize> + '_ {
        self.in_edges(v).iter().map(move |&e| self.graph.source(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::AdjGraph;

    #[test]
    fn vertices_follow_index_map() {
        let g = AdjGraph::directed(4, &[(0, 1)]).unwrap();
        // idx reverses the vertex order
        let view = OrderedGraph::new(&g, vec![3, 2, 1, 0], edge_id_order, false).unwrap();
        assert_eq!(view.vertices().collect::<Vec<_>>(), vec![3, 2, 1, 0]);
        assert_eq!(view.index_of(0), 3);
    }

    #[test]
    fn out_edges_sorted_by_target_index() {
        let g = AdjGraph::directed(4, &[(0, 3), (0, 1), (0, 2)]).unwrap();
        let view = OrderedGraph::new(&g, vec![0, 1, 2, 3], edge_id_order, false).unwrap();
        assert_eq!(view.adjacent_vertices(0).collect::<Vec<_>>(), vec![1, 2, 3]);

        // flipping the index order of 1 and 3 flips the iteration order
        let view = OrderedGraph::new(&g, vec![0, 3, 2, 1], edge_id_order, false).unwrap();
        assert_eq!(view.adjacent_vertices(0).collect::<Vec<_>>(), vec![3, 2, 1]);
    }

    #[test]
    fn parallel_edges_use_tie_breaker() {
        let mut g = AdjGraph::new(2);
        let first = g.add_edge(0, 1).unwrap();
        let second = g.add_edge(0, 1).unwrap();
        let view = OrderedGraph::new(&g, vec![0, 1], edge_id_order, false).unwrap();
        assert_eq!(view.out_edges(0), &[first, second]);

        // reversed tie-breaker reverses the parallel pair
        let view = OrderedGraph::new(&g, vec![0, 1], |a, b| b.cmp(&a), false).unwrap();
        assert_eq!(view.out_edges(0), &[second, first]);
    }

    #[test]
    fn in_edges_sorted_by_source_index() {
        let mut g = AdjGraph::with_in_edges(4);
        g.add_edge(2, 0).unwrap();
        g.add_edge(3, 0).unwrap();
        g.add_edge(1, 0).unwrap();
        let view = OrderedGraph::new(&g, vec![0, 1, 2, 3], edge_id_order, true).unwrap();
        assert_eq!(view.inv_adjacent_vertices(0).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(view.in_degree(0), 3);
        assert_eq!(view.degree(0), 3);
    }

    #[test]
    fn rejects_non_bijective_index_map() {
        let g = AdjGraph::new(3);
        let err = OrderedGraph::new(&g, vec![0, 0, 1], edge_id_order, false).unwrap_err();
        assert_eq!(err, OrderedViewError::IndexMapNotBijective { value: 0 });
        let err = OrderedGraph::new(&g, vec![0, 1, 5], edge_id_order, false).unwrap_err();
        assert_eq!(err, OrderedViewError::IndexMapNotBijective { value: 5 });
    }

    #[test]
    fn rejects_in_edges_without_tracking() {
        let g = AdjGraph::directed(2, &[(0, 1)]).unwrap();
        let err = OrderedGraph::new(&g, vec![0, 1], edge_id_order, true).unwrap_err();
        assert_eq!(err, OrderedViewError::InEdgesUnavailable);
    }
}
