//! Graph representations consumed by the canonicalization search.
//!
//! This module provides:
//! - `Digraph`: the minimal directed-graph surface the search needs
//!   (vertices as `0..n`, edges as dense [`EdgeId`]s with endpoints).
//! - `AdjGraph`: an adjacency-list implementation with optional in-edge
//!   lists and helpers for building undirected graphs as symmetric digraphs.
//! - [`ordered::OrderedGraph`]: the read-only view that fixes every
//!   iteration order from a vertex index map.

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod ordered;

pub use ordered::{edge_id_order, OrderedGraph, OrderedViewError};

/// Dense edge identifier.
///
/// The inner value is an index into the owning graph's edge table, assigned
/// in insertion order.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(u32);

impl EdgeId {
    /// Creates an `EdgeId` from a raw `u32`.
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

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EdgeId({})", self.0)
    }
}

/// Error type for graph construction failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// An endpoint refers to a vertex outside `[0, num_vertices)`.
    VertexOutOfRange {
        /// The offending vertex.
        vertex: usize,
        /// The number of vertices in the graph.
        num_vertices: usize,
    },
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphError::VertexOutOfRange { vertex, num_vertices } => {
                write!(f, "vertex {} out of range (graph has {} vertices)", vertex, num_vertices)
            }
        }
    }
}

impl std::error::Error for GraphError {}

/// A finite directed graph with vertices `0..n` and dense edge ids.
///
/// Parallel edges and self-loops are allowed. Adjacency is exposed as
/// slices so the ordered view can re-sort without an iterator zoo.
pub trait Digraph {
    /// Number of vertices.
    fn num_vertices(&self) -> usize;

    /// Number of edges.
    fn num_edges(&self) -> usize;

    /// Source vertex of `e`.
    fn source(&self, e: EdgeId) -> usize;

    /// Target vertex of `e`.
    fn target(&self, e: EdgeId) -> usize;

    /// Out-edges of `v` in the representation's own order.
    fn out_edges(&self, v: usize) -> &[EdgeId];

    /// In-edges of `v`, if the representation tracks them.
    fn in_edges(&self, v: usize) -> Option<&[EdgeId]> {
        let _ = v;
        None
    }

    /// Out-degree of `v`.
    fn out_degree(&self, v: usize) -> usize {
        self.out_edges(v).len()
    }

    /// In-degree of `v`, if in-edges are tracked.
    fn in_degree(&self, v: usize) -> Option<usize> {
        self.in_edges(v).map(<[EdgeId]>::len)
    }
}

/// Adjacency-list digraph with optional in-edge lists.
///
/// Undirected graphs are represented as symmetric digraphs: every
/// undirected edge contributes one arc in each direction, so degree and
/// automorphism structure carry over unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjGraph {
    /// `(source, target)` per edge id.
    endpoints: Vec<(u32, u32)>,
    /// Out-edge lists in insertion order.
    out: Vec<Vec<EdgeId>>,
    /// In-edge lists in insertion order, when tracked.
    ins: Option<Vec<Vec<EdgeId>>>,
}

impl AdjGraph {
    /// Creates an empty graph on `n` vertices without in-edge tracking.
    pub fn new(n: usize) -> Self {
        Self {
            endpoints: Vec::new(),
            out: vec![Vec::new(); n],
            ins: None,
        }
    }

    /// Creates an empty graph on `n` vertices with in-edge tracking, so the
    /// ordered view can materialize in-edge order.
    pub fn with_in_edges(n: usize) -> Self {
        Self {
            endpoints: Vec::new(),
            out: vec![Vec::new(); n],
            ins: Some(vec![Vec::new(); n]),
        }
    }

    /// Builds a directed graph from an arc list.
    pub fn directed(n: usize, arcs: &[(usize, usize)]) -> Result<Self, GraphError> {
        let mut graph = Self::new(n);
        for &(u, v) in arcs {
            graph.add_edge(u, v)?;
        }
        Ok(graph)
    }

    /// Builds an undirected graph from an edge list (one arc per direction).
    pub fn undirected(n: usize, edges: &[(usize, usize)]) -> Result<Self, GraphError> {
        let mut graph = Self::new(n);
        for &(u, v) in edges {
            graph.add_edge(u, v)?;
            graph.add_edge(v, u)?;
        }
        Ok(graph)
    }

    /// Adds an arc `u -> v` and returns its id.
    pub fn add_edge(&mut self, u: usize, v: usize) -> Result<EdgeId, GraphError> {
        let n = self.out.len();
        for vertex in [u, v] {
            if vertex >= n {
                return Err(GraphError::VertexOutOfRange { vertex, num_vertices: n });
            }
        }
        let id = EdgeId(self.endpoints.len() as u32);
        self.endpoints.push((u as u32, v as u32));
        self.out[u].push(id);
        if let Some(ins) = &mut self.ins {
            ins[v].push(id);
        }
        Ok(id)
    }
}

impl Digraph for AdjGraph {
    fn num_vertices(&self) -> usize {
        self.out.len()
    }

    fn num_edges(&self) -> usize {
        self.endpoints.len()
    }

    fn source(&self, e: EdgeId) -> usize {
        self.endpoints[e.0 as usize].0 as usize
    }

    fn target(&self, e: EdgeId) -> usize {
        self.endpoints[e.0 as usize].1 as usize
    }

    fn out_edges(&self, v: usize) -> &[EdgeId] {
        &self.out[v]
    }

    fn in_edges(&self, v: usize) -> Option<&[EdgeId]> {
        self.ins.as_ref().map(|ins| ins[v].as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directed_arcs_and_degrees() {
        let g = AdjGraph::directed(3, &[(0, 1), (0, 2), (2, 1)]).unwrap();
        assert_eq!(g.num_vertices(), 3);
        assert_eq!(g.num_edges(), 3);
        assert_eq!(g.out_degree(0), 2);
        assert_eq!(g.out_degree(1), 0);
        assert_eq!(g.source(EdgeId::new(2)), 2);
        assert_eq!(g.target(EdgeId::new(2)), 1);
        assert_eq!(g.in_edges(1), None);
    }

    #[test]
    fn undirected_doubles_arcs() {
        let g = AdjGraph::undirected(3, &[(0, 1), (1, 2)]).unwrap();
        assert_eq!(g.num_edges(), 4);
        assert_eq!(g.out_degree(1), 2);
    }

    #[test]
    fn in_edge_tracking() {
        let mut g = AdjGraph::with_in_edges(3);
        g.add_edge(0, 2).unwrap();
        g.add_edge(1, 2).unwrap();
        assert_eq!(g.in_degree(2), Some(2));
        assert_eq!(g.in_degree(0), Some(0));
    }

    #[test]
    fn rejects_out_of_range_vertices() {
        let mut g = AdjGraph::new(2);
        let err = g.add_edge(0, 5).unwrap_err();
        assert_eq!(err, GraphError::VertexOutOfRange { vertex: 5, num_vertices: 2 });
    }
}
