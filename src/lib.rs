//! Relabel: canonical labeling of finite graphs with automorphism-based
//! search-tree pruning.
//!
//! This crate implements an individualization-refinement canonicalization
//! search, providing:
//! - A canonical labeling per graph: isomorphic graphs map to identical
//!   canonical adjacencies, so isomorphism testing is equality and graph
//!   collections can be indexed by a hash of the form.
//! - A generating set of the graph's automorphism group, discovered as a
//!   by-product of the search.
//! - The pruning engine that makes the search feasible: discovered
//!   automorphisms collapse orbit-equivalent siblings through per-node
//!   union-find structures, while the elected canonical leaf's path is kept
//!   alive.
//!
//! # Architecture
//!
//! The search driver ([`Canonicalizer`]) owns a tree of refinement nodes
//! and walks it depth-first. The pruning engine ([`AutPruner`]) is attached
//! as a visitor-style collaborator and consumes two events: an automorphism
//! discovered at a leaf, and an imminent descent into a child. Group
//! bookkeeping sits behind the [`AutomorphismGroup`] trait; the crate ships
//! a null adapter and a flat generator store, and stabilizer-chain
//! implementations fit behind the same seam. All neighbor traversal runs
//! through [`OrderedGraph`], a view that fixes iteration order from a
//! vertex index map.
//!
//! # Citations
//! - McKay, "Practical graph isomorphism" (1981)
//! - McKay & Piperno, "Practical graph isomorphism, II" (2014)
//! - Junttila & Kaski, "Engineering an efficient canonical labeling tool"
//!   (2007)
//!
//! # Example
//!
//! ```
//! use relabel::prelude::*;
//!
//! // The same 4-cycle under two labelings.
//! let square = AdjGraph::undirected(4, &[(0, 1), (1, 2), (2, 3), (3, 0)]).unwrap();
//! let relabeled = AdjGraph::undirected(4, &[(0, 2), (2, 1), (1, 3), (3, 0)]).unwrap();
//!
//! let lhs = canonical_form(&square).unwrap();
//! let rhs = canonical_form(&relabeled).unwrap();
//! assert_eq!(lhs.canonical_adjacency, rhs.canonical_adjacency);
//! assert_eq!(lhs.canonical_key(), rhs.canonical_key());
//! ```

pub mod arena;
pub mod fingerprint;
pub mod graph;
pub mod group;
pub mod partition;
pub mod perm;
pub mod pruner;
pub mod refine;
pub mod search;
pub mod tree;

pub use crate::arena::TreeNodeId;
pub use crate::fingerprint::{canonical_key, CanonicalKey, HashValue};
pub use crate::graph::{edge_id_order, AdjGraph, Digraph, EdgeId, GraphError, OrderedGraph, OrderedViewError};
pub use crate::group::{AutomorphismGroup, GeneratorStore, NoOpGroup};
pub use crate::partition::OrderedPartition;
pub use crate::perm::{Perm, PermError};
pub use crate::pruner::{AutPruner, PruneData};
pub use crate::refine::Refiner;
pub use crate::search::{canonical_form, CanonOptions, CanonResult, Canonicalizer, SearchStats};
pub use crate::tree::{SearchTree, TreeNode};

/// Prelude for convenient usage.
pub mod prelude {
    pub use crate::arena::TreeNodeId;
    pub use crate::fingerprint::{canonical_key, CanonicalKey, HashValue};
    pub use crate::graph::{edge_id_order, AdjGraph, Digraph, EdgeId, GraphError, OrderedGraph, OrderedViewError};
    pub use crate::group::{AutomorphismGroup, GeneratorStore, NoOpGroup};
    pub use crate::partition::OrderedPartition;
    pub use crate::perm::{Perm, PermError};
    pub use crate::pruner::AutPruner;
    pub use crate::search::{canonical_form, CanonOptions, CanonResult, Canonicalizer, SearchStats};
    pub use crate::tree::{SearchTree, TreeNode};
}
