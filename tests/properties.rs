//! Randomized properties of the canonicalization search.
//!
//! These properties drive the whole pipeline on arbitrary small graphs:
//! canonical forms must be invariant under relabeling, pruning must change
//! neither the elected form nor visit more leaves than full enumeration,
//! and the reported labeling must actually produce the reported form.

use proptest::prelude::*;
use relabel::prelude::*;

/// An arbitrary multigraph on `2..8` vertices with up to 16 undirected
/// edges (self-loops and parallel edges included), plus a random
/// relabeling.
fn graph_and_relabeling() -> impl Strategy<Value = (usize, Vec<(usize, usize)>, Vec<usize>)> {
    (2usize..8).prop_flat_map(|n| {
        (
            Just(n),
            proptest::collection::vec((0..n, 0..n), 0..16),
            Just((0..n).collect::<Vec<usize>>()).prop_shuffle(),
        )
    })
}

fn undirected(n: usize, edges: &[(usize, usize)]) -> AdjGraph {
    AdjGraph::undirected(n, edges).expect("endpoints are generated in range")
}

fn apply_map(edges: &[(usize, usize)], map: &[usize]) -> Vec<(usize, usize)> {
    edges.iter().map(|&(u, v)| (map[u], map[v])).collect()
}

proptest! {
    #[test]
    fn canonical_form_is_relabeling_invariant((n, edges, map) in graph_and_relabeling()) {
        let base = undirected(n, &edges);
        let shuffled = undirected(n, &apply_map(&edges, &map));
        let lhs = canonical_form(&base).expect("identity view cannot fail");
        let rhs = canonical_form(&shuffled).expect("identity view cannot fail");
        prop_assert_eq!(&lhs.canonical_adjacency, &rhs.canonical_adjacency);
        prop_assert_eq!(lhs.canonical_key(), rhs.canonical_key());
    }

    #[test]
    fn directed_canonical_form_is_relabeling_invariant((n, arcs, map) in graph_and_relabeling()) {
        let base = AdjGraph::directed(n, &arcs).expect("endpoints are generated in range");
        let shuffled = AdjGraph::directed(n, &apply_map(&arcs, &map))
            .expect("endpoints are generated in range");
        let lhs = canonical_form(&base).expect("identity view cannot fail");
        let rhs = canonical_form(&shuffled).expect("identity view cannot fail");
        prop_assert_eq!(&lhs.canonical_adjacency, &rhs.canonical_adjacency);
    }

    #[test]
    fn pruning_preserves_the_elected_form((n, edges, _) in graph_and_relabeling()) {
        let graph = undirected(n, &edges);
        let pruned = Canonicalizer::new(&graph, CanonOptions::default())
            .expect("identity view cannot fail")
            .run();
        let full = Canonicalizer::new(&graph, CanonOptions { prune: false, ..CanonOptions::default() })
            .expect("identity view cannot fail")
            .run();
        prop_assert_eq!(&pruned.canonical_adjacency, &full.canonical_adjacency);
        prop_assert!(pruned.stats.leaves_visited <= full.stats.leaves_visited);
        prop_assert_eq!(full.stats.subtree_prunes, 0);
    }

    #[test]
    fn labeling_reproduces_the_reported_form((n, edges, _) in graph_and_relabeling()) {
        let graph = undirected(n, &edges);
        let result = canonical_form(&graph).expect("identity view cannot fail");
        let labeling = &result.labeling;
        let mut rebuilt = vec![Vec::new(); n];
        for v in 0..n {
            for &e in graph.out_edges(v) {
                rebuilt[labeling.image(v)].push(labeling.image(graph.target(e)));
            }
        }
        for row in &mut rebuilt {
            row.sort_unstable();
        }
        prop_assert_eq!(rebuilt, result.canonical_adjacency);
    }

    #[test]
    fn generators_preserve_adjacency((n, edges, _) in graph_and_relabeling()) {
        let graph = undirected(n, &edges);
        let result = canonical_form(&graph).expect("identity view cannot fail");
        // Multiset adjacency per vertex, relabeled through the generator,
        // must match the original graph.
        let mut adjacency = vec![Vec::new(); n];
        for &(u, v) in &edges {
            adjacency[u].push(v);
            adjacency[v].push(u);
        }
        for generator in &result.generators {
            for v in 0..n {
                let mut image_row: Vec<usize> =
                    adjacency[v].iter().map(|&u| generator.image(u)).collect();
                image_row.sort_unstable();
                let mut expected = adjacency[generator.image(v)].clone();
                expected.sort_unstable();
                prop_assert_eq!(image_row, expected);
            }
        }
    }
}
