//! Integration tests for the random graph generators.

use std::collections::HashSet;

use proptest::prelude::*;
use rstest::rstest;

use treepart::generate::{
    GraphEdgeProb, GraphGenerator, GraphPrefAttach, TreeFat, TreePrefAttach, TreeRandAttach, WeightRanges,
};
use treepart::io::{read_tree, write_tree};
use treepart::util::testing::init_test_setup;
use treepart::GenerateError;

// ============================================================
// Tree output properties
// ============================================================

/// Parses the text emitted for a generated tree into header and edge triples.
fn emitted(node_count: usize, seed: u64) -> (Vec<usize>, Vec<(usize, usize, u64)>) {
    let graph = TreeRandAttach::new(node_count).generate(seed).unwrap();
    let mut out = Vec::new();
    write_tree(&mut out, &graph.root_at(0).unwrap()).unwrap();
    let text = String::from_utf8(out).unwrap();

    let mut lines = text.lines();
    let header = lines
        .next()
        .unwrap()
        .split_whitespace()
        .map(|t| t.parse().unwrap())
        .collect();
    let edges = lines
        .map(|line| {
            let t: Vec<&str> = line.split_whitespace().collect();
            (t[0].parse().unwrap(), t[1].parse().unwrap(), t[2].parse().unwrap())
        })
        .collect();
    (header, edges)
}

proptest! {
    #[test]
    fn given_any_node_count_when_emitting_tree_then_output_is_a_rooted_tree(
        node_count in 1usize..200,
        seed in any::<u64>(),
    ) {
        let (header, edges) = emitted(node_count, seed);

        prop_assert_eq!(header, vec![node_count, 0]);
        prop_assert_eq!(edges.len(), node_count - 1);

        let targets: HashSet<usize> = edges.iter().map(|&(_, to, _)| to).collect();
        prop_assert_eq!(targets.len(), edges.len());
        prop_assert!(!targets.contains(&0));
        prop_assert!(edges.iter().all(|&(from, to, _)| from < node_count && to < node_count));
        prop_assert!(edges.iter().all(|&(_, _, w)| (1..=100).contains(&w)));
    }

    #[test]
    fn given_emitted_tree_when_read_back_then_connected_and_rooted_at_zero(
        node_count in 1usize..120,
        seed in any::<u64>(),
    ) {
        let graph = TreeRandAttach::new(node_count).generate(seed).unwrap();
        let mut out = Vec::new();
        write_tree(&mut out, &graph.root_at(0).unwrap()).unwrap();

        let file = read_tree(out.as_slice(), false).unwrap();

        prop_assert_eq!(file.root, 0);
        prop_assert!(file.graph.is_tree());
        prop_assert_eq!(file.graph, graph);
    }

    #[test]
    fn given_max_degree_when_generating_tree_then_degrees_stay_within(
        node_count in 2usize..150,
        max_degree in 2usize..6,
        seed in any::<u64>(),
    ) {
        let graph = TreeRandAttach::new(node_count)
            .with_max_degree(max_degree)
            .generate(seed)
            .unwrap();
        prop_assert!((0..node_count).all(|v| graph.degree(v) <= max_degree));
        prop_assert!(graph.is_tree());
    }
}

// ============================================================
// Determinism and parameters
// ============================================================

#[rstest]
#[case::rand_attach(Box::new(TreeRandAttach::new(40)) as Box<dyn GraphGenerator>)]
#[case::pref_attach(Box::new(TreePrefAttach::new(40)) as Box<dyn GraphGenerator>)]
#[case::fat(Box::new(TreeFat::new(40, 1..=3)) as Box<dyn GraphGenerator>)]
#[case::graph_pref_attach(Box::new(GraphPrefAttach::new(40, 80)) as Box<dyn GraphGenerator>)]
#[case::edge_prob(Box::new(GraphEdgeProb::new(40, 0.1)) as Box<dyn GraphGenerator>)]
fn given_same_seed_when_generating_then_same_graph(#[case] generator: Box<dyn GraphGenerator>) {
    init_test_setup();
    // Arrange / Act
    let first = generator.generate(7).unwrap();
    let second = generator.generate(7).unwrap();

    // Assert
    assert_eq!(first, second);
    assert_eq!(first.node_count(), 40);
}

#[rstest]
#[case::rand_attach(Box::new(TreeRandAttach::new(60)) as Box<dyn GraphGenerator>)]
#[case::pref_attach(Box::new(TreePrefAttach::new(60)) as Box<dyn GraphGenerator>)]
#[case::fat(Box::new(TreeFat::new(60, 2..=4)) as Box<dyn GraphGenerator>)]
fn given_tree_generator_when_generating_then_result_is_tree(#[case] generator: Box<dyn GraphGenerator>) {
    let graph = generator.generate(3).unwrap();
    assert!(graph.is_tree());
}

#[rstest]
#[case::rand_attach(Box::new(TreeRandAttach::new(0)) as Box<dyn GraphGenerator>)]
#[case::pref_attach(Box::new(TreePrefAttach::new(0)) as Box<dyn GraphGenerator>)]
#[case::fat(Box::new(TreeFat::new(0, 1..=2)) as Box<dyn GraphGenerator>)]
#[case::edge_prob(Box::new(GraphEdgeProb::new(0, 0.5)) as Box<dyn GraphGenerator>)]
fn given_zero_nodes_when_generating_then_rejected(#[case] generator: Box<dyn GraphGenerator>) {
    assert!(matches!(
        generator.generate(0),
        Err(GenerateError::InvalidParameter(_))
    ));
}

#[test]
fn given_custom_weight_ranges_when_generating_then_weights_respect_them() {
    // Arrange
    let weights = WeightRanges {
        node: 2..=4,
        edge: 10..=12,
    };

    // Act
    let graph = TreeRandAttach::new(50).with_weights(weights).generate(11).unwrap();

    // Assert
    assert!(graph.edges().all(|(_, _, w)| (10..=12).contains(&w)));
    assert!((0..50).all(|v| (2..=4).contains(&graph.node_weight(v).unwrap())));
}

#[test]
fn given_fat_tree_with_fixed_child_count_when_generating_then_levels_are_full() {
    let graph = TreeFat::new(7, 2..=2).generate(5).unwrap();
    let rooted = graph.root_at(0).unwrap();
    assert_eq!(rooted.depth(), 3);
    assert_eq!(rooted.leaf_nodes().len(), 4);
}
