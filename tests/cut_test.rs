//! Integration tests for the signature dynamic program.

use std::collections::BTreeMap;

use proptest::prelude::*;
use rstest::rstest;

use treepart::cut::{lower_component_size_bounds, upper_component_size_bounds, Signature, SignatureTable};
use treepart::generate::{GraphGenerator, TreeRandAttach, WeightRanges};
use treepart::rational::{self, Rational};
use treepart::util::testing::init_test_setup;
use treepart::{Graph, PartitionError, Weight};

fn eps(num: i64, den: i64) -> Rational {
    rational::ratio(num, den).unwrap()
}

fn random_tree(node_count: usize, seed: u64) -> Graph {
    TreeRandAttach::new(node_count)
        .with_weights(WeightRanges {
            node: 1..=1,
            edge: 1..=20,
        })
        .generate(seed)
        .unwrap()
}

fn table_of(graph: &Graph, eps: &Rational, part_cnt: usize) -> SignatureTable {
    graph.root_at(0).unwrap().to_level_tree().cut(eps, part_cnt).unwrap()
}

/// Component sizes after removing the edges selected by `mask`.
fn component_sizes(node_count: usize, edges: &[(usize, usize, Weight)], mask: u32) -> Vec<usize> {
    let mut parent: Vec<usize> = (0..node_count).collect();
    fn find(parent: &mut Vec<usize>, x: usize) -> usize {
        let mut root = x;
        while parent[root] != root {
            root = parent[root];
        }
        parent[x] = root;
        root
    }
    for (i, &(u, v, _)) in edges.iter().enumerate() {
        if mask & (1 << i) == 0 {
            let (ru, rv) = (find(&mut parent, u), find(&mut parent, v));
            parent[ru] = rv;
        }
    }
    let mut sizes: BTreeMap<usize, usize> = BTreeMap::new();
    for v in 0..node_count {
        *sizes.entry(find(&mut parent, v)).or_default() += 1;
    }
    sizes.into_values().collect()
}

/// Minimum cut cost per signature over every subset of tree edges.
fn brute_force(graph: &Graph, table: &SignatureTable) -> BTreeMap<Signature, Weight> {
    let edges: Vec<_> = graph.edges().collect();
    let mut best: BTreeMap<Signature, Weight> = BTreeMap::new();
    'masks: for mask in 0u32..(1 << edges.len()) {
        let mut counts = vec![0u32; table.upper_bounds().len()];
        for size in component_sizes(graph.node_count(), &edges, mask) {
            match table.class_of(size) {
                Some(class) => counts[class] += 1,
                None => continue 'masks,
            }
        }
        let cost = edges
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << i) != 0)
            .map(|(_, &(_, _, w))| w)
            .sum();
        let entry = best.entry(Signature(counts)).or_insert(cost);
        *entry = (*entry).min(cost);
    }
    best
}

// ============================================================
// Size bounds
// ============================================================

#[rstest]
#[case(eps(1, 2), 100, 6, vec![9, 13, 20, 26])]
#[case(eps(1, 3), 100, 7, vec![5, 7, 9, 12, 16, 21])]
#[case(eps(2, 5), 80, 6, vec![6, 8, 11, 16, 20])]
#[case(eps(1, 2), 4, 2, vec![1, 2, 3, 4])]
fn given_parameters_when_computing_bounds_then_match_reference(
    #[case] eps: Rational,
    #[case] node_cnt: usize,
    #[case] part_cnt: usize,
    #[case] expected: Vec<usize>,
) {
    let upper = upper_component_size_bounds(&eps, node_cnt, part_cnt).unwrap();
    let lower = lower_component_size_bounds(&eps, node_cnt, part_cnt).unwrap();

    assert_eq!(upper, expected);
    assert_eq!(lower.len(), upper.len());
    assert_eq!(lower[0], 1);
    assert_eq!(&lower[1..], &upper[..upper.len() - 1]);
}

#[rstest]
#[case::zero_parts(eps(1, 2), 0)]
#[case::zero_eps(eps(0, 1), 2)]
#[case::negative_eps(eps(-1, 2), 2)]
fn given_invalid_parameters_when_computing_bounds_then_rejected(#[case] eps: Rational, #[case] part_cnt: usize) {
    let result = upper_component_size_bounds(&eps, 10, part_cnt);
    assert!(matches!(
        result,
        Err(PartitionError::InvalidPartCount(_)) | Err(PartitionError::InvalidImbalance(_))
    ));
}

// ============================================================
// Dynamic program
// ============================================================

#[test]
fn given_star_when_cutting_then_leaves_close_individually() {
    init_test_setup();
    // Arrange: center 0 with four leaves
    let mut graph = Graph::new(5);
    for leaf in 1..5 {
        graph.set_edge_weight(0, leaf, leaf as Weight).unwrap();
    }
    let table = table_of(&graph, &eps(1, 2), 1);

    // Act
    let signatures = table.root_signatures();

    // Assert: the cheapest signature cuts nothing, costs grow from there
    assert_eq!(signatures[0].1, 0);
    assert!(signatures.windows(2).all(|w| w[0].1 <= w[1].1));
    let all_cut = signatures
        .iter()
        .find(|(sig, _)| sig.component_count() == 5)
        .expect("every leaf cut off");
    assert_eq!(all_cut.1, 1 + 2 + 3 + 4);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn given_small_tree_when_cutting_then_matches_exhaustive_search(
        node_count in 1usize..=9,
        part_cnt in 1usize..=4,
        eps_den in 1i64..=4,
        seed in any::<u64>(),
    ) {
        let graph = random_tree(node_count, seed);
        let table = table_of(&graph, &eps(1, eps_den), part_cnt);

        let expected = brute_force(&graph, &table);
        let actual: BTreeMap<Signature, Weight> = table.root_signatures().into_iter().collect();

        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn given_root_signature_when_recovering_cut_then_cost_and_sizes_agree(
        node_count in 1usize..=40,
        part_cnt in 1usize..=5,
        seed in any::<u64>(),
    ) {
        let graph = random_tree(node_count, seed);
        let table = table_of(&graph, &eps(1, 2), part_cnt);

        for (signature, cost) in table.root_signatures().into_iter().take(10) {
            let cut_edges = table.cut_edges(&signature).unwrap();
            let cut_cost: Weight = cut_edges
                .iter()
                .map(|&(child, parent)| graph.edge_weight(child, parent).unwrap())
                .sum();
            prop_assert_eq!(cut_cost, cost);

            let components = table.components(&cut_edges);
            prop_assert_eq!(components.len(), cut_edges.len() + 1);
            prop_assert_eq!(components.iter().map(Vec::len).sum::<usize>(), node_count);

            let mut counts = vec![0u32; signature.len()];
            for component in &components {
                counts[table.class_of(component.len()).unwrap()] += 1;
            }
            prop_assert_eq!(Signature(counts), signature);
        }
    }
}
