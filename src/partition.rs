use std::collections::{BTreeMap, HashMap};

use tracing::{debug, info, instrument};

use crate::arena::RootedTree;
use crate::cut::{Signature, SignatureTable};
use crate::errors::{GraphError, PartitionError, PartitionResult};
use crate::graph::{sum_weights, Graph, NodeId, Weight};
use crate::pack::Packing;
use crate::rational::{self, Rational};

/// Assignment of every node to one of at most `part_cnt` parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    /// `assignment[node]` is the part of `node`
    pub assignment: Vec<usize>,
    pub part_cnt: usize,
    /// Weight of the tree edges cut by the chosen signature
    pub tree_cut_cost: Weight,
    /// Weight of the edges between different parts, on the tree or, after
    /// [`partition_graph`], on the graph. Components packed into the same
    /// part can make this smaller than `tree_cut_cost` on the tree.
    pub cut_cost: Weight,
    /// Node weight of each part; equals [`Partition::part_sizes`] for unit weights
    pub part_weights: Vec<usize>,
    pub signature: Signature,
}

impl Partition {
    /// Nodes of each part, in ascending order.
    pub fn parts(&self) -> Vec<Vec<NodeId>> {
        let mut parts = vec![Vec::new(); self.part_cnt];
        for (node, &part) in self.assignment.iter().enumerate() {
            if let Some(nodes) = parts.get_mut(part) {
                nodes.push(node);
            }
        }
        parts
    }

    pub fn part_sizes(&self) -> Vec<usize> {
        self.parts().iter().map(Vec::len).collect()
    }
}

/// Largest allowed part weight: `floor((1+eps) * ceil(n/k))` for total node weight `n`.
pub fn part_capacity(eps: &Rational, total_weight: usize, part_cnt: usize) -> PartitionResult<usize> {
    if part_cnt == 0 {
        return Err(PartitionError::InvalidPartCount(part_cnt));
    }
    let n_div_k = rational::ceil_to_usize(&rational::ratio_usize(total_weight, part_cnt))?;
    Ok(rational::floor_to_usize(
        &(rational::one_plus(eps) * rational::from_usize(n_div_k)),
    )?)
}

/// Partitions a tree into at most `part_cnt` parts whose node weight is at most
/// [`part_capacity`], with minimum cut cost among the packable signatures.
#[instrument(level = "debug", skip(tree), fields(nodes = tree.len(), eps = %rational::display(eps)))]
pub fn partition_tree(tree: &RootedTree, part_cnt: usize, eps: &Rational) -> PartitionResult<Partition> {
    let node_cnt = tree.len();
    if node_cnt == 0 {
        return Err(GraphError::Empty.into());
    }
    if let Some((_, node)) = tree.iter().find(|(_, node)| node.data.id >= node_cnt) {
        return Err(PartitionError::Mismatch(format!(
            "node id {} outside 0..{}",
            node.data.id, node_cnt
        )));
    }

    let table = tree.to_level_tree().cut(eps, part_cnt)?;
    let capacity = part_capacity(eps, table.total_weight(), part_cnt)?;
    let weights = table.tree().weights_by_id();
    let lower_bounds = table.lower_bounds();
    debug!("part capacity {}, lower bounds {:?}", capacity, lower_bounds);

    for (signature, cost) in table.root_signatures() {
        if !lower_bounds_fit(&signature, &lower_bounds, capacity, part_cnt) {
            continue;
        }
        if let Some(assignment) = pack_signature(&table, &weights, &signature, capacity, part_cnt)? {
            info!("signature {} packs with cut cost {}", signature, cost);
            let cut_cost = sum_weights(
                tree.edges()
                    .into_iter()
                    .filter(|&(parent, child, _)| assignment[parent] != assignment[child])
                    .map(|(_, _, weight)| weight),
            )?;
            let mut part_weights = vec![0; part_cnt];
            for (node, &part) in assignment.iter().enumerate() {
                if let Some(total) = part_weights.get_mut(part) {
                    *total += weights.get(&node).copied().unwrap_or(0);
                }
            }
            return Ok(Partition {
                assignment,
                part_cnt,
                tree_cut_cost: cost,
                cut_cost,
                part_weights,
                signature,
            });
        }
    }
    Err(PartitionError::Infeasible { part_cnt })
}

/// Partitions `tree`, a spanning tree of `graph`, and prices the result on `graph`.
#[instrument(level = "debug", skip(graph, tree), fields(nodes = graph.node_count()))]
pub fn partition_graph(
    graph: &Graph,
    tree: &RootedTree,
    part_cnt: usize,
    eps: &Rational,
) -> PartitionResult<Partition> {
    if tree.len() != graph.node_count() {
        return Err(PartitionError::Mismatch(format!(
            "tree has {} nodes, graph has {}",
            tree.len(),
            graph.node_count()
        )));
    }
    for (_, node) in tree.iter() {
        let weight = graph.node_weight(node.data.id)?;
        if weight != node.data.weight {
            return Err(PartitionError::Mismatch(format!(
                "node {} weighs {} in the tree and {} in the graph",
                node.data.id, node.data.weight, weight
            )));
        }
    }
    let mut partition = partition_tree(tree, part_cnt, eps)?;
    partition.cut_cost = graph.cut_cost(&partition.assignment)?;
    Ok(partition)
}

/// Large components can never be smaller than their class lower bound, so a
/// signature whose lower bounds need more than `part_cnt` bins is hopeless.
fn lower_bounds_fit(signature: &Signature, lower_bounds: &[usize], capacity: usize, part_cnt: usize) -> bool {
    let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
    for (class, &count) in signature.0.iter().enumerate().skip(1) {
        if count > 0 {
            *counts.entry(lower_bounds[class]).or_default() += count as usize;
        }
    }
    let mut packing = Packing::new(capacity, capacity);
    matches!(packing.pack_perfect(&counts), Some(bins) if bins <= part_cnt)
}

/// Packs the real components of `signature`; None if they need too many bins.
fn pack_signature(
    table: &SignatureTable,
    weights: &HashMap<NodeId, usize>,
    signature: &Signature,
    capacity: usize,
    part_cnt: usize,
) -> PartitionResult<Option<Vec<usize>>> {
    let cut_edges = table.cut_edges(signature)?;
    let components = table.components(&cut_edges);

    let mut large: BTreeMap<usize, usize> = BTreeMap::new();
    let mut small: BTreeMap<usize, usize> = BTreeMap::new();
    let mut by_size: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (idx, component) in components.iter().enumerate() {
        let size = component
            .iter()
            .map(|node| weights.get(node).copied().unwrap_or(0))
            .sum();
        match table.class_of(size) {
            Some(0) => *small.entry(size).or_default() += 1,
            _ => *large.entry(size).or_default() += 1,
        }
        by_size.entry(size).or_default().push(idx);
    }

    let mut packing = Packing::new(capacity, capacity);
    if packing.pack_perfect(&large).is_none() {
        return Ok(None);
    }
    packing.pack_first_fit(&small);
    if packing.bin_count() > part_cnt {
        debug!(
            "signature {} needs {} bins for {} parts",
            signature,
            packing.bin_count(),
            part_cnt
        );
        return Ok(None);
    }

    let bins = packing
        .expand(&by_size)
        .ok_or_else(|| PartitionError::UnknownSignature(signature.0.clone()))?;
    let mut assignment = vec![0; table.node_count()];
    for (part, bin) in bins.iter().enumerate() {
        for &component in bin {
            for &node in &components[component] {
                assignment[node] = part;
            }
        }
    }
    Ok(Some(assignment))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(weights: &[Weight]) -> Graph {
        let mut g = Graph::new(weights.len() + 1);
        for (i, &w) in weights.iter().enumerate() {
            g.set_edge_weight(i, i + 1, w).unwrap();
        }
        g
    }

    fn half() -> Rational {
        rational::ratio(1, 2).unwrap()
    }

    #[test]
    fn test_part_capacity() {
        assert_eq!(part_capacity(&half(), 4, 2).unwrap(), 3);
        assert_eq!(part_capacity(&half(), 100, 6).unwrap(), 25);
        assert!(part_capacity(&half(), 4, 0).is_err());
    }

    #[test]
    fn test_path_of_four_splits_at_cheapest_edge() {
        let g = path(&[5, 1, 5]);
        let tree = g.root_at(0).unwrap();
        let partition = partition_tree(&tree, 2, &half()).unwrap();
        assert_eq!(partition.tree_cut_cost, 1);
        assert_eq!(partition.cut_cost, 1);
        assert_eq!(partition.assignment[0], partition.assignment[1]);
        assert_eq!(partition.assignment[2], partition.assignment[3]);
        assert_ne!(partition.assignment[1], partition.assignment[2]);
    }

    #[test]
    fn test_single_part_keeps_tree_whole() {
        let g = path(&[3, 3]);
        let tree = g.root_at(0).unwrap();
        let partition = partition_tree(&tree, 1, &half()).unwrap();
        assert_eq!(partition.tree_cut_cost, 0);
        assert_eq!(partition.part_sizes(), vec![3]);
    }

    #[test]
    fn test_graph_cut_cost_counts_non_tree_edges() {
        let mut g = path(&[5, 1, 5]);
        g.set_edge_weight(0, 3, 2).unwrap();
        let tree = g.minimum_spanning_tree().unwrap().root_at(0).unwrap();
        let partition = partition_graph(&g, &tree, 2, &half()).unwrap();
        assert_eq!(partition.cut_cost, g.cut_cost(&partition.assignment).unwrap());
        assert!(partition.part_sizes().iter().all(|&s| s <= 3));
    }

    #[test]
    fn test_cut_cost_overflow_is_an_error() {
        let g = path(&[Weight::MAX, Weight::MAX]);
        let tree = g.root_at(0).unwrap();
        assert_eq!(
            partition_tree(&tree, 3, &half()),
            Err(PartitionError::Graph(GraphError::WeightOverflow))
        );
    }

    #[test]
    fn test_parts_balance_node_weight() {
        // 0 - 1 - 2 - 3 with node 0 weighing 3: total 6, capacity 4.
        let mut g = path(&[1, 1, 1]);
        g.set_node_weight(0, 3).unwrap();
        let tree = g.root_at(0).unwrap();
        let partition = partition_tree(&tree, 2, &rational::ratio(1, 3).unwrap()).unwrap();
        assert!(partition.part_weights.iter().all(|&w| w <= 4));
        assert_eq!(partition.part_weights.iter().sum::<usize>(), 6);
        assert_eq!(partition.assignment[2], partition.assignment[3]);
        assert_ne!(partition.assignment[0], partition.assignment[2]);
    }

    #[test]
    fn test_node_weights_of_tree_and_graph_must_agree() {
        let mut g = path(&[1, 1]);
        let tree = g.root_at(0).unwrap();
        g.set_node_weight(1, 4).unwrap();
        assert!(matches!(
            partition_graph(&g, &tree, 2, &half()),
            Err(PartitionError::Mismatch(_))
        ));
    }

    #[test]
    fn test_mismatched_tree_is_rejected() {
        let g = path(&[1, 1, 1]);
        let tree = path(&[1]).root_at(0).unwrap();
        assert!(matches!(
            partition_graph(&g, &tree, 2, &half()),
            Err(PartitionError::Mismatch(_))
        ));
    }
}
