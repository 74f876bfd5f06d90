//! Signature dynamic program for balanced tree cuts.
//!
//! For every node `v` (in level order) the table holds, for each frontier
//! size, the cheapest cut cost of every reachable signature over `v`, its left
//! siblings and all their subtrees. The frontier size is the node weight in
//! closed components; a signature counts closed components per size class.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;

use itertools::Itertools;
use tracing::{debug, instrument, trace};

use crate::errors::{GraphError, PartitionError, PartitionResult};
use crate::graph::{NodeId, Weight};
use crate::level_tree::{LevelTree, Position};
use crate::rational::{self, Rational};

/// Number of closed components per size class.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Signature(pub Vec<u32>);

impl Signature {
    pub fn zero(len: usize) -> Self {
        Self(vec![0; len])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn component_count(&self) -> u32 {
        self.0.iter().sum()
    }

    fn plus(&self, other: &Signature) -> Signature {
        Signature(self.0.iter().zip(&other.0).map(|(a, b)| a + b).collect())
    }

    fn with_component(mut self, class: usize) -> Signature {
        self.0[class] += 1;
        self
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.iter().join(" "))
    }
}

/// Upper bounds of the component size classes.
///
/// With `m = ceil(n/k)` the bounds are `ceil(eps·m·(1+eps)^i)` while below
/// `(1+eps)·m`, followed by `floor((1+eps)·m + 1)`.
pub fn upper_component_size_bounds(
    eps: &Rational,
    node_cnt: usize,
    part_cnt: usize,
) -> PartitionResult<Vec<usize>> {
    validate(eps, part_cnt)?;
    let n_div_k =
        rational::from_usize(rational::ceil_to_usize(&rational::ratio_usize(node_cnt, part_cnt))?);
    let growth = rational::one_plus(eps);
    let upper_bound = &growth * &n_div_k;

    let mut bounds = Vec::new();
    let mut current = eps * &n_div_k;
    while current < upper_bound {
        bounds.push(rational::ceil_to_usize(&current)?);
        current = &current * &growth;
    }
    bounds.push(rational::floor_to_usize(&(upper_bound + rational::from_usize(1)))?);
    Ok(bounds)
}

/// Lower bounds of the size classes: `1` followed by all but the last upper bound.
pub fn lower_component_size_bounds(
    eps: &Rational,
    node_cnt: usize,
    part_cnt: usize,
) -> PartitionResult<Vec<usize>> {
    let upper = upper_component_size_bounds(eps, node_cnt, part_cnt)?;
    Ok(std::iter::once(1)
        .chain(upper[..upper.len() - 1].iter().copied())
        .collect())
}

fn validate(eps: &Rational, part_cnt: usize) -> PartitionResult<()> {
    if part_cnt == 0 {
        return Err(PartitionError::InvalidPartCount(part_cnt));
    }
    if !rational::is_positive(eps) {
        return Err(PartitionError::InvalidImbalance(rational::display(eps)));
    }
    Ok(())
}

/// Table key: frontier size and signature.
type Key = (usize, Signature);

#[derive(Debug, Clone)]
struct Entry {
    cost: Weight,
    left: Option<Key>,
    child: Option<Key>,
    /// The component containing this node is closed here.
    closes: bool,
}

type SignatureMap = BTreeMap<usize, BTreeMap<Signature, Entry>>;

fn insert_min(map: &mut SignatureMap, (frontier, signature): Key, entry: Entry) {
    let slot = map.entry(frontier).or_default();
    match slot.get(&signature) {
        Some(existing) if existing.cost <= entry.cost => {}
        _ => {
            slot.insert(signature, entry);
        }
    }
}

/// Result of the dynamic program over one tree.
#[derive(Debug)]
pub struct SignatureTable {
    tree: LevelTree,
    total_weight: usize,
    part_cnt: usize,
    eps: Rational,
    upper_bounds: Vec<usize>,
    table: Vec<Vec<SignatureMap>>,
}

impl LevelTree {
    /// Runs the signature dynamic program for `part_cnt` parts and imbalance `eps`.
    #[instrument(level = "debug", skip(self), fields(nodes = self.node_count(), eps = %rational::display(eps)))]
    pub fn cut(self, eps: &Rational, part_cnt: usize) -> PartitionResult<SignatureTable> {
        if self.node_count() == 0 {
            return Err(GraphError::Empty.into());
        }
        let total_weight = self.total_weight()?;
        let upper_bounds = upper_component_size_bounds(eps, total_weight, part_cnt)?;
        let max_size = *upper_bounds.last().unwrap_or(&1);
        let class_of = |size: usize| upper_bounds.iter().position(|&b| size < b);
        let zero = Signature::zero(upper_bounds.len());
        debug!("component size bounds: {:?}", upper_bounds);

        let mut table: Vec<Vec<SignatureMap>> = self
            .levels
            .iter()
            .map(|l| vec![SignatureMap::new(); l.len()])
            .collect();

        let mut zero_map = SignatureMap::new();
        zero_map.entry(0).or_default().insert(
            zero.clone(),
            Entry {
                cost: 0,
                left: None,
                child: None,
                closes: false,
            },
        );

        for level in (1..self.levels.len()).rev() {
            for idx in 0..self.levels[level].len() {
                let node = &self.levels[level][idx];
                let mut node_sigs = SignatureMap::new();
                {
                    let left_sigs = if node.has_left_sibling {
                        &table[level][idx - 1]
                    } else {
                        &zero_map
                    };
                    let child_sigs = match node.rightmost_child() {
                        Some(child) => &table[level + 1][child],
                        None => &zero_map,
                    };

                    for (&left_frontier, left_by_sig) in left_sigs {
                        for (&child_frontier, child_by_sig) in child_sigs {
                            // Size of the open component containing this node.
                            let open = node.subtree_weight - child_frontier;
                            let class = (open < max_size).then(|| class_of(open)).flatten();

                            for (left_sig, left_entry) in left_by_sig {
                                for (child_sig, child_entry) in child_by_sig {
                                    let left_key = node
                                        .has_left_sibling
                                        .then(|| (left_frontier, left_sig.clone()));
                                    let child_key = node
                                        .has_children()
                                        .then(|| (child_frontier, child_sig.clone()));
                                    let frontier = left_frontier + child_frontier;
                                    let cost = left_entry
                                        .cost
                                        .checked_add(child_entry.cost)
                                        .ok_or(GraphError::WeightOverflow)?;
                                    let signature = left_sig.plus(child_sig);

                                    if let Some(class) = class {
                                        let closed_cost = cost
                                            .checked_add(node.parent_edge_weight)
                                            .ok_or(GraphError::WeightOverflow)?;
                                        insert_min(
                                            &mut node_sigs,
                                            (frontier + open, signature.clone().with_component(class)),
                                            Entry {
                                                cost: closed_cost,
                                                left: left_key.clone(),
                                                child: child_key.clone(),
                                                closes: true,
                                            },
                                        );
                                    }
                                    insert_min(
                                        &mut node_sigs,
                                        (frontier, signature),
                                        Entry {
                                            cost,
                                            left: left_key,
                                            child: child_key,
                                            closes: false,
                                        },
                                    );
                                }
                            }
                        }
                    }
                }
                trace!(
                    "node {} at ({}, {}): {} frontier sizes",
                    node.id,
                    level,
                    idx,
                    node_sigs.len()
                );
                table[level][idx] = node_sigs;
            }
        }

        // The root closes its own component; only complete covers survive.
        let mut root_sigs = SignatureMap::new();
        if let Some(root) = self.root() {
            let child_sigs = match root.rightmost_child() {
                Some(child) => &table[1][child],
                None => &zero_map,
            };
            for (&child_frontier, child_by_sig) in child_sigs {
                let open = total_weight - child_frontier;
                if open >= max_size {
                    continue;
                }
                let Some(class) = class_of(open) else {
                    continue;
                };
                for (child_sig, child_entry) in child_by_sig {
                    insert_min(
                        &mut root_sigs,
                        (total_weight, child_sig.clone().with_component(class)),
                        Entry {
                            cost: child_entry.cost,
                            left: None,
                            child: root
                                .has_children()
                                .then(|| (child_frontier, child_sig.clone())),
                            closes: true,
                        },
                    );
                }
            }
        }
        table[0][0] = root_sigs;

        debug!(
            "root signatures: {}",
            table[0][0].get(&total_weight).map_or(0, BTreeMap::len)
        );
        Ok(SignatureTable {
            tree: self,
            total_weight,
            part_cnt,
            eps: eps.clone(),
            upper_bounds,
            table,
        })
    }
}

impl SignatureTable {
    pub fn tree(&self) -> &LevelTree {
        &self.tree
    }

    pub fn part_cnt(&self) -> usize {
        self.part_cnt
    }

    pub fn eps(&self) -> &Rational {
        &self.eps
    }

    pub fn upper_bounds(&self) -> &[usize] {
        &self.upper_bounds
    }

    pub fn lower_bounds(&self) -> Vec<usize> {
        std::iter::once(1)
            .chain(self.upper_bounds[..self.upper_bounds.len() - 1].iter().copied())
            .collect()
    }

    pub fn node_count(&self) -> usize {
        self.tree.node_count()
    }

    pub fn total_weight(&self) -> usize {
        self.total_weight
    }

    /// Size class of a component of node weight `size`.
    pub fn class_of(&self, size: usize) -> Option<usize> {
        self.upper_bounds.iter().position(|&b| size < b)
    }

    /// Root signatures with their minimum cut cost, cheapest first.
    pub fn root_signatures(&self) -> Vec<(Signature, Weight)> {
        self.table[0][0]
            .get(&self.total_weight)
            .map(|sigs| {
                sigs.iter()
                    .map(|(sig, entry)| (sig.clone(), entry.cost))
                    .sorted_by(|(sa, ca), (sb, cb)| ca.cmp(cb).then_with(|| sa.cmp(sb)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Minimum cost stored for `signature` at frontier `frontier` of the node at `pos`.
    pub fn cost_at(&self, (level, idx): Position, frontier: usize, signature: &Signature) -> Option<Weight> {
        self.table[level][idx]
            .get(&frontier)
            .and_then(|sigs| sigs.get(signature))
            .map(|e| e.cost)
    }

    /// Recovers the cut edges realizing a root signature, as `(child, parent)` pairs.
    #[instrument(level = "debug", skip(self), fields(signature = %signature))]
    pub fn cut_edges(&self, signature: &Signature) -> PartitionResult<BTreeSet<(NodeId, NodeId)>> {
        let root_key = (self.total_weight, signature.clone());
        if self.cost_at((0, 0), root_key.0, &root_key.1).is_none() {
            return Err(PartitionError::UnknownSignature(signature.0.clone()));
        }

        let mut cut_edges = BTreeSet::new();
        let mut stack: Vec<(Position, Key)> = vec![((0, 0), root_key)];
        while let Some(((level, idx), (frontier, sig))) = stack.pop() {
            let entry = self.table[level][idx]
                .get(&frontier)
                .and_then(|sigs| sigs.get(&sig))
                .ok_or_else(|| PartitionError::UnknownSignature(sig.0.clone()))?;
            let node = self.tree.node((level, idx));

            if entry.closes {
                if let Some(parent) = self.tree.parent_id((level, idx)) {
                    cut_edges.insert((node.id, parent));
                }
            }
            if let Some(key) = &entry.left {
                stack.push(((level, idx - 1), key.clone()));
            }
            if let (Some(key), Some(child)) = (&entry.child, node.rightmost_child()) {
                stack.push(((level + 1, child), key.clone()));
            }
        }
        Ok(cut_edges)
    }

    /// Splits the tree along `cut_edges`; the component of the root comes first.
    pub fn components(&self, cut_edges: &BTreeSet<(NodeId, NodeId)>) -> Vec<Vec<NodeId>> {
        let mut components: Vec<Vec<NodeId>> = vec![Vec::new()];
        let mut queue: VecDeque<(Position, usize)> = VecDeque::from([((0, 0), 0)]);

        while let Some(((level, idx), component)) = queue.pop_front() {
            let node = self.tree.node((level, idx));
            components[component].push(node.id);
            for child_idx in node.children.clone() {
                let child = self.tree.node((level + 1, child_idx));
                if cut_edges.contains(&(child.id, node.id)) || cut_edges.contains(&(node.id, child.id)) {
                    components.push(Vec::new());
                    queue.push_back(((level + 1, child_idx), components.len() - 1));
                } else {
                    queue.push_back(((level + 1, child_idx), component));
                }
            }
        }
        components
    }
}
