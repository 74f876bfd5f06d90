//! Seeded random graph and tree generators.
//!
//! Every generator is a pure function of its parameters and the seed.

use std::fmt;
use std::ops::RangeInclusive;

use rand::distributions::WeightedIndex;
use rand::prelude::*;
use rand::rngs::StdRng;
use tracing::{debug, instrument};

use crate::errors::{GenerateError, GenerateResult};
use crate::graph::{Graph, NodeId, Weight};

pub const DEFAULT_EDGE_WEIGHTS: RangeInclusive<Weight> = 1..=100;
pub const DEFAULT_NODE_WEIGHTS: RangeInclusive<Weight> = 1..=1;

pub trait GraphGenerator: fmt::Debug + Send + Sync {
    fn generate(&self, seed: u64) -> GenerateResult<Graph>;
}

/// Node and edge weight ranges shared by all generators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightRanges {
    pub node: RangeInclusive<Weight>,
    pub edge: RangeInclusive<Weight>,
}

impl Default for WeightRanges {
    fn default() -> Self {
        Self {
            node: DEFAULT_NODE_WEIGHTS,
            edge: DEFAULT_EDGE_WEIGHTS,
        }
    }
}

impl WeightRanges {
    fn validate(&self) -> GenerateResult<()> {
        for (name, range) in [("node", &self.node), ("edge", &self.edge)] {
            if range.is_empty() {
                return Err(GenerateError::InvalidParameter(format!(
                    "empty {} weight range {}..={}",
                    name,
                    range.start(),
                    range.end()
                )));
            }
        }
        Ok(())
    }

    fn node_weight(&self, rng: &mut StdRng) -> Weight {
        rng.gen_range(self.node.clone())
    }

    fn edge_weight(&self, rng: &mut StdRng) -> Weight {
        rng.gen_range(self.edge.clone())
    }

    /// Graph with `node_count` nodes carrying random weights.
    fn weighted_nodes(&self, node_count: usize, rng: &mut StdRng) -> GenerateResult<Graph> {
        let mut graph = Graph::try_new(node_count)?;
        for node in 0..node_count {
            graph.set_node_weight(node, self.node_weight(rng))?;
        }
        Ok(graph)
    }
}

fn require_nodes(node_count: usize) -> GenerateResult<()> {
    if node_count == 0 {
        return Err(GenerateError::InvalidParameter(
            "node count must be at least 1".to_string(),
        ));
    }
    Ok(())
}

/// Random tree: node `i` attaches to a uniformly chosen node in `0..i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRandAttach {
    pub node_count: usize,
    pub max_degree: usize,
    pub weights: WeightRanges,
}

impl TreeRandAttach {
    pub fn new(node_count: usize) -> Self {
        Self {
            node_count,
            max_degree: usize::MAX,
            weights: WeightRanges::default(),
        }
    }

    pub fn with_max_degree(mut self, max_degree: usize) -> Self {
        self.max_degree = max_degree;
        self
    }

    pub fn with_weights(mut self, weights: WeightRanges) -> Self {
        self.weights = weights;
        self
    }
}

impl GraphGenerator for TreeRandAttach {
    #[instrument(level = "debug", skip(self), fields(nodes = self.node_count))]
    fn generate(&self, seed: u64) -> GenerateResult<Graph> {
        require_nodes(self.node_count)?;
        self.weights.validate()?;
        let mut rng = StdRng::seed_from_u64(seed);
        let mut graph = self.weights.weighted_nodes(self.node_count, &mut rng)?;

        let mut saturated = usize::from(self.max_degree == 0);
        for node in 1..self.node_count {
            if saturated == node {
                return Err(GenerateError::DegreeExhausted {
                    node,
                    max_degree: self.max_degree,
                });
            }
            let mut parent = rng.gen_range(0..node);
            while graph.degree(parent) >= self.max_degree {
                parent = rng.gen_range(0..node);
            }
            let weight = self.weights.edge_weight(&mut rng);
            graph.set_edge_weight(parent, node, weight)?;

            saturated += usize::from(graph.degree(parent) >= self.max_degree);
            saturated += usize::from(graph.degree(node) >= self.max_degree);
        }
        debug!("generated tree with {} nodes", graph.node_count());
        Ok(graph)
    }
}

/// Random tree where the parent is drawn proportionally to its degree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreePrefAttach {
    pub node_count: usize,
    pub max_degree: usize,
    pub weights: WeightRanges,
}

impl TreePrefAttach {
    pub fn new(node_count: usize) -> Self {
        Self {
            node_count,
            max_degree: usize::MAX,
            weights: WeightRanges::default(),
        }
    }

    pub fn with_max_degree(mut self, max_degree: usize) -> Self {
        self.max_degree = max_degree;
        self
    }

    pub fn with_weights(mut self, weights: WeightRanges) -> Self {
        self.weights = weights;
        self
    }
}

impl GraphGenerator for TreePrefAttach {
    #[instrument(level = "debug", skip(self), fields(nodes = self.node_count))]
    fn generate(&self, seed: u64) -> GenerateResult<Graph> {
        require_nodes(self.node_count)?;
        self.weights.validate()?;
        let mut rng = StdRng::seed_from_u64(seed);
        let mut graph = self.weights.weighted_nodes(self.node_count, &mut rng)?;
        if self.node_count == 1 {
            return Ok(graph);
        }
        if self.max_degree == 0 {
            return Err(GenerateError::DegreeExhausted {
                node: 1,
                max_degree: 0,
            });
        }

        // Every node appears once per incident edge, so a uniform pick is
        // proportional to degree.
        let mut endpoints: Vec<NodeId> = vec![0, 1];
        let weight = self.weights.edge_weight(&mut rng);
        graph.set_edge_weight(0, 1, weight)?;
        let mut saturated = if self.max_degree == 1 { 2 } else { 0 };

        for node in 2..self.node_count {
            if saturated == node {
                return Err(GenerateError::DegreeExhausted {
                    node,
                    max_degree: self.max_degree,
                });
            }
            let mut parent = endpoints[rng.gen_range(0..endpoints.len())];
            while graph.degree(parent) >= self.max_degree {
                parent = endpoints[rng.gen_range(0..endpoints.len())];
            }
            let weight = self.weights.edge_weight(&mut rng);
            graph.set_edge_weight(parent, node, weight)?;
            endpoints.push(parent);
            endpoints.push(node);

            saturated += usize::from(graph.degree(parent) >= self.max_degree);
            saturated += usize::from(graph.degree(node) >= self.max_degree);
        }
        Ok(graph)
    }
}

/// Level-wise tree: every node of a level gets the same random number of children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeFat {
    pub node_count: usize,
    pub child_counts: RangeInclusive<usize>,
    pub weights: WeightRanges,
}

impl TreeFat {
    pub fn new(node_count: usize, child_counts: RangeInclusive<usize>) -> Self {
        Self {
            node_count,
            child_counts,
            weights: WeightRanges::default(),
        }
    }

    pub fn with_weights(mut self, weights: WeightRanges) -> Self {
        self.weights = weights;
        self
    }
}

impl GraphGenerator for TreeFat {
    #[instrument(level = "debug", skip(self), fields(nodes = self.node_count))]
    fn generate(&self, seed: u64) -> GenerateResult<Graph> {
        require_nodes(self.node_count)?;
        self.weights.validate()?;
        if self.child_counts.is_empty() || *self.child_counts.start() == 0 {
            return Err(GenerateError::InvalidParameter(format!(
                "child count range {}..={} must be non-empty and start at 1 or more",
                self.child_counts.start(),
                self.child_counts.end()
            )));
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let mut graph = self.weights.weighted_nodes(self.node_count, &mut rng)?;

        let mut last_level: Vec<NodeId> = vec![0];
        let mut next_node = 1;
        while next_node < self.node_count {
            let child_count = rng.gen_range(self.child_counts.clone());
            let mut level = Vec::new();
            'level: for &parent in &last_level {
                for _ in 0..child_count {
                    if next_node >= self.node_count {
                        break 'level;
                    }
                    let weight = self.weights.edge_weight(&mut rng);
                    graph.set_edge_weight(parent, next_node, weight)?;
                    level.push(next_node);
                    next_node += 1;
                }
            }
            last_level = level;
        }
        Ok(graph)
    }
}

/// Random graph with `edge_count` edges whose endpoints are drawn by degree.
///
/// Drawing an existing edge adds to its weight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphPrefAttach {
    pub node_count: usize,
    pub edge_count: usize,
    pub max_degree: usize,
    pub weights: WeightRanges,
}

impl GraphPrefAttach {
    pub fn new(node_count: usize, edge_count: usize) -> Self {
        Self {
            node_count,
            edge_count,
            max_degree: usize::MAX,
            weights: WeightRanges::default(),
        }
    }

    pub fn with_max_degree(mut self, max_degree: usize) -> Self {
        self.max_degree = max_degree;
        self
    }

    pub fn with_weights(mut self, weights: WeightRanges) -> Self {
        self.weights = weights;
        self
    }
}

impl GraphGenerator for GraphPrefAttach {
    #[instrument(level = "debug", skip(self), fields(nodes = self.node_count, edges = self.edge_count))]
    fn generate(&self, seed: u64) -> GenerateResult<Graph> {
        require_nodes(self.node_count)?;
        self.weights.validate()?;
        if self.edge_count > 0 && (self.node_count < 2 || self.max_degree == 0) {
            return Err(GenerateError::InvalidParameter(format!(
                "cannot place {} edges on {} nodes with max degree {}",
                self.edge_count, self.node_count, self.max_degree
            )));
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let mut graph = self.weights.weighted_nodes(self.node_count, &mut rng)?;

        // Draw weight is degree + 1 so isolated nodes can be picked.
        let mut draw_weights = vec![1usize; self.node_count];
        let max_attempts = self.edge_count.saturating_mul(1000).max(10_000);
        let mut placed = 0;
        let mut attempts = 0;

        while placed < self.edge_count {
            attempts += 1;
            if attempts > max_attempts {
                return Err(GenerateError::InvalidParameter(format!(
                    "placed only {} of {} edges within max degree {}",
                    placed, self.edge_count, self.max_degree
                )));
            }
            let from = pick_weighted(&draw_weights, None, &mut rng)?;
            let to = pick_weighted(&draw_weights, Some(from), &mut rng)?;

            let exists = graph.has_edge(from, to);
            let below_max =
                graph.degree(from) < self.max_degree && graph.degree(to) < self.max_degree;
            if !(below_max || exists) {
                continue;
            }
            let weight = self.weights.edge_weight(&mut rng);
            graph.add_edge_weight(from, to, weight)?;
            if !exists {
                draw_weights[from] += 1;
                draw_weights[to] += 1;
            }
            placed += 1;
        }
        Ok(graph)
    }
}

fn pick_weighted(weights: &[usize], exclude: Option<NodeId>, rng: &mut StdRng) -> GenerateResult<NodeId> {
    let masked = weights
        .iter()
        .enumerate()
        .map(|(node, &w)| if Some(node) == exclude { 0 } else { w });
    let dist = WeightedIndex::new(masked)
        .map_err(|e| GenerateError::InvalidParameter(format!("degree distribution: {}", e)))?;
    Ok(dist.sample(rng))
}

/// Erdős–Rényi graph: every pair is joined with probability `edge_prob`.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphEdgeProb {
    pub node_count: usize,
    pub edge_prob: f64,
    pub weights: WeightRanges,
}

impl GraphEdgeProb {
    pub fn new(node_count: usize, edge_prob: f64) -> Self {
        Self {
            node_count,
            edge_prob,
            weights: WeightRanges::default(),
        }
    }

    pub fn with_weights(mut self, weights: WeightRanges) -> Self {
        self.weights = weights;
        self
    }
}

impl GraphGenerator for GraphEdgeProb {
    #[instrument(level = "debug", skip(self), fields(nodes = self.node_count, p = self.edge_prob))]
    fn generate(&self, seed: u64) -> GenerateResult<Graph> {
        require_nodes(self.node_count)?;
        self.weights.validate()?;
        if !(0.0..=1.0).contains(&self.edge_prob) {
            return Err(GenerateError::InvalidParameter(format!(
                "edge probability {} outside [0, 1]",
                self.edge_prob
            )));
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let mut graph = self.weights.weighted_nodes(self.node_count, &mut rng)?;
        for from in 0..self.node_count {
            for to in from + 1..self.node_count {
                if rng.gen_bool(self.edge_prob) {
                    let weight = self.weights.edge_weight(&mut rng);
                    graph.set_edge_weight(from, to, weight)?;
                }
            }
        }
        Ok(graph)
    }
}
