use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::arena::{NodeData, RootedTree};
use crate::errors::{GraphError, GraphResult};

pub type NodeId = usize;
pub type Weight = u64;

/// Largest node count [`Graph::try_new`] accepts.
pub const MAX_NODE_COUNT: usize = 1 << 24;

/// Sums weights, failing instead of wrapping.
pub fn sum_weights<I: IntoIterator<Item = Weight>>(weights: I) -> GraphResult<Weight> {
    weights
        .into_iter()
        .try_fold(0 as Weight, |acc, w| acc.checked_add(w))
        .ok_or(GraphError::WeightOverflow)
}

/// How a general graph is reduced to a tree before partitioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanningTree {
    /// Minimum spanning tree
    Mst,
    /// Random spanning tree
    Rst,
}

impl fmt::Display for SpanningTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpanningTree::Mst => write!(f, "mst"),
            SpanningTree::Rst => write!(f, "rst"),
        }
    }
}

impl FromStr for SpanningTree {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mst" => Ok(SpanningTree::Mst),
            "rst" => Ok(SpanningTree::Rst),
            other => Err(format!("unknown spanning tree '{}'", other)),
        }
    }
}

/// Undirected graph with weighted nodes and edges.
///
/// Node ids are dense (`0..node_count`). Every edge is stored at both endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Graph {
    node_weights: Vec<Weight>,
    adjacency: Vec<BTreeMap<NodeId, Weight>>,
}

impl Graph {
    /// Graph with `node_count` isolated nodes of weight 1.
    ///
    /// Allocates unconditionally; use [`Graph::try_new`] for counts read from input.
    pub fn new(node_count: usize) -> Self {
        Self {
            node_weights: vec![1; node_count],
            adjacency: vec![BTreeMap::new(); node_count],
        }
    }

    /// Like [`Graph::new`], but rejects counts above [`MAX_NODE_COUNT`] and
    /// reports allocation failure instead of aborting.
    pub fn try_new(node_count: usize) -> GraphResult<Self> {
        if node_count > MAX_NODE_COUNT {
            return Err(GraphError::TooManyNodes {
                node_count,
                limit: MAX_NODE_COUNT,
            });
        }
        let mut node_weights = Vec::new();
        let mut adjacency = Vec::new();
        node_weights
            .try_reserve_exact(node_count)
            .and_then(|()| adjacency.try_reserve_exact(node_count))
            .map_err(|_| GraphError::Allocation(node_count))?;
        node_weights.resize(node_count, 1);
        adjacency.resize_with(node_count, BTreeMap::new);
        Ok(Self {
            node_weights,
            adjacency,
        })
    }

    pub fn node_count(&self) -> usize {
        self.node_weights.len()
    }

    pub fn edge_count(&self) -> usize {
        // Edges are counted at both endpoints.
        self.adjacency.iter().map(BTreeMap::len).sum::<usize>() / 2
    }

    pub fn node_weight(&self, node: NodeId) -> GraphResult<Weight> {
        self.check_node(node)?;
        Ok(self.node_weights[node])
    }

    pub fn set_node_weight(&mut self, node: NodeId, weight: Weight) -> GraphResult<()> {
        self.check_node(node)?;
        self.node_weights[node] = weight;
        Ok(())
    }

    pub fn edge_weight(&self, from: NodeId, to: NodeId) -> Option<Weight> {
        self.adjacency.get(from).and_then(|adj| adj.get(&to).copied())
    }

    pub fn has_edge(&self, from: NodeId, to: NodeId) -> bool {
        self.edge_weight(from, to).is_some()
    }

    /// Sets the weight of edge `{from, to}`, creating it if needed.
    pub fn set_edge_weight(&mut self, from: NodeId, to: NodeId, weight: Weight) -> GraphResult<()> {
        self.check_edge(from, to)?;
        self.adjacency[from].insert(to, weight);
        self.adjacency[to].insert(from, weight);
        Ok(())
    }

    /// Adds `weight` to edge `{from, to}`, creating it if needed.
    pub fn add_edge_weight(&mut self, from: NodeId, to: NodeId, weight: Weight) -> GraphResult<()> {
        self.check_edge(from, to)?;
        let total = self
            .edge_weight(from, to)
            .unwrap_or(0)
            .checked_add(weight)
            .ok_or(GraphError::WeightOverflow)?;
        self.adjacency[from].insert(to, total);
        self.adjacency[to].insert(from, total);
        Ok(())
    }

    pub fn neighbors(&self, node: NodeId) -> impl Iterator<Item = (NodeId, Weight)> + '_ {
        self.adjacency
            .get(node)
            .into_iter()
            .flat_map(|adj| adj.iter().map(|(&to, &w)| (to, w)))
    }

    pub fn degree(&self, node: NodeId) -> usize {
        self.adjacency.get(node).map_or(0, BTreeMap::len)
    }

    /// Every edge once, as `(u, v, weight)` with `u < v`.
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId, Weight)> + '_ {
        self.adjacency.iter().enumerate().flat_map(|(from, adj)| {
            adj.range(from + 1..).map(move |(&to, &w)| (from, to, w))
        })
    }

    pub fn total_node_weight(&self) -> GraphResult<Weight> {
        sum_weights(self.node_weights.iter().copied())
    }

    pub fn is_connected(&self) -> bool {
        if self.node_count() == 0 {
            return true;
        }
        self.reachable_from(0) == self.node_count()
    }

    pub fn is_tree(&self) -> bool {
        self.node_count() > 0
            && self.edge_count() + 1 == self.node_count()
            && self.is_connected()
    }

    /// Sum of the weights of edges whose endpoints lie in different parts.
    pub fn cut_cost(&self, assignment: &[usize]) -> GraphResult<Weight> {
        if assignment.len() != self.node_count() {
            return Err(GraphError::NodeOutOfRange {
                node: assignment.len(),
                node_count: self.node_count(),
            });
        }
        sum_weights(
            self.edges()
                .filter(|&(u, v, _)| assignment[u] != assignment[v])
                .map(|(_, _, w)| w),
        )
    }

    /// Minimum spanning tree (Kruskal). Node weights are kept.
    #[instrument(level = "debug", skip(self), fields(nodes = self.node_count(), edges = self.edge_count()))]
    pub fn minimum_spanning_tree(&self) -> GraphResult<Graph> {
        let mut edges: Vec<_> = self.edges().collect();
        edges.sort_by_key(|&(u, v, w)| (w, u, v));
        self.spanning_tree_from(edges)
    }

    /// Uniformly shuffled Kruskal; the same seed yields the same tree.
    #[instrument(level = "debug", skip(self), fields(nodes = self.node_count()))]
    pub fn random_spanning_tree(&self, seed: u64) -> GraphResult<Graph> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut edges: Vec<_> = self.edges().collect();
        edges.shuffle(&mut rng);
        self.spanning_tree_from(edges)
    }

    pub fn spanning_tree(&self, kind: SpanningTree, seed: u64) -> GraphResult<Graph> {
        match kind {
            SpanningTree::Mst => self.minimum_spanning_tree(),
            SpanningTree::Rst => self.random_spanning_tree(seed),
        }
    }

    /// Roots the tree at `root` with a BFS.
    #[instrument(level = "debug", skip(self))]
    pub fn root_at(&self, root: NodeId) -> GraphResult<RootedTree> {
        if self.node_count() == 0 {
            return Err(GraphError::Empty);
        }
        self.check_node(root)?;
        if !self.is_tree() {
            return Err(GraphError::NotATree(format!(
                "{} nodes, {} edges, connected: {}",
                self.node_count(),
                self.edge_count(),
                self.is_connected()
            )));
        }

        let mut tree = RootedTree::new();
        let root_idx = tree.insert_node(
            NodeData {
                id: root,
                weight: self.node_weights[root],
                parent_edge_weight: 0,
            },
            None,
        );
        let mut visited = vec![false; self.node_count()];
        visited[root] = true;
        let mut queue = VecDeque::from([(root, root_idx)]);

        while let Some((node, idx)) = queue.pop_front() {
            for (neighbor, weight) in self.neighbors(node) {
                if visited[neighbor] {
                    continue;
                }
                visited[neighbor] = true;
                let child_idx = tree.insert_node(
                    NodeData {
                        id: neighbor,
                        weight: self.node_weights[neighbor],
                        parent_edge_weight: weight,
                    },
                    Some(idx),
                );
                queue.push_back((neighbor, child_idx));
            }
        }
        debug!("rooted tree at {} with {} nodes", root, tree.len());
        Ok(tree)
    }

    fn spanning_tree_from(&self, edges: Vec<(NodeId, NodeId, Weight)>) -> GraphResult<Graph> {
        let mut tree = Graph {
            node_weights: self.node_weights.clone(),
            adjacency: vec![BTreeMap::new(); self.node_count()],
        };
        let mut components = UnionFind::new(self.node_count());
        for (u, v, w) in edges {
            if components.union(u, v) {
                tree.adjacency[u].insert(v, w);
                tree.adjacency[v].insert(u, w);
            }
        }
        if self.node_count() > 0 && tree.edge_count() + 1 != self.node_count() {
            return Err(GraphError::Disconnected);
        }
        Ok(tree)
    }

    fn reachable_from(&self, start: NodeId) -> usize {
        let mut visited = vec![false; self.node_count()];
        visited[start] = true;
        let mut stack = vec![start];
        let mut count = 1;
        while let Some(node) = stack.pop() {
            for (neighbor, _) in self.neighbors(node) {
                if !visited[neighbor] {
                    visited[neighbor] = true;
                    count += 1;
                    stack.push(neighbor);
                }
            }
        }
        count
    }

    fn check_node(&self, node: NodeId) -> GraphResult<()> {
        if node >= self.node_count() {
            return Err(GraphError::NodeOutOfRange {
                node,
                node_count: self.node_count(),
            });
        }
        Ok(())
    }

    fn check_edge(&self, from: NodeId, to: NodeId) -> GraphResult<()> {
        self.check_node(from)?;
        self.check_node(to)?;
        if from == to {
            return Err(GraphError::SelfLoop(from));
        }
        Ok(())
    }
}

struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
            rank: vec![0; size],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// Returns false if `a` and `b` were already joined.
    fn union(&mut self, a: usize, b: usize) -> bool {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
        true
    }
}
