use std::collections::HashMap;
use std::fmt;

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::graph::{NodeId, Weight};
use crate::level_tree::LevelTree;

/// Data payload for a node of a rooted tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeData {
    /// Node id in the source graph
    pub id: NodeId,
    pub weight: Weight,
    /// Weight of the edge to the parent, 0 for the root
    pub parent_edge_weight: Weight,
}

impl fmt::Display for NodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// Tree node in the arena-based hierarchy structure.
#[derive(Debug)]
pub struct TreeNode {
    pub data: NodeData,
    /// Index of parent node in the arena, None for the root
    pub parent: Option<Index>,
    /// Indices of child nodes in the arena, in insertion order
    pub children: Vec<Index>,
}

/// Arena-based rooted tree.
///
/// Uses a generational arena for memory-safe node references and O(1) lookups.
/// Node ids from the source graph are indexed so callers can go from an id
/// back to its arena slot.
#[derive(Debug)]
pub struct RootedTree {
    arena: Arena<TreeNode>,
    root: Option<Index>,
    by_id: HashMap<NodeId, Index>,
}

impl Default for RootedTree {
    fn default() -> Self {
        Self::new()
    }
}

impl RootedTree {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            root: None,
            by_id: HashMap::new(),
        }
    }

    #[instrument(level = "trace", skip(self))]
    pub fn insert_node(&mut self, data: NodeData, parent: Option<Index>) -> Index {
        let node = TreeNode {
            data,
            parent,
            children: Vec::new(),
        };
        let node_idx = self.arena.insert(node);
        self.by_id.insert(data.id, node_idx);

        if let Some(parent_idx) = parent {
            if let Some(parent) = self.arena.get_mut(parent_idx) {
                parent.children.push(node_idx);
            }
        } else {
            self.root = Some(node_idx);
        }

        node_idx
    }

    pub fn get_node(&self, idx: Index) -> Option<&TreeNode> {
        self.arena.get(idx)
    }

    pub fn index_of(&self, id: NodeId) -> Option<Index> {
        self.by_id.get(&id).copied()
    }

    pub fn root(&self) -> Option<Index> {
        self.root
    }

    pub fn root_id(&self) -> Option<NodeId> {
        self.root.and_then(|r| self.get_node(r)).map(|n| n.data.id)
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn iter(&self) -> TreeIterator {
        TreeIterator::new(self)
    }

    pub fn iter_postorder(&self) -> PostOrderIterator {
        PostOrderIterator::new(self)
    }

    /// Number of levels; 0 for an empty tree.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        let mut depths: HashMap<Index, usize> = HashMap::new();
        let mut max_depth = 0;
        for (idx, node) in self.iter() {
            let depth = node
                .parent
                .and_then(|p| depths.get(&p))
                .map_or(1, |d| d + 1);
            max_depth = max_depth.max(depth);
            depths.insert(idx, depth);
        }
        max_depth
    }

    /// Ids of all nodes without children, in pre-order.
    pub fn leaf_nodes(&self) -> Vec<NodeId> {
        self.iter()
            .filter(|(_, node)| node.children.is_empty())
            .map(|(_, node)| node.data.id)
            .collect()
    }

    /// Total node weight of the subtree rooted at each node, saturating at
    /// `Weight::MAX`.
    #[instrument(level = "debug", skip(self))]
    pub fn subtree_weights(&self) -> HashMap<Index, Weight> {
        let mut weights: HashMap<Index, Weight> = HashMap::with_capacity(self.len());
        for (idx, node) in self.iter_postorder() {
            let weight = node
                .children
                .iter()
                .map(|c| weights.get(c).copied().unwrap_or(0))
                .fold(node.data.weight, Weight::saturating_add);
            weights.insert(idx, weight);
        }
        weights
    }

    pub fn to_level_tree(&self) -> LevelTree {
        LevelTree::from_rooted(self)
    }

    /// Edges as `(parent_id, child_id, weight)` in pre-order.
    pub fn edges(&self) -> Vec<(NodeId, NodeId, Weight)> {
        self.iter()
            .filter_map(|(_, node)| {
                let parent = node.parent.and_then(|p| self.get_node(p))?;
                Some((parent.data.id, node.data.id, node.data.parent_edge_weight))
            })
            .collect()
    }
}

pub struct TreeIterator<'a> {
    tree: &'a RootedTree,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(tree: &'a RootedTree) -> Self {
        let mut stack = Vec::new();
        if let Some(root) = tree.root() {
            stack.push(root);
        }
        Self { tree, stack }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        let current_idx = self.stack.pop()?;
        let node = self.tree.get_node(current_idx)?;
        // Push children in reverse order for left-to-right traversal
        for &child in node.children.iter().rev() {
            self.stack.push(child);
        }
        Some((current_idx, node))
    }
}

pub struct PostOrderIterator<'a> {
    tree: &'a RootedTree,
    stack: Vec<(Index, bool)>,
}

impl<'a> PostOrderIterator<'a> {
    fn new(tree: &'a RootedTree) -> Self {
        let mut stack = Vec::new();
        if let Some(root) = tree.root() {
            stack.push((root, false));
        }
        Self { tree, stack }
    }
}

impl<'a> Iterator for PostOrderIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, visited)) = self.stack.pop() {
            if let Some(node) = self.tree.get_node(current_idx) {
                if !visited {
                    self.stack.push((current_idx, true));
                    for &child in node.children.iter().rev() {
                        self.stack.push((child, false));
                    }
                } else {
                    return Some((current_idx, node));
                }
            }
        }
        None
    }
}
