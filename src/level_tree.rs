//! Breadth-first level layout of a rooted tree.
//!
//! Children of a node are contiguous in the next level, so a node is fully
//! described by its parent's position and the range of its children.
//!
//! Sizes are node weights; with unit weights they are node counts.

use std::collections::HashMap;
use std::ops::Range;

use generational_arena::Index;
use tracing::instrument;

use crate::arena::RootedTree;
use crate::errors::{GraphError, GraphResult};
use crate::graph::{sum_weights, NodeId, Weight};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelNode {
    pub id: NodeId,
    pub weight: usize,
    pub parent_edge_weight: Weight,
    /// Position of the parent in the previous level; 0 for the root
    pub parent_idx: usize,
    /// Positions of the children in the next level
    pub children: Range<usize>,
    pub has_left_sibling: bool,
    /// Node weight of the subtree; saturates, see [`LevelTree::total_weight`]
    pub subtree_weight: usize,
}

impl LevelNode {
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Position of the rightmost child in the next level.
    pub fn rightmost_child(&self) -> Option<usize> {
        self.has_children().then(|| self.children.end - 1)
    }
}

/// Position of a node as `(level, index within level)`.
pub type Position = (usize, usize);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelTree {
    pub levels: Vec<Vec<LevelNode>>,
}

impl LevelTree {
    #[instrument(level = "debug", skip(tree), fields(nodes = tree.len()))]
    pub fn from_rooted(tree: &RootedTree) -> Self {
        let Some(root) = tree.root() else {
            return Self::default();
        };
        let weights = tree.subtree_weights();
        let to_size = |w: Weight| usize::try_from(w).unwrap_or(usize::MAX);

        let mut arena_levels: Vec<Vec<Index>> = vec![vec![root]];
        let mut levels: Vec<Vec<LevelNode>> = Vec::new();
        let mut parent_of_next: Vec<usize> = vec![0];
        let mut left_sibling_of_next: Vec<bool> = vec![false];

        while let Some(current) = arena_levels.last().filter(|l| !l.is_empty()).cloned() {
            let mut next = Vec::new();
            let mut next_parents = Vec::new();
            let mut next_left_siblings = Vec::new();
            let mut level = Vec::with_capacity(current.len());

            for (pos, &idx) in current.iter().enumerate() {
                let Some(node) = tree.get_node(idx) else {
                    continue;
                };
                let first_child = next.len();
                for (child_pos, &child) in node.children.iter().enumerate() {
                    next.push(child);
                    next_parents.push(pos);
                    next_left_siblings.push(child_pos > 0);
                }
                level.push(LevelNode {
                    id: node.data.id,
                    weight: to_size(node.data.weight),
                    parent_edge_weight: node.data.parent_edge_weight,
                    parent_idx: parent_of_next[pos],
                    children: first_child..next.len(),
                    has_left_sibling: left_sibling_of_next[pos],
                    subtree_weight: to_size(weights.get(&idx).copied().unwrap_or(node.data.weight)),
                });
            }

            levels.push(level);
            parent_of_next = next_parents;
            left_sibling_of_next = next_left_siblings;
            arena_levels.push(next);
        }

        Self { levels }
    }

    pub fn node_count(&self) -> usize {
        self.levels.iter().map(Vec::len).sum()
    }

    /// Sum of all node weights.
    ///
    /// Fails if the sum does not fit; when it succeeds every subtree weight is exact.
    pub fn total_weight(&self) -> GraphResult<usize> {
        let total = sum_weights(self.levels.iter().flatten().map(|n| n.weight as Weight))?;
        usize::try_from(total).map_err(|_| GraphError::WeightOverflow)
    }

    /// Node weights by id.
    pub fn weights_by_id(&self) -> HashMap<NodeId, usize> {
        self.levels
            .iter()
            .flatten()
            .map(|n| (n.id, n.weight))
            .collect()
    }

    pub fn node(&self, (level, idx): Position) -> &LevelNode {
        &self.levels[level][idx]
    }

    pub fn root(&self) -> Option<&LevelNode> {
        self.levels.first().and_then(|l| l.first())
    }

    /// Id of the parent of the node at `pos`; None for the root.
    pub fn parent_id(&self, (level, idx): Position) -> Option<NodeId> {
        let parent_idx = self.levels[level][idx].parent_idx;
        level
            .checked_sub(1)
            .map(|parent_level| self.levels[parent_level][parent_idx].id)
    }

    pub fn position_of(&self, id: NodeId) -> Option<Position> {
        self.levels.iter().enumerate().find_map(|(level, nodes)| {
            nodes
                .iter()
                .position(|n| n.id == id)
                .map(|idx| (level, idx))
        })
    }
}
