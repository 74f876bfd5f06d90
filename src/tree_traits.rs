use generational_arena::Index;
use termtree::Tree;
use tracing::instrument;

use crate::arena::{RootedTree, TreeNode};

pub trait TreeNodeConvert {
    fn to_tree_string(&self) -> Tree<String>;
}

fn label(node: &TreeNode, is_root: bool) -> String {
    if is_root {
        node.data.id.to_string()
    } else {
        format!("{} ({})", node.data.id, node.data.parent_edge_weight)
    }
}

/// Renders node ids, with the parent edge weight in parentheses.
impl TreeNodeConvert for RootedTree {
    #[instrument(level = "debug", skip(self))]
    fn to_tree_string(&self) -> Tree<String> {
        let Some(root) = self.root().and_then(|idx| self.get_node(idx).map(|n| (idx, n))) else {
            return Tree::new("Empty tree".to_string());
        };

        fn build_tree(tree: &RootedTree, node_idx: Index, parent_tree: &mut Tree<String>) {
            if let Some(node) = tree.get_node(node_idx) {
                for &child_idx in &node.children {
                    if let Some(child) = tree.get_node(child_idx) {
                        let mut child_tree = Tree::new(label(child, false));
                        build_tree(tree, child_idx, &mut child_tree);
                        parent_tree.push(child_tree);
                    }
                }
            }
        }

        let (root_idx, root_node) = root;
        let mut tree = Tree::new(label(root_node, true));
        build_tree(self, root_idx, &mut tree);
        tree
    }
}
