//! Immutable id-indexed decision tree.

use termtree::Tree;
use tracing::instrument;

use crate::domain::entities::{NodeId, NodeKind, TreeNode};

/// Binary decision tree stored as a dense array; node `i` lives at index `i`, root is `0`.
///
/// Built once by [`TreeBuilder`](crate::domain::TreeBuilder) and read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
}

impl DecisionTree {
    pub(crate) fn new_validated(nodes: Vec<TreeNode>) -> Self {
        Self { nodes }
    }

    /// Wrap a node array produced elsewhere, without structural validation.
    ///
    /// Traversal of such a tree may report structural errors lazily.
    pub fn from_nodes(nodes: Vec<TreeNode>) -> Self {
        Self { nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> Option<&TreeNode> {
        self.nodes.first()
    }

    pub fn node(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    pub fn split_count(&self) -> usize {
        self.nodes.len() - self.leaf_count()
    }

    /// Number of nodes on the longest root-to-leaf path; a root-only tree has depth 1.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        if self.nodes.is_empty() {
            return 0;
        }
        let mut max_depth = 0;
        let mut stack = vec![(0, 1)]; // (node, depth)

        while let Some((id, depth)) = stack.pop() {
            // guards against malformed trees from `from_nodes`
            if depth > self.nodes.len() {
                break;
            }
            max_depth = max_depth.max(depth);
            if let Some(node) = self.nodes.get(id) {
                for child in node.left.iter().chain(node.right.iter()) {
                    stack.push((*child, depth + 1));
                }
            }
        }
        max_depth
    }

    /// Box-drawing rendering, left subtree first.
    pub fn to_tree_string(&self) -> Tree<String> {
        fn build(tree: &DecisionTree, id: NodeId, budget: usize) -> Tree<String> {
            let Some(node) = tree.node(id) else {
                return Tree::new(format!("<unknown node {}>", id));
            };
            let branch = |child: NodeId, op: &str| {
                let mut sub = if budget == 0 {
                    Tree::new("...".to_string())
                } else {
                    build(tree, child, budget - 1)
                };
                if let NodeKind::Split(_) = node.kind {
                    sub.root = format!("[{}] {}", op, sub.root);
                }
                sub
            };
            let leaves: Vec<_> = node
                .left
                .map(|c| branch(c, "yes"))
                .into_iter()
                .chain(node.right.map(|c| branch(c, "no")))
                .collect();
            Tree::new(node.to_string()).with_leaves(leaves)
        }

        if self.nodes.is_empty() {
            Tree::new("Empty tree".to_string())
        } else {
            build(self, 0, self.nodes.len())
        }
    }
}
