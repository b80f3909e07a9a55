//! Depth-first enumeration of root-to-leaf decision paths.

use std::iter::FusedIterator;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::domain::entities::{Condition, DecisionRule, NodeId, NodeKind, Operator};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::tree::DecisionTree;

/// How to treat a split node that has exactly one child.
///
/// [`TreeBuilder`](crate::domain::TreeBuilder) never produces such nodes; they only show up in
/// trees wrapped with [`DecisionTree::from_nodes`]. There is deliberately no `Default`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SingleChildPolicy {
    /// Walk into the present child, recording the branch it hangs on.
    Follow,
    /// Report a non-branching split error.
    Reject,
}

struct Frame {
    node: NodeId,
    /// Path length of the parent
    parent_len: usize,
    /// Condition leading from the parent into `node`
    step: Option<Condition>,
}

/// Lazy iterator over [`DecisionRule`]s, one per leaf, left subtree first.
///
/// Borrows the tree read-only. After the first error it yields nothing more.
pub struct PathEnumerator<'a> {
    tree: &'a DecisionTree,
    policy: SingleChildPolicy,
    stack: Vec<Frame>,
    path: Vec<Condition>,
    pending: Option<DomainError>,
}

impl<'a> PathEnumerator<'a> {
    pub fn new(tree: &'a DecisionTree, policy: SingleChildPolicy) -> Self {
        debug!(nodes = tree.len(), ?policy, "enumerating decision paths");
        let (stack, pending) = if tree.is_empty() {
            (Vec::new(), Some(DomainError::MissingRoot))
        } else {
            let root = Frame {
                node: 0,
                parent_len: 0,
                step: None,
            };
            (vec![root], None)
        };
        Self {
            tree,
            policy,
            stack,
            path: Vec::new(),
            pending,
        }
    }

    fn fail(&mut self, err: DomainError) -> Option<DomainResult<DecisionRule>> {
        self.stack.clear();
        Some(Err(err))
    }

    fn push_child(&mut self, child: NodeId, feature: &str, operator: Operator, threshold: f64) {
        self.stack.push(Frame {
            node: child,
            parent_len: self.path.len(),
            step: Some(Condition {
                feature: feature.to_string(),
                operator,
                threshold,
            }),
        });
    }
}

impl<'a> Iterator for PathEnumerator<'a> {
    type Item = DomainResult<DecisionRule>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(err) = self.pending.take() {
            return Some(Err(err));
        }

        while let Some(Frame {
            node,
            parent_len,
            step,
        }) = self.stack.pop()
        {
            self.path.truncate(parent_len);
            self.path.extend(step);

            // A path with as many conditions as there are nodes must revisit one.
            if self.path.len() >= self.tree.len() {
                return self.fail(DomainError::CycleDetected(node));
            }
            let tree = self.tree;
            let Some(current) = tree.node(node) else {
                return self.fail(DomainError::UnknownNode(node));
            };

            match &current.kind {
                NodeKind::Leaf(leaf) => {
                    trace!(leaf = node, depth = self.path.len(), "reached leaf");
                    return Some(Ok(DecisionRule {
                        path: self.path.clone(),
                        label: leaf.predicted_label.clone(),
                    }));
                }
                NodeKind::Split(split) => match (current.left, current.right) {
                    (Some(left), Some(right)) => {
                        // right first so that left pops first
                        self.push_child(right, &split.feature, Operator::Greater, split.threshold);
                        self.push_child(left, &split.feature, Operator::LessOrEqual, split.threshold);
                    }
                    (Some(left), None) if self.policy == SingleChildPolicy::Follow => {
                        self.push_child(left, &split.feature, Operator::LessOrEqual, split.threshold);
                    }
                    (None, Some(right)) if self.policy == SingleChildPolicy::Follow => {
                        self.push_child(right, &split.feature, Operator::Greater, split.threshold);
                    }
                    (left, right) => {
                        let children = left.iter().chain(right.iter()).count();
                        return self.fail(DomainError::NonBranchingSplit { node, children });
                    }
                },
            }
        }
        None
    }
}

impl FusedIterator for PathEnumerator<'_> {}

impl DecisionTree {
    /// Lazily enumerate one rule per leaf in depth-first, left-before-right order.
    pub fn paths(&self, policy: SingleChildPolicy) -> PathEnumerator<'_> {
        PathEnumerator::new(self, policy)
    }

    /// All rules, or the first error. Never a partial list.
    pub fn rules(&self, policy: SingleChildPolicy) -> DomainResult<Vec<DecisionRule>> {
        self.paths(policy).collect()
    }

    /// Rules rendered one per line, each newline-terminated.
    pub fn render_rules(&self, policy: SingleChildPolicy) -> DomainResult<String> {
        let mut out = String::new();
        for rule in self.paths(policy) {
            out.push_str(&rule?.to_string());
            out.push('\n');
        }
        Ok(out)
    }
}
