//! Tree builder assembling parsed records and edges into a [`DecisionTree`].

use std::collections::BTreeMap;

use tracing::{debug, instrument};

use crate::domain::entities::{Edge, LeafNode, NodeId, NodeKind, SplitNode, TreeNode};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::parser::DotDocument;
use crate::domain::tree::DecisionTree;

/// Constructs a validated binary tree from node records and ordered edges.
#[derive(Debug, Default)]
pub struct TreeBuilder;

impl TreeBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn build_document(&self, doc: &DotDocument) -> DomainResult<DecisionTree> {
        self.build(&doc.edges, &doc.splits, &doc.leaves)
    }

    /// Build the tree. Edges are applied in order: first edge of a parent is its left child,
    /// second its right child.
    #[instrument(level = "debug", skip_all, fields(edges = edges.len()))]
    pub fn build(
        &self,
        edges: &[Edge],
        splits: &BTreeMap<NodeId, SplitNode>,
        leaves: &BTreeMap<NodeId, LeafNode>,
    ) -> DomainResult<DecisionTree> {
        let len = splits.len() + leaves.len();
        if !splits.contains_key(&0) && !leaves.contains_key(&0) {
            return Err(DomainError::MissingRoot);
        }

        // Dense ids: N unique ids all below N cover 0..N exactly.
        let mut slots: Vec<Option<TreeNode>> = vec![None; len];
        let records = splits
            .iter()
            .map(|(id, s)| (*id, NodeKind::Split(s.clone())))
            .chain(leaves.iter().map(|(id, l)| (*id, NodeKind::Leaf(l.clone()))));
        for (id, kind) in records {
            let slot = slots
                .get_mut(id)
                .ok_or(DomainError::NodeIdOutOfRange { id, len })?;
            if slot.is_some() {
                return Err(DomainError::format(format!(
                    "node n_{} is declared as both split and leaf",
                    id
                )));
            }
            *slot = Some(TreeNode::new(kind));
        }
        let mut nodes: Vec<TreeNode> = slots.into_iter().flatten().collect();

        let mut has_parent = vec![false; len];
        for edge in edges {
            attach(&mut nodes, &mut has_parent, edge).map_err(|e| match edge.line {
                0 => e,
                line => e.at_line(line),
            })?;
        }

        for node in &nodes {
            let children = node.child_count();
            match node.kind {
                NodeKind::Split(_) if children != 2 => {
                    return Err(DomainError::NonBranchingSplit {
                        node: node.id(),
                        children,
                    })
                }
                NodeKind::Leaf(_) if children != 0 => {
                    return Err(DomainError::LeafWithChildren {
                        node: node.id(),
                        children,
                    })
                }
                _ => {}
            }
        }

        check_reachable(&nodes)?;

        debug!(nodes = nodes.len(), "built decision tree");
        Ok(DecisionTree::new_validated(nodes))
    }
}

fn attach(nodes: &mut [TreeNode], has_parent: &mut [bool], edge: &Edge) -> DomainResult<()> {
    let Edge { parent, child, .. } = *edge;
    if parent >= nodes.len() {
        return Err(DomainError::UnknownNode(parent));
    }
    if child >= nodes.len() {
        return Err(DomainError::UnknownNode(child));
    }
    if child == 0 || child == parent || has_parent[child] {
        return Err(DomainError::SharedChild { parent, child });
    }

    let node = &mut nodes[parent];
    if node.left.is_none() {
        node.left = Some(child);
    } else if node.right.is_none() {
        node.right = Some(child);
    } else {
        return Err(DomainError::TooManyChildren { parent, child });
    }
    has_parent[child] = true;
    Ok(())
}

fn check_reachable(nodes: &[TreeNode]) -> DomainResult<()> {
    let mut visited = vec![false; nodes.len()];
    let mut stack = vec![0];
    while let Some(id) = stack.pop() {
        if std::mem::replace(&mut visited[id], true) {
            return Err(DomainError::CycleDetected(id));
        }
        let node = &nodes[id];
        stack.extend(node.left.iter().chain(node.right.iter()));
    }
    match visited.iter().position(|v| !v) {
        Some(id) => Err(DomainError::Unreachable(id)),
        None => Ok(()),
    }
}
