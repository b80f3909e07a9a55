//! Serialize a [`DecisionTree`] back into the dump format the parser reads.

use crate::domain::entities::{fmt_threshold, NodeKind};
use crate::domain::tree::DecisionTree;

/// Render `tree` as a dump: header, one label line per node in id order, one edge line
/// per child (left before right), closing brace.
pub fn write_dot(tree: &DecisionTree) -> String {
    let mut out = String::from("digraph Tree {\n");
    for node in tree.nodes() {
        let line = match &node.kind {
            NodeKind::Split(s) => format!(
                "n_{id} [label=\"{id} {} <= {} samples {}\"];\n",
                s.feature_index,
                fmt_threshold(s.threshold),
                s.sample_count,
                id = s.id
            ),
            NodeKind::Leaf(l) => format!(
                "n_{id} [label=\"{id} {} samples {} mistakes {}\"];\n",
                l.predicted_label,
                l.sample_count,
                l.mistake_count,
                id = l.id
            ),
        };
        out.push_str(&line);
    }
    for node in tree.nodes() {
        for child in node.left.iter().chain(node.right.iter()) {
            out.push_str(&format!("n_{} -> n_{};\n", node.id(), child));
        }
    }
    out.push_str("}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{LeafNode, SplitNode, TreeNode};

    #[test]
    fn given_small_tree_when_writing_then_emits_label_and_edge_lines() {
        let tree = DecisionTree::from_nodes(vec![
            TreeNode {
                kind: NodeKind::Split(SplitNode {
                    id: 0,
                    feature_index: 1,
                    feature: "income".to_string(),
                    threshold: 2.5,
                    sample_count: 12,
                }),
                left: Some(1),
                right: Some(2),
            },
            TreeNode::new(NodeKind::Leaf(LeafNode {
                id: 1,
                predicted_label: "A".to_string(),
                sample_count: 7,
                mistake_count: 1,
            })),
            TreeNode::new(NodeKind::Leaf(LeafNode {
                id: 2,
                predicted_label: "B".to_string(),
                sample_count: 5,
                mistake_count: 0,
            })),
        ]);
        assert_eq!(
            write_dot(&tree),
            "digraph Tree {\n\
             n_0 [label=\"0 1 <= 2.5 samples 12\"];\n\
             n_1 [label=\"1 A samples 7 mistakes 1\"];\n\
             n_2 [label=\"2 B samples 5 mistakes 0\"];\n\
             n_0 -> n_1;\n\
             n_0 -> n_2;\n\
             }\n"
        );
    }
}
