//! Domain entities: core data structures

use std::fmt;

use itertools::Itertools;

/// Node identifier, dense in `0..N`.
pub type NodeId = usize;

/// Internal node branching on `feature <= threshold`.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitNode {
    pub id: NodeId,
    /// Zero-based position in the feature name list
    pub feature_index: usize,
    /// Feature name, resolved at parse time
    pub feature: String,
    pub threshold: f64,
    pub sample_count: u64,
}

/// Terminal node carrying a prediction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafNode {
    pub id: NodeId,
    /// Raw label token, not interpreted
    pub predicted_label: String,
    pub sample_count: u64,
    pub mistake_count: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Split(SplitNode),
    Leaf(LeafNode),
}

impl NodeKind {
    pub fn id(&self) -> NodeId {
        match self {
            NodeKind::Split(s) => s.id,
            NodeKind::Leaf(l) => l.id,
        }
    }
}

/// Tree node in the id-indexed tree array.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub kind: NodeKind,
    /// First child edge seen for this node
    pub left: Option<NodeId>,
    /// Second child edge seen for this node
    pub right: Option<NodeId>,
}

impl TreeNode {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            left: None,
            right: None,
        }
    }

    pub fn id(&self) -> NodeId {
        self.kind.id()
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf(_))
    }

    pub fn child_count(&self) -> usize {
        self.left.iter().chain(self.right.iter()).count()
    }
}

impl fmt::Display for TreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            NodeKind::Split(s) => write!(
                f,
                "{} <= {} (samples {})",
                s.feature,
                fmt_threshold(s.threshold),
                s.sample_count
            ),
            NodeKind::Leaf(l) => write!(
                f,
                "{} (samples {}, mistakes {})",
                l.predicted_label, l.sample_count, l.mistake_count
            ),
        }
    }
}

/// Parent to child edge. Encounter order decides left/right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub parent: NodeId,
    pub child: NodeId,
    /// 1-based input line, 0 when synthetic
    pub line: usize,
}

impl Edge {
    pub fn new(parent: NodeId, child: NodeId) -> Self {
        Self {
            parent,
            child,
            line: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// Left branch
    LessOrEqual,
    /// Right branch
    Greater,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::LessOrEqual => f.write_str("<="),
            Operator::Greater => f.write_str(">"),
        }
    }
}

/// One branch condition on a decision path.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub feature: String,
    pub operator: Operator,
    pub threshold: f64,
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.feature,
            self.operator,
            fmt_threshold(self.threshold)
        )
    }
}

/// Ordered conditions from the root to one leaf.
pub type DecisionPath = Vec<Condition>;

/// A decision path paired with the label of the leaf it ends in.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionRule {
    pub path: DecisionPath,
    pub label: String,
}

/// Renders as `<label>: <cond>; <cond>;`, or `<label>: ` for an empty path.
impl fmt::Display for DecisionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.label)?;
        if !self.path.is_empty() {
            write!(f, "{};", self.path.iter().join("; "))?;
        }
        Ok(())
    }
}

/// Shortest round-trip form, always with a decimal point or exponent: `30.0`, `0.5`, `1e20`.
pub fn fmt_threshold(value: f64) -> String {
    format!("{:?}", value)
}
