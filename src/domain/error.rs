//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Coarse classification of a [`DomainError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unparseable label or edge statement
    Format,
    /// Feature index or node id outside valid bounds
    Range,
    /// Dangling edge, third child, missing root, non-binary split, ...
    Structural,
}

/// Domain errors represent malformed input or broken tree invariants.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("invalid statement: {message}")]
    Format { message: String },

    #[error("feature index {index} out of range (have {len} feature names)")]
    FeatureIndexOutOfRange { index: usize, len: usize },

    #[error("node id {id} out of range (have {len} nodes)")]
    NodeIdOutOfRange { id: usize, len: usize },

    #[error("unknown node id: {0}")]
    UnknownNode(usize),

    #[error("too many children for node {parent}: extra child {child}")]
    TooManyChildren { parent: usize, child: usize },

    #[error("missing root: node 0 is not declared")]
    MissingRoot,

    #[error("non-branching split: node {node} has {children} children")]
    NonBranchingSplit { node: usize, children: usize },

    #[error("leaf node {node} has {children} children")]
    LeafWithChildren { node: usize, children: usize },

    #[error("node {child} cannot be a child of {parent}: it already has a parent or is the root")]
    SharedChild { parent: usize, child: usize },

    #[error("node {0} is not reachable from the root")]
    Unreachable(usize),

    #[error("cycle detected in tree at node {0}")]
    CycleDetected(usize),

    #[error("line {line}: {source}")]
    AtLine {
        line: usize,
        #[source]
        source: Box<DomainError>,
    },
}

impl DomainError {
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format {
            message: message.into(),
        }
    }

    /// Attach a 1-based input line number.
    pub fn at_line(self, line: usize) -> Self {
        match self {
            already @ Self::AtLine { .. } => already,
            other => Self::AtLine {
                line,
                source: Box::new(other),
            },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Format { .. } => ErrorKind::Format,
            Self::FeatureIndexOutOfRange { .. } | Self::NodeIdOutOfRange { .. } => ErrorKind::Range,
            Self::AtLine { source, .. } => source.kind(),
            _ => ErrorKind::Structural,
        }
    }

    /// Range errors are a refinement of format errors.
    pub fn is_format(&self) -> bool {
        matches!(self.kind(), ErrorKind::Format | ErrorKind::Range)
    }

    pub fn line(&self) -> Option<usize> {
        match self {
            Self::AtLine { line, .. } => Some(*line),
            _ => None,
        }
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
