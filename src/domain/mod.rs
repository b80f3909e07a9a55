//! Domain layer: entities, parsing, tree building and traversal
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod builder;
pub mod entities;
pub mod error;
pub mod features;
pub mod parser;
pub mod paths;
pub mod tree;
pub mod writer;

pub use builder::TreeBuilder;
pub use entities::*;
pub use error::{DomainError, DomainResult, ErrorKind};
pub use features::{FeatureNameResolver, FeatureNames};
pub use parser::{DotDocument, DotTreeParser};
pub use paths::{PathEnumerator, SingleChildPolicy};
pub use tree::DecisionTree;
pub use writer::write_dot;
