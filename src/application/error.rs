//! Application-level errors (wraps domain errors)

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::DomainError;

/// Application errors wrap domain errors with the file they came from and add
/// application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{path}: {source}")]
    InFile {
        path: PathBuf,
        #[source]
        source: DomainError,
    },

    #[error("no feature names given: pass --features/--names or set features_file")]
    MissingFeatures,

    #[error("config error: {message}")]
    Config { message: String },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ApplicationError {
    /// The domain error behind this failure, if any.
    pub fn domain(&self) -> Option<&DomainError> {
        match self {
            Self::InFile { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Whether the failure is an I/O error on a file that does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::OperationFailed { source, .. } => source
                .downcast_ref::<std::io::Error>()
                .is_some_and(|e| e.kind() == std::io::ErrorKind::NotFound),
            _ => false,
        }
    }
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
