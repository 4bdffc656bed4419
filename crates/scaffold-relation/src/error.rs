//! Error types for relation planning and emission

use scaffold_source::{MutationError, NamingError};

/// Errors planning or lowering a relation
#[derive(Debug, thiserror::Error)]
pub enum RelationError {
    /// Request rejected before any file is touched
    #[error("invalid relation request: {0}")]
    InvalidRequest(String),

    /// Names could not be told apart
    #[error(transparent)]
    Naming(#[from] NamingError),

    /// Lowered operations failed
    #[error(transparent)]
    Mutation(#[from] MutationError),
}

impl RelationError {
    /// Create invalid request error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }
}
