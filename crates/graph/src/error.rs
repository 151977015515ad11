use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Vector index is unavailable")]
    IndexUnavailable,

    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("Write conflict: {0}")]
    WriteConflict(String),

    #[error("Graph store timeout: {0}")]
    Timeout(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl GraphError {
    /// Whether an upsert step should be retried
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::WriteConflict(_) | Self::Timeout(_))
    }
}
