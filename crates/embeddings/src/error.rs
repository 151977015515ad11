use thiserror::Error;

pub type Result<T> = std::result::Result<T, EmbeddingError>;

#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// Provider failure worth retrying (rate limit, connection reset)
    #[error("Transient provider error: {0}")]
    Transient(String),

    /// Provider failure that retrying will not fix
    #[error("Terminal provider error: {0}")]
    Terminal(String),

    /// The shared circuit breaker is open; calls are being skipped
    #[error("Embedding circuit breaker is open")]
    CircuitOpen,

    #[error("Provider call timed out after {0} ms")]
    Timeout(u64),

    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl EmbeddingError {
    /// Whether the retry loop should try again
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_) | Self::Timeout(_))
    }
}
