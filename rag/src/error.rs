use thiserror::Error;

#[derive(Error, Debug)]
pub enum RagError {
    #[error("embedding service error: {0}")]
    EmbeddingService(String),

    #[error("index store unavailable: {0}")]
    IndexUnavailable(String),

    #[error("chat model error: {0}")]
    Generation(String),

    #[error("vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("paragraph source error: {0}")]
    Source(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, RagError>;
