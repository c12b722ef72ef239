use thiserror::Error;

use murmur_core::error::MurmurError;

/// Errors raised while producing embedding vectors.
///
/// Every variant is fatal to the request: vectors from different providers
/// live in incompatible spaces, so there is no fallback mid-run.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("embedding endpoint returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("embedding request timed out: {0}")]
    Timeout(String),
    #[error("malformed embedding response: {0}")]
    MalformedResponse(String),
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("config error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for EmbeddingError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            EmbeddingError::Timeout(err.to_string())
        } else if err.is_decode() {
            EmbeddingError::MalformedResponse(err.to_string())
        } else {
            EmbeddingError::Transport(err.to_string())
        }
    }
}

impl From<EmbeddingError> for MurmurError {
    fn from(err: EmbeddingError) -> Self {
        match err {
            EmbeddingError::Config(msg) => MurmurError::Config(msg),
            other => MurmurError::Embedding(other.to_string()),
        }
    }
}
