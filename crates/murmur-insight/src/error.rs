use thiserror::Error;

use murmur_core::error::MurmurError;
use murmur_embedding::EmbeddingError;

/// Errors surfaced by the analysis pipeline.
///
/// Enhancement failures never appear here; they are absorbed per cluster.
#[derive(Error, Debug)]
pub enum InsightError {
    #[error("config error: {0}")]
    Config(String),
    #[error("input error: {0}")]
    Input(String),
    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),
}

impl From<MurmurError> for InsightError {
    fn from(err: MurmurError) -> Self {
        match err {
            MurmurError::Config(msg) => InsightError::Config(msg),
            MurmurError::Embedding(msg) => InsightError::Embedding(EmbeddingError::Transport(msg)),
            other => InsightError::Input(other.to_string()),
        }
    }
}

impl From<InsightError> for MurmurError {
    fn from(err: InsightError) -> Self {
        match err {
            InsightError::Config(msg) => MurmurError::Config(msg),
            InsightError::Input(msg) => MurmurError::Input(msg),
            InsightError::Embedding(e) => e.into(),
        }
    }
}

/// Errors from the labeling capability. Always recovered by the caller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LabelingError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("labeling endpoint returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("labeling call timed out: {0}")]
    Timeout(String),
    #[error("malformed labeling response: {0}")]
    MalformedResponse(String),
    #[error("response outside budget: {0}")]
    Budget(String),
}

impl From<reqwest::Error> for LabelingError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LabelingError::Timeout(err.to_string())
        } else {
            LabelingError::Transport(err.to_string())
        }
    }
}
