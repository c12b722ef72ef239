use thiserror::Error;

/// Top-level error type for Murmur.
///
/// Subsystem crates define their own error types and implement
/// `From<SubsystemError> for MurmurError` so that `?` works across crate
/// boundaries in the binary.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MurmurError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Input error: {0}")]
    Input(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for MurmurError {
    fn from(err: toml::de::Error) -> Self {
        MurmurError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for MurmurError {
    fn from(err: toml::ser::Error) -> Self {
        MurmurError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for MurmurError {
    fn from(err: serde_json::Error) -> Self {
        MurmurError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Murmur operations.
pub type Result<T> = std::result::Result<T, MurmurError>;
