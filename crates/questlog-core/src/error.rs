use thiserror::Error;

use crate::validate::ValidationError;

/// Top-level error type for questlog.
#[derive(Debug, Error)]
pub enum QuestError {
    /// Storage failure (I/O, corruption, failed query).
    #[error("storage error: {0}")]
    Storage(String),

    /// Error from a messaging channel.
    #[error("channel error: {0}")]
    Channel(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Bad user input that slipped past the command layer.
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
