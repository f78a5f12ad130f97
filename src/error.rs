//! Error types for classchat.

use thiserror::Error;

/// Common error type for classchat.
#[derive(Error, Debug)]
pub enum ChatError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// A command envelope that is not a chat command.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// A message was composed without a selected recipient.
    #[error("no client selected")]
    NoTargetSelected,
}

/// Result type alias for classchat operations.
pub type Result<T> = std::result::Result<T, ChatError>;
