//! Error types for TDP

use thiserror::Error;

/// Result type alias for TDP operations
pub type Result<T> = std::result::Result<T, TurfError>;

/// Main error type for TDP
#[derive(Error, Debug)]
pub enum TurfError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}
