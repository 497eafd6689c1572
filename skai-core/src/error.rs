//! Error types for skai-core

use thiserror::Error;

/// Main error type for the skai-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding error for persisted records
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Logging setup error
    #[error("logging error: {0}")]
    Logging(String),

    /// Key-value store is unusable (poisoned lock, etc.)
    #[error("storage error: {0}")]
    Storage(String),

    /// A pipeline command was issued without a signed-in session
    #[error("not authenticated")]
    NotAuthenticated,
}

/// Result type alias for skai-core
pub type Result<T> = std::result::Result<T, Error>;
