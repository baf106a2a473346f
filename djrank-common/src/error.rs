//! Common error types for DJ Rank

use thiserror::Error;

/// Common result type for DJ Rank operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the DJ Rank crates
///
/// Storage and transport variants (`Database`, `Http`, `Gateway`) all mean
/// "the mutation did not happen"; callers keep their local state unchanged.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// HTTP transport error talking to a remote gateway
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote gateway answered with a non-success status
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// JSON encoding or decoding error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested performer not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Record with the same identifier already exists
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Mutation attempted without admin capability
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for failures where the store may be fine but could not be reached
    /// or did not accept the write
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Database(_) | Error::Http(_) | Error::Gateway(_))
    }

    /// True when the error is a recoverable "no such performer" outcome
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}
