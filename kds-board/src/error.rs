//! Error types for kds-board
//!
//! Module-specific error type using thiserror. `ChecklistIncomplete` means
//! the local precondition failed and no remote call was made; `Remote` and
//! `Transport` mean the remote call itself failed.

use thiserror::Error;

/// Main error type for kds-board
#[derive(Error, Debug)]
pub enum Error {
    /// Database connection or query errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Remote source answered with a non-success status
    #[error("Remote source error (status {status}): {body}")]
    Remote { status: u16, body: String },

    /// Network-level failure reaching the remote source
    #[error("Transport error: {0}")]
    Transport(String),

    /// Remote payload could not be decoded into order records
    #[error("Decode error: {0}")]
    Decode(String),

    /// Completion blocked: not every line item is checked off
    #[error("Checklist incomplete for order {order_id}")]
    ChecklistIncomplete { order_id: i64 },

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience Result type using the kds-board Error
pub type Result<T> = std::result::Result<T, Error>;

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Error::Decode(e.to_string())
        } else {
            Error::Transport(e.to_string())
        }
    }
}

impl From<kds_common::Error> for Error {
    fn from(e: kds_common::Error) -> Self {
        match e {
            kds_common::Error::Database(e) => Error::Database(e),
            kds_common::Error::NotFound(msg) => Error::NotFound(msg),
            kds_common::Error::InvalidInput(msg) => Error::InvalidInput(msg),
            kds_common::Error::Config(msg) => Error::Config(msg),
            other => Error::Internal(other.to_string()),
        }
    }
}
