//! Error types for Hearth.
//!
//! All fallible operations return [`HearthError`] through the crate-wide
//! [`Result`] alias. The first four variants form the taxonomy callers are
//! expected to branch on; the rest describe supporting failures.
//!
//! # Examples
//!
//! ```
//! use hearth::error::{ErrorKind, HearthError, Result};
//!
//! fn check_price(min: u32, max: u32) -> Result<()> {
//!     if min > max {
//!         return Err(HearthError::invalid_input("min_price exceeds max_price"));
//!     }
//!     Ok(())
//! }
//!
//! let err = check_price(900, 500).unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::InvalidInput);
//! assert!(!err.is_retryable());
//! ```

use std::io;

use thiserror::Error;

/// The main error type for Hearth operations.
#[derive(Error, Debug)]
pub enum HearthError {
    /// Malformed caller input: unknown filter field, unknown enum value,
    /// inverted range. Never retried.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The index store cannot serve requests (closed, or marked unavailable).
    #[error("Index unavailable: {0}")]
    IndexUnavailable(String),

    /// A read or write did not finish before its deadline.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Another write holds the document's lock.
    #[error("Write conflict on document {id}")]
    WriteConflict { id: u64 },

    /// A long-running operation was cancelled.
    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    /// The apartment source of truth failed.
    #[error("Source error: {0}")]
    Source(String),

    /// An index invariant was violated.
    #[error("Index error: {0}")]
    Index(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors (data files, config files)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for operations that may fail with HearthError.
pub type Result<T> = std::result::Result<T, HearthError>;

/// Coarse classification of a [`HearthError`], for mapping onto transport
/// status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidInput,
    IndexUnavailable,
    Timeout,
    WriteConflict,
    Cancelled,
    Internal,
}

impl HearthError {
    /// Create a new invalid input error.
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        HearthError::InvalidInput(msg.into())
    }

    /// Create a new index unavailable error.
    pub fn unavailable<S: Into<String>>(msg: S) -> Self {
        HearthError::IndexUnavailable(msg.into())
    }

    /// Create a new timeout error.
    pub fn timeout<S: Into<String>>(msg: S) -> Self {
        HearthError::Timeout(msg.into())
    }

    /// Create a new write conflict error.
    pub fn write_conflict(id: u64) -> Self {
        HearthError::WriteConflict { id }
    }

    /// Create a new cancelled error.
    pub fn cancelled<S: Into<String>>(msg: S) -> Self {
        HearthError::Cancelled(msg.into())
    }

    /// Create a new source error.
    pub fn source<S: Into<String>>(msg: S) -> Self {
        HearthError::Source(msg.into())
    }

    /// Create a new index error.
    pub fn index<S: Into<String>>(msg: S) -> Self {
        HearthError::Index(msg.into())
    }

    /// Create a new configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        HearthError::Config(msg.into())
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            HearthError::InvalidInput(_) | HearthError::Json(_) => ErrorKind::InvalidInput,
            HearthError::IndexUnavailable(_) => ErrorKind::IndexUnavailable,
            HearthError::Timeout(_) => ErrorKind::Timeout,
            HearthError::WriteConflict { .. } => ErrorKind::WriteConflict,
            HearthError::Cancelled(_) => ErrorKind::Cancelled,
            HearthError::Source(_)
            | HearthError::Index(_)
            | HearthError::Config(_)
            | HearthError::Io(_) => ErrorKind::Internal,
        }
    }

    /// Whether the indexer may retry the failed write.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            HearthError::WriteConflict { .. }
                | HearthError::IndexUnavailable(_)
                | HearthError::Source(_)
        )
    }
}
