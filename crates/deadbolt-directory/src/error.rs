//! Directory-specific error types.
//!
//! ## Security Note
//!
//! Error messages must not leak sensitive information like passwords, bind
//! credentials, or raw hash material.

use thiserror::Error;

/// Errors from directory lookups and hash record handling.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Invalid configuration.
    #[error("Directory configuration error: {0}")]
    Configuration(String),

    /// Connection to the directory failed.
    #[error("Directory connection failed: {0}")]
    Connection(String),

    /// Bind (service account authentication) failed.
    #[error("Directory bind failed: {0}")]
    Bind(String),

    /// Search operation failed.
    #[error("Directory search failed: {0}")]
    Search(String),

    /// The password attribute does not parse as a hash record.
    #[error("Invalid hash record: {0}")]
    InvalidHashRecord(String),

    /// The hash record names an algorithm we do not support.
    #[error("Unsupported hash algorithm tag: {0}")]
    UnsupportedAlgorithm(String),
}

impl DirectoryError {
    /// Creates a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Creates a connection error.
    #[must_use]
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates an invalid hash record error.
    #[must_use]
    pub fn invalid_record(msg: impl Into<String>) -> Self {
        Self::InvalidHashRecord(msg.into())
    }
}

/// Result type for directory operations.
pub type DirectoryResult<T> = Result<T, DirectoryError>;
