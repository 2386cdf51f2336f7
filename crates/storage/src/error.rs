//! Storage Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::io::Error as IoError;
use std::path::PathBuf;

/// A storage error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Bucket does not exist
    #[display("bucket not found: {_0}")]
    BucketNotFound(#[error(not(source))] String),
    /// Credentials are missing, invalid, expired, or lack permission
    #[display("access denied or credentials missing")]
    Credentials,
    /// Object key is empty, absolute, or escapes the bucket root
    #[display("invalid object key: {_0}")]
    InvalidKey(#[error(not(source))] String),
    /// The local file holding an upload body could not be read
    #[display("unable to read upload body: {}", _0.display())]
    Read(#[error(not(source))] PathBuf),
    /// Underlying I/O error
    #[display("I/O error: {_0}")]
    Io(IoError),
    /// Network-related error (connection, timeout, malformed response)
    #[display("network error: {_0}")]
    Network(#[error(not(source))] String),
    /// Backend-specific error
    #[display("backend error: {_0}")]
    BackendError(#[error(not(source))] String),
}
impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Network(_) | Self::BackendError(_))
    }

    /// Returns `true` if the user needs to fix their credential setup.
    pub fn is_credentials(&self) -> bool {
        matches!(self, Self::Credentials)
    }
}
