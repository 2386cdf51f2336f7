//! CDN Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A CDN error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for CDN operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Credentials are missing, invalid, expired, or lack permission
    #[display("access denied or credentials missing")]
    Credentials,
    /// A referenced distribution does not exist
    #[display("distribution not found: {_0}")]
    NotFound(#[error(not(source))] String),
    /// A request could not be built from the values given
    #[display("invalid request: {_0}")]
    InvalidRequest(#[error(not(source))] String),
    /// A local file (e.g. certificate material) could not be read
    #[display("unable to read {}", _0.display())]
    Read(#[error(not(source))] PathBuf),
    /// Network-related error (connection, timeout, malformed response)
    #[display("network error: {_0}")]
    Network(#[error(not(source))] String),
    /// Backend-specific error
    #[display("backend error: {_0}")]
    BackendError(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::BackendError(_))
    }

    /// Returns `true` if the user needs to fix their credential setup.
    pub fn is_credentials(&self) -> bool {
        matches!(self, Self::Credentials)
    }
}
