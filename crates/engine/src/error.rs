//! Engine Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Only run-level (fatal) failures are
//! represented here; per-file failures live in [`upload::error`](crate::upload::error).

use derive_more::{Display, Error};
use std::path::PathBuf;

/// An engine error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Credentials for the provider are missing, rejected, or lack permission
    #[display("credentials missing or rejected")]
    Credentials,
    /// The remote inventory could not be read
    #[display("unable to list remote objects")]
    Inventory,
    /// A local directory could not be read
    #[display("unable to read directory {}", _0.display())]
    Walk(#[error(not(source))] PathBuf),
    /// No distribution serves the domain
    #[display("no distribution serves {_0}")]
    NoDistribution(#[error(not(source))] String),
    /// Distributions could not be listed or the invalidation was rejected
    #[display("invalidation failed")]
    Invalidation,
    /// Sync options are out of range
    #[display("invalid option: {_0}")]
    InvalidOptions(#[error(not(source))] String),
    /// A pipeline task panicked or was cancelled
    #[display("upload pipeline aborted")]
    Pipeline,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Inventory | Self::Invalidation)
    }

    /// Returns `true` if the user needs to fix their credential setup.
    pub fn is_credentials(&self) -> bool {
        matches!(self, Self::Credentials)
    }
}
