//! Error types for the [`upload`](super) module.
//!
//! Every error here concerns a single file; the pipeline logs it, reports
//! the file as failed, and carries on with the rest.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A per-file upload error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for upload operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies which step of a file's upload failed.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The local file could not be opened or read.
    #[display("unable to read {}", _0.display())]
    Read(#[error(not(source))] PathBuf),
    /// Compressing the content, or spooling it to a temporary file, failed.
    #[display("compression failed")]
    Compression,
    /// The blocking preparation task panicked or was cancelled.
    #[display("preparation task aborted")]
    Task,
    /// The object store rejected or failed the upload.
    #[display("upload failed")]
    Storage,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage)
    }
}
