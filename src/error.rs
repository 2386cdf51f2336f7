//! Command-line Error Types

use derive_more::{Display, Error};

/// A command error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for commands.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("unable to load configuration")]
    Config,
    #[display("unable to start the async runtime")]
    Runtime,
    /// Credentials are missing, rejected, or lack permission
    #[display("credentials missing or rejected")]
    Credentials,
    #[display("sync failed")]
    Sync,
    #[display("certificate upload failed")]
    Certificate,
    #[display("bucket creation failed")]
    Bucket,
    #[display("distribution creation failed")]
    Distribution,
}

impl ErrorKind {
    pub fn is_credentials(&self) -> bool {
        matches!(self, Self::Credentials)
    }
}

/// Wrap `err` as `kind`, or as [`ErrorKind::Credentials`] when the underlying
/// failure was a credential problem.
#[track_caller]
pub fn escalate<E>(err: exn::Exn<E>, is_credentials: bool, kind: ErrorKind) -> Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    err.raise(if is_credentials { ErrorKind::Credentials } else { kind })
}
