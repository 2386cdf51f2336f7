use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// An encoder could not be set up for the chosen content encoding.
    Encoder,
    /// Compressed input could not be decoded.
    #[display("invalid or corrupted data")]
    InvalidData,
    /// Not a content encoding this tool knows (e.g. `deflate`).
    #[display("unknown content encoding: {_0}")]
    UnsupportedFormat(#[error(not(source))] String),
    /// A known content encoding whose cargo feature was not compiled in.
    #[display("content encoding not enabled in this build: {_0}")]
    DisabledFormat(#[error(not(source))] String),
    /// Reading the source or writing the encoded output failed.
    #[display("I/O error")]
    Io,
}
