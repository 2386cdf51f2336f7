//! Compression for HTTP content encodings.
//!
//! This crate wraps the compression libraries whose output a browser can
//! decode transparently behind a unified [`Compression`] enum, providing:
//!
//! - **Parsing** from configuration or command-line values
//!   ([`Compression::from_str`](std::str::FromStr))
//! - **Content-Encoding** header values ([`Compression::content_encoding`])
//! - **In-memory** compression/decompression ([`Compression::compress`],
//!   [`Compression::decompress`])
//! - **Streaming** into any writer, returning it once the encoder has been
//!   finished ([`Compression::compress_to`])
//! - The **policy** deciding which files are worth compressing before upload
//!   ([`CompressionPolicy`])
//!
//! Gzip is always available. Brotli and Zstd are behind feature flags.
//!
//! All compression uses the highest available level for each format; a site
//! is compressed once and served many times.

mod construct;
pub mod error;
mod ops;
mod policy;
mod util;

pub use crate::policy::{CompressionPolicy, DEFAULT_MIN_SIZE, DEFAULT_SKIP_EXTENSIONS};

/// A supported content encoding.
///
/// Variants gated behind feature flags (`brotli`, `zstd`) are only available
/// when the corresponding feature is enabled. Defaults to
/// [`None`](Self::None) (identity encoding).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Compression {
    /// Identity, no `Content-Encoding` header
    #[default]
    None,
    /// Brotli compression (`br`)
    #[cfg(feature = "brotli")]
    Brotli,
    /// Gzip compression (`gzip`)
    Gzip,
    /// Zstd compression (`zstd`)
    #[cfg(feature = "zstd")]
    Zstd,
}
