//! Which files get compressed before upload.

use crate::Compression;
use std::collections::BTreeSet;

/// Files at or below this size are uploaded as-is; the encoding overhead
/// outweighs the saving.
pub const DEFAULT_MIN_SIZE: u64 = 500;

/// Extensions of media formats that are already compressed.
pub const DEFAULT_SKIP_EXTENSIONS: [&str; 6] = ["gif", "jpg", "jpeg", "png", "psd", "ai"];

/// Decides, per file, whether content is compressed before being digested
/// and uploaded.
///
/// A file is compressed when it is strictly larger than
/// [`min_size`](Self::min_size) and its extension is not in the skip list.
/// Extensions are compared case-insensitively, without the leading dot.
///
/// # Examples
///
/// ```
/// use sitesync_compress::{Compression, CompressionPolicy};
///
/// let policy = CompressionPolicy::default();
/// assert_eq!(policy.choose(600, "html"), Compression::Gzip);
/// assert_eq!(policy.choose(10_240, "png"), Compression::None);
/// assert_eq!(policy.choose(500, "css"), Compression::None);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompressionPolicy {
    encoding: Compression,
    min_size: u64,
    skip_extensions: BTreeSet<String>,
}

impl Default for CompressionPolicy {
    fn default() -> Self {
        Self::new(Compression::Gzip, DEFAULT_MIN_SIZE, DEFAULT_SKIP_EXTENSIONS)
    }
}

impl CompressionPolicy {
    pub fn new(
        encoding: Compression,
        min_size: u64,
        skip_extensions: impl IntoIterator<Item = impl AsRef<str>>,
    ) -> Self {
        let skip_extensions = skip_extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim_start_matches('.').to_lowercase())
            .collect();
        Self { encoding, min_size, skip_extensions }
    }

    /// A policy that never compresses.
    pub fn disabled() -> Self {
        Self::new(Compression::None, DEFAULT_MIN_SIZE, DEFAULT_SKIP_EXTENSIONS)
    }

    pub fn with_encoding(mut self, encoding: Compression) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn encoding(&self) -> Compression {
        self.encoding
    }

    pub fn min_size(&self) -> u64 {
        self.min_size
    }

    /// Returns the compression to apply to a file of `size` bytes with the
    /// given extension; [`Compression::None`] when it should be sent as-is.
    #[must_use]
    pub fn choose(&self, size: u64, extension: &str) -> Compression {
        if size <= self.min_size || self.skip_extensions.contains(&extension.to_lowercase()) {
            return Compression::None;
        }
        self.encoding
    }
}
