use crate::Compression;
use std::fmt::{Display, Formatter, Result as FmtResult};

impl Display for Compression {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl AsRef<str> for Compression {
    fn as_ref(&self) -> &'static str {
        self.as_str()
    }
}

impl Compression {
    /// Returns the value of the `Content-Encoding` header a client needs to
    /// decode data compressed with this format, or `None` for identity.
    #[inline]
    #[must_use]
    pub fn content_encoding(&self) -> Option<&'static str> {
        match self {
            Compression::None => None,
            #[cfg(feature = "brotli")]
            Compression::Brotli => Some("br"),
            Compression::Gzip => Some("gzip"),
            #[cfg(feature = "zstd")]
            Compression::Zstd => Some("zstd"),
        }
    }

    /// Returns the short name for configuration (for displaying to user)
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Compression::None => "none",
            #[cfg(feature = "brotli")]
            Compression::Brotli => "brotli",
            Compression::Gzip => "gzip",
            #[cfg(feature = "zstd")]
            Compression::Zstd => "zstd",
        }
    }
}
