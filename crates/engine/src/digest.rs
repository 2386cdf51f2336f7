//! Content digests and the upload decision.
//!
//! The digest is the lowercase hex MD5 of the bytes that will be stored,
//! i.e. after compression. That is the entity tag S3 reports for objects
//! uploaded in a single part, so it can be compared against the inventory
//! without downloading anything.

use crate::inventory::Inventory;
use derive_more::Display;
use md5::{Digest, Md5};
use std::io::{self, Write};

/// A writer that hashes everything passing through it.
pub struct DigestWriter<W> {
    inner: W,
    hasher: Md5,
}
impl<W: Write> DigestWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, hasher: Md5::new() }
    }

    /// Returns the inner writer and the hex digest of everything written.
    pub fn finish(self) -> (W, String) {
        (self.inner, format!("{:x}", self.hasher.finalize()))
    }
}
impl<W: Write> Write for DigestWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.hasher.update(&buf[..written]);
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Why a file is being uploaded.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum UploadReason {
    /// No remote object exists under the key
    #[display("new")]
    New,
    /// The remote object's digest differs
    #[display("changed")]
    Changed,
    /// Uploads were forced regardless of digests
    #[display("forced")]
    Forced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Upload(UploadReason),
    Skip,
}

/// Decide whether `key`, whose local content hashes to `digest`, must be
/// uploaded.
///
/// Skips only when a remote record exists, uploads are not forced, and the
/// digests are equal.
pub fn decide(inventory: &Inventory, key: &str, digest: &str, force: bool) -> Decision {
    match (inventory.digest(key), force) {
        (_, true) => Decision::Upload(UploadReason::Forced),
        (None, false) => Decision::Upload(UploadReason::New),
        (Some(remote), false) if remote == digest => Decision::Skip,
        (Some(_), false) => Decision::Upload(UploadReason::Changed),
    }
}
