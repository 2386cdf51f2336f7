//! Per-file upload and the concurrent pipeline that drives it.
//!
//! Each file found by [`walk`](crate::walk()) is prepared (content type,
//! optional compression, digest), compared against the remote
//! [`Inventory`](crate::Inventory), and uploaded only when it differs. A
//! file's failure never affects another file; it is logged and reported as
//! [`FileOutcome::Failed`].

pub mod error;
mod file;
mod payload;
mod pipeline;

pub use self::file::upload_file;
pub use self::payload::Payload;
pub(crate) use self::pipeline::run;
use crate::digest::UploadReason;
use sitesync_compress::CompressionPolicy;

/// How files are uploaded; shared by every worker.
#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub policy: CompressionPolicy,
    pub cache_control: String,
    /// Canned ACL; `None` sends no ACL header
    pub acl: Option<String>,
    /// Upload even when the remote digest matches
    pub force: bool,
}
impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            policy: CompressionPolicy::default(),
            cache_control: "max-age=900".to_string(),
            acl: Some("public-read".to_string()),
            force: false,
        }
    }
}

/// What happened to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Uploaded; `path` is the escaped request path (`/index.html`)
    Uploaded { path: String, reason: UploadReason },
    Unchanged { key: String },
    Failed { key: String },
}
