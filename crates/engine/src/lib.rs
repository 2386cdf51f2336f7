//! Incremental deployment of a static site to an object store behind a CDN.
//!
//! [`sync`] runs the whole job:
//!
//! 1. read the remote [`Inventory`] once;
//! 2. [`walk`] the local root, feeding a bounded queue;
//! 3. a pool of workers prepares each file (content type, optional
//!    compression, digest), skips it when the remote digest already matches,
//!    and uploads it otherwise;
//! 4. once every worker has finished, [`invalidate`] the CDN for exactly the
//!    paths that were uploaded.

mod digest;
pub mod error;
mod invalidate;
mod inventory;
mod mime;
mod report;
pub mod upload;
mod walk;

pub use crate::digest::{Decision, DigestWriter, UploadReason, decide};
pub use crate::invalidate::{InvalidationReceipt, invalidate};
pub use crate::inventory::Inventory;
pub use crate::mime::{content_type, sniff};
pub use crate::report::{ChangedKeys, SyncReport, escape_path};
pub use crate::upload::{FileOutcome, UploadSettings};
pub use crate::walk::{LocalFile, LocalFileStream, walk};

use crate::error::{ErrorKind, Result};
use sitesync_cdn::CdnHandle;
use sitesync_storage::StoreHandle;
use sitesync_storage::backend::DryRunStore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::instrument;

pub const DEFAULT_CONCURRENCY: usize = 4;
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// What to sync, and how.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Local directory whose contents mirror the bucket root
    pub root: PathBuf,
    /// Domain the site is served on; used to find the distribution
    pub domain: String,
    pub upload: UploadSettings,
    /// Number of upload workers, at least 1
    pub concurrency: usize,
    /// Files waiting for a worker, at least 1
    pub queue_capacity: usize,
    /// Compare and report, but upload and invalidate nothing
    pub dry_run: bool,
}
impl SyncOptions {
    pub fn new(root: impl Into<PathBuf>, domain: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            domain: domain.into(),
            upload: UploadSettings::default(),
            concurrency: DEFAULT_CONCURRENCY,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            dry_run: false,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.concurrency < 1 {
            exn::bail!(ErrorKind::InvalidOptions("concurrency must be at least 1".to_string()));
        }
        if self.queue_capacity < 1 {
            exn::bail!(ErrorKind::InvalidOptions("queue capacity must be at least 1".to_string()));
        }
        if self.domain.trim().is_empty() {
            exn::bail!(ErrorKind::InvalidOptions("domain must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Bring the store up to date with `options.root` and invalidate what changed.
///
/// Per-file failures are reported in [`SyncReport::failed`] and do not fail
/// the run. Failing to read the inventory or a local directory, or to
/// invalidate changed paths, does.
#[instrument(skip_all, fields(domain = %options.domain, root = %options.root.display(), dry_run = options.dry_run))]
pub async fn sync(store: StoreHandle, cdn: CdnHandle, options: &SyncOptions) -> Result<SyncReport> {
    options.validate()?;
    let store: StoreHandle = match options.dry_run {
        true => Arc::new(DryRunStore::new(store)),
        false => store,
    };

    let inventory = Arc::new(Inventory::fetch(store.as_ref()).await?);
    let collected = upload::run(
        store,
        inventory,
        Arc::new(options.upload.clone()),
        options.root.clone(),
        options.concurrency,
        options.queue_capacity,
    )
    .await?;
    tracing::info!(
        uploaded = collected.changed.len(),
        unchanged = collected.unchanged,
        failed = collected.failed.len(),
        "Upload complete",
    );

    let invalidation = match options.dry_run {
        true => {
            if !collected.changed.is_empty() {
                tracing::info!(paths = ?collected.changed, "Dry run: skipping invalidation");
            }
            None
        },
        false => invalidate(cdn.as_ref(), &options.domain, &collected.changed).await?,
    };
    Ok(SyncReport {
        changed: collected.changed,
        unchanged: collected.unchanged,
        failed: collected.failed,
        invalidation,
    })
}
