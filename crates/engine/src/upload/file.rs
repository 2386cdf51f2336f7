use crate::digest::{Decision, decide};
use crate::inventory::Inventory;
use crate::report::escape_path;
use crate::upload::error::{ErrorKind, Result};
use crate::upload::payload::Payload;
use crate::upload::{FileOutcome, UploadSettings};
use crate::walk::LocalFile;
use exn::ResultExt;
use sitesync_storage::{ObjectStore, PutOptions};
use std::sync::Arc;
use tracing::instrument;

/// Prepare, compare and (when needed) upload a single file.
///
/// Never fails: errors are logged at warn level and reported as
/// [`FileOutcome::Failed`].
#[instrument(skip_all, fields(key = %file.key))]
pub async fn upload_file(
    store: &dyn ObjectStore,
    inventory: &Inventory,
    settings: &Arc<UploadSettings>,
    file: LocalFile,
) -> FileOutcome {
    let key = file.key.clone();
    match upload_file_inner(store, inventory, settings, file).await {
        Ok(outcome) => outcome,
        Err(err) => {
            tracing::warn!(key, error = ?err, "Unable to upload file; skipping");
            FileOutcome::Failed { key }
        },
    }
}

async fn upload_file_inner(
    store: &dyn ObjectStore,
    inventory: &Inventory,
    settings: &Arc<UploadSettings>,
    file: LocalFile,
) -> Result<FileOutcome> {
    let key = file.key.clone();
    let shared = Arc::clone(settings);
    // Reading, compressing and hashing are all blocking.
    let payload = tokio::task::spawn_blocking(move || Payload::prepare(&file, &shared.policy))
        .await
        .or_raise(|| ErrorKind::Task)??;

    let reason = match decide(inventory, &key, &payload.digest, settings.force) {
        Decision::Skip => {
            tracing::debug!(key, digest = payload.digest, "Unchanged");
            return Ok(FileOutcome::Unchanged { key });
        },
        Decision::Upload(reason) => reason,
    };
    tracing::info!(key, %reason, content_type = payload.content_type, "Uploading");
    let options = PutOptions {
        content_type: payload.content_type.clone(),
        content_encoding: payload.compression.content_encoding().map(str::to_string),
        cache_control: settings.cache_control.clone(),
        acl: settings.acl.clone(),
    };
    store.put(&key, payload.path(), &options).await.or_raise(|| ErrorKind::Storage)?;
    Ok(FileOutcome::Uploaded { path: escape_path(&key), reason })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::UploadReason;
    use sitesync_compress::Compression;
    use sitesync_storage::backend::MockStore;
    use std::path::Path;

    fn local(dir: &Path, name: &str, data: &[u8]) -> LocalFile {
        let path = dir.join(name);
        std::fs::write(&path, data).unwrap();
        LocalFile {
            path,
            key: name.to_string(),
            size: data.len() as u64,
            extension: name.rsplit_once('.').map(|(_, ext)| ext.to_string()).unwrap_or_default(),
        }
    }

    #[tokio::test]
    async fn test_new_file_uploaded_with_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let html = "<p>hi</p>".repeat(100);
        let file = local(dir.path(), "index.html", html.as_bytes());
        let store = MockStore::default();
        let settings = Arc::new(UploadSettings::default());

        let outcome = upload_file(&store, &Inventory::default(), &settings, file).await;
        assert_eq!(outcome, FileOutcome::Uploaded { path: "/index.html".to_string(), reason: UploadReason::New });

        let stored = store.object("index.html").await.unwrap();
        let options = stored.options.unwrap();
        assert_eq!(options.content_type, "text/html");
        assert_eq!(options.content_encoding.as_deref(), Some("gzip"));
        assert_eq!(options.cache_control, "max-age=900");
        assert_eq!(options.acl.as_deref(), Some("public-read"));
        assert_eq!(Compression::Gzip.decompress(&stored.data).unwrap(), html.as_bytes());
    }

    #[tokio::test]
    async fn test_unchanged_file_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let file = local(dir.path(), "a.txt", b"hello");
        let store = MockStore::with_objects([("a.txt", "hello")]);
        let inventory = Inventory::fetch(&store).await.unwrap();

        let outcome = upload_file(&store, &inventory, &Arc::new(UploadSettings::default()), file).await;
        assert_eq!(outcome, FileOutcome::Unchanged { key: "a.txt".to_string() });
        assert!(store.puts().await.is_empty());
    }

    #[tokio::test]
    async fn test_changed_and_forced() {
        let dir = tempfile::tempdir().unwrap();
        let store = MockStore::with_objects([("a.txt", "old"), ("b.txt", "same")]);
        let inventory = Inventory::fetch(&store).await.unwrap();
        let settings = Arc::new(UploadSettings::default());
        let forced = Arc::new(UploadSettings { force: true, ..UploadSettings::default() });

        let outcome = upload_file(&store, &inventory, &settings, local(dir.path(), "a.txt", b"new")).await;
        assert_eq!(outcome, FileOutcome::Uploaded { path: "/a.txt".to_string(), reason: UploadReason::Changed });
        let outcome = upload_file(&store, &inventory, &forced, local(dir.path(), "b.txt", b"same")).await;
        assert_eq!(outcome, FileOutcome::Uploaded { path: "/b.txt".to_string(), reason: UploadReason::Forced });
    }

    #[tokio::test]
    async fn test_put_failure_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = MockStore::default().failing_put("a.txt");
        let file = local(dir.path(), "a.txt", b"x");
        let outcome = upload_file(&store, &Inventory::default(), &Arc::new(UploadSettings::default()), file).await;
        assert_eq!(outcome, FileOutcome::Failed { key: "a.txt".to_string() });
    }

    #[tokio::test]
    async fn test_unreadable_file_reported() {
        let dir = tempfile::tempdir().unwrap();
        let file = LocalFile {
            path: dir.path().join("vanished.txt"),
            key: "vanished.txt".to_string(),
            size: 3,
            extension: "txt".to_string(),
        };
        let store = MockStore::default();
        let outcome = upload_file(&store, &Inventory::default(), &Arc::new(UploadSettings::default()), file).await;
        assert_eq!(outcome, FileOutcome::Failed { key: "vanished.txt".to_string() });
        assert!(store.puts().await.is_empty());
    }
}
