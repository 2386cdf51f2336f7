//! Dry-run object store.
//!
//! This module provides a store implementation that wraps other
//! implementations and prevents uploads from executing, but indicating
//! success on return.

use async_trait::async_trait;
use std::path::Path;

use crate::backend::RemoteObjectStream;
use crate::{ObjectStore, PutOptions, StoreHandle, error::Result, validate_key};

/// Dry-run object store.
///
/// Wraps another store, passes listings through, and silently drops all
/// uploads, logging an [`info event`](tracing::Event) for each one.
#[derive(Clone)]
pub struct DryRunStore {
    inner: StoreHandle,
}
impl DryRunStore {
    pub fn new(inner: StoreHandle) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl ObjectStore for DryRunStore {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn list_stream(&self) -> RemoteObjectStream<'_> {
        self.inner.list_stream()
    }

    async fn put(&self, key: &str, body: &Path, options: &PutOptions) -> Result<()> {
        let key = validate_key(key)?;
        tracing::info!(
            bucket = self.inner.name(),
            key,
            body = %body.display(),
            content_type = options.content_type,
            content_encoding = ?options.content_encoding,
            "Dry run: skipping upload",
        );
        Ok(())
    }
}

#[cfg(all(test, feature = "mock"))]
mod tests {
    use super::*;
    use crate::backend::MockStore;
    use std::sync::Arc;

    fn options() -> PutOptions {
        PutOptions {
            content_type: "text/plain".to_string(),
            content_encoding: None,
            cache_control: "max-age=900".to_string(),
            acl: None,
        }
    }

    #[tokio::test]
    async fn test_put_is_dropped() {
        let mock = Arc::new(MockStore::default());
        let store = DryRunStore::new(mock.clone());
        let temp = tempfile::NamedTempFile::new().unwrap();
        store.put("a.txt", temp.path(), &options()).await.unwrap();
        assert!(mock.puts().await.is_empty());
        assert!(mock.object("a.txt").await.is_none());
    }

    #[tokio::test]
    async fn test_put_still_validates_key() {
        let store = DryRunStore::new(Arc::new(MockStore::default()));
        assert!(store.put("../escape", Path::new("/dev/null"), &options()).await.is_err());
    }

    #[tokio::test]
    async fn test_list_passes_through() {
        let store = DryRunStore::new(Arc::new(MockStore::with_objects([("index.html", "hi")])));
        let objects = store.list().await.unwrap();
        assert_eq!(objects.len(), 1);
        assert_eq!(store.name(), "mock");
    }
}
