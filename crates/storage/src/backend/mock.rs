//! In-memory object store for testing.

use super::RemoteObjectStream;
use crate::error::{ErrorKind, Result};
use crate::models::{PutOptions, RemoteObject};
use crate::path::validate as validate_key;
use async_stream::stream;
use async_trait::async_trait;
use md5::{Digest, Md5};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tokio::sync::RwLock;

use crate::ObjectStore;

/// An object held by [`MockStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub data: Vec<u8>,
    /// Quoted entity tag, the way S3 reports it for single-part uploads
    pub etag: String,
    /// Metadata from the last upload; `None` for objects seeded by the test
    pub options: Option<PutOptions>,
}
impl StoredObject {
    fn new(data: Vec<u8>, options: Option<PutOptions>) -> Self {
        let etag = format!("\"{:x}\"", Md5::digest(&data));
        Self { data, etag, options }
    }
}

/// In-memory object store for testing.
///
/// Objects are stored in a `BTreeMap` behind a [`RwLock`], so all trait
/// methods can operate on `&self` without external synchronisation. Entity
/// tags are the quoted MD5 of the stored bytes, mirroring S3, so change
/// detection behaves as it would against a real bucket.
///
/// Failures can be injected per key ([`failing_put`](Self::failing_put)) or
/// for the whole listing ([`missing`](Self::missing),
/// [`denied`](Self::denied)).
///
/// # Examples
///
/// ```
/// use sitesync_storage::backend::MockStore;
/// use sitesync_storage::ObjectStore;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MockStore::with_objects([("index.html", "<html></html>")]);
/// let objects = store.list().await?;
/// assert_eq!(objects[0].key, "index.html");
/// # Ok(())
/// # }
/// ```
pub struct MockStore {
    name: String,
    objects: RwLock<BTreeMap<String, StoredObject>>,
    puts: RwLock<Vec<String>>,
    failing_puts: BTreeSet<String>,
    list_failure: Option<fn(&str) -> ErrorKind>,
}

impl MockStore {
    /// Create a mock store pre-populated with objects.
    ///
    /// Panics if any key fails validation. If test setup is wrong, then test
    /// should not pass.
    pub fn with_objects(objects: impl IntoIterator<Item = (impl Into<String>, impl Into<Vec<u8>>)>) -> Self {
        let mut map = BTreeMap::new();
        for (key, data) in objects {
            let key = key.into();
            let Ok(validated) = validate_key(&key) else {
                // The panic here is DELIBERATE. MockStore is intended to be
                // used in tests; panics are expected. There is no error result.
                panic!("MockStore::with_objects: invalid key {key}");
            };
            map.insert(validated, StoredObject::new(data.into(), None));
        }
        Self {
            name: "mock".to_string(),
            objects: RwLock::new(map),
            puts: RwLock::new(Vec::new()),
            failing_puts: BTreeSet::new(),
            list_failure: None,
        }
    }

    /// Change the name (bucket) of the mock store.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Make every upload of `key` fail with a network error.
    pub fn failing_put(mut self, key: impl Into<String>) -> Self {
        self.failing_puts.insert(key.into());
        self
    }

    /// Make listing fail as if the bucket did not exist.
    pub fn missing(mut self) -> Self {
        self.list_failure = Some(|name| ErrorKind::BucketNotFound(name.to_string()));
        self
    }

    /// Make listing fail as if credentials were rejected.
    pub fn denied(mut self) -> Self {
        self.list_failure = Some(|_| ErrorKind::Credentials);
        self
    }

    /// Snapshot of a stored object.
    pub async fn object(&self, key: &str) -> Option<StoredObject> {
        self.objects.read().await.get(key).cloned()
    }

    /// Keys of every successful upload, in the order they completed.
    pub async fn puts(&self) -> Vec<String> {
        self.puts.read().await.clone()
    }
}
impl Default for MockStore {
    fn default() -> Self {
        let objects: [(&str, &str); 0] = [];
        Self::with_objects(objects)
    }
}

#[async_trait]
impl ObjectStore for MockStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_stream(&self) -> RemoteObjectStream<'_> {
        if let Some(failure) = self.list_failure {
            let err = exn::Exn::from(failure(&self.name));
            return Box::pin(futures::stream::once(async { Err(err) }));
        }
        Box::pin(stream! {
            // Snapshot under the read lock, then drop it before yielding to
            // avoid holding the lock across yield points.
            let entries: Vec<RemoteObject> = {
                let guard = self.objects.read().await;
                guard.iter().map(|(key, object)| RemoteObject::new(key, &object.etag)).collect()
            };
            for entry in entries {
                yield Ok(entry);
            }
        })
    }

    async fn put(&self, key: &str, body: &Path, options: &PutOptions) -> Result<()> {
        let key = validate_key(key)?;
        if self.failing_puts.contains(&key) {
            exn::bail!(ErrorKind::Network(format!("injected failure for {key}")));
        }
        let data = tokio::fs::read(body).await.map_err(ErrorKind::Io)?;
        self.objects.write().await.insert(key.clone(), StoredObject::new(data, Some(options.clone())));
        self.puts.write().await.push(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn options() -> PutOptions {
        PutOptions {
            content_type: "text/html".to_string(),
            content_encoding: Some("gzip".to_string()),
            cache_control: "max-age=900".to_string(),
            acl: Some("public-read".to_string()),
        }
    }

    fn body(data: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(data).unwrap();
        file
    }

    #[tokio::test]
    async fn test_put_and_list() {
        let store = MockStore::default();
        let file = body(b"hello");
        store.put("docs/a.html", file.path(), &options()).await.unwrap();
        let objects = store.list().await.unwrap();
        assert_eq!(objects, vec![RemoteObject::new("docs/a.html", "\"5d41402abc4b2a76b9719d911017c592\"")]);
        assert_eq!(store.puts().await, vec!["docs/a.html".to_string()]);
        assert_eq!(store.object("docs/a.html").await.unwrap().options, Some(options()));
    }

    #[tokio::test]
    async fn test_seeded_objects_have_md5_etags() {
        let store = MockStore::with_objects([("empty.txt", "")]);
        let objects = store.list().await.unwrap();
        assert_eq!(objects[0].digest, "d41d8cd98f00b204e9800998ecf8427e");
        assert!(store.puts().await.is_empty());
    }

    #[tokio::test]
    async fn test_failing_put() {
        let store = MockStore::default().failing_put("bad.html");
        let file = body(b"x");
        let err = store.put("bad.html", file.path(), &options()).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Network(_)));
        store.put("good.html", file.path(), &options()).await.unwrap();
        assert_eq!(store.puts().await, vec!["good.html".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_bucket() {
        let store = MockStore::default().with_name("example.com").missing();
        let err = store.list().await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::BucketNotFound(name) if name == "example.com"));
    }

    #[tokio::test]
    async fn test_denied() {
        let err = MockStore::default().denied().list().await.unwrap_err();
        assert!(err.is_credentials());
    }

    #[tokio::test]
    async fn test_put_missing_body() {
        let store = MockStore::default();
        let err = store.put("a.txt", Path::new("/definitely/not/here"), &options()).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Io(_)));
    }

    #[tokio::test]
    async fn test_key_traversal_rejected() {
        let store = MockStore::default();
        let file = body(b"x");
        assert!(store.put("../escape", file.path(), &options()).await.is_err());
    }

    #[test]
    #[should_panic(expected = "invalid key")]
    fn test_with_objects_panics_on_bad_key() {
        MockStore::with_objects([("../escape", "bad")]);
    }
}
