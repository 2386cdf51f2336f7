//! Object store trait and implementations.
//!
//! This module defines the [`ObjectStore`] trait: the narrow interface the
//! sync engine needs from a remote bucket (list everything, put one object).
//! Implementations exist for S3-compatible services, an in-memory mock for
//! tests, and a dry-run decorator.

mod dry_run;
#[cfg(feature = "mock")]
mod mock;
#[cfg(feature = "s3")]
mod s3;

pub use self::dry_run::DryRunStore;
#[cfg(feature = "mock")]
pub use self::mock::{MockStore, StoredObject};
#[cfg(feature = "s3")]
pub use self::s3::S3Store;
use crate::error::Result;
use crate::models::{PutOptions, RemoteObject};
use async_trait::async_trait;
use futures::{Stream, TryStreamExt};
use std::path::Path;
use std::pin::Pin;

pub type RemoteObjectStream<'a> = Pin<Box<dyn Stream<Item = Result<RemoteObject>> + Send + 'a>>;

/// Unified interface for remote object stores.
///
/// # Examples
///
/// ```
/// use sitesync_storage::{ObjectStore, error::Result};
///
/// async fn is_deployed(store: &dyn ObjectStore) -> Result<bool> {
///     let objects = store.list().await?;
///     Ok(objects.iter().any(|object| object.key == "index.html"))
/// }
/// ```
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Name of the bucket/container (used for logging).
    fn name(&self) -> &str;

    /// List every object in the store.
    ///
    /// Default implementation of this method is to collect all the results
    /// from [`list_stream()`](Self::list_stream) into a [`Vec`] before
    /// returning.
    async fn list(&self) -> Result<Vec<RemoteObject>> {
        self.list_stream().try_collect().await
    }

    /// Stream every object in the store.
    ///
    /// Implementations backed by a paged listing API **must** keep requesting
    /// pages until the provider reports there are no more. Stopping after the
    /// first page makes every object beyond it look new, which re-uploads it
    /// on every run.
    ///
    /// An error item ends the stream.
    ///
    /// # Examples
    ///
    /// ```
    /// use futures::TryStreamExt;
    /// # use sitesync_storage::{ObjectStore, error::Result};
    /// # async fn example(store: &dyn ObjectStore) -> Result<()> {
    /// let mut stream = store.list_stream();
    /// while let Some(object) = stream.try_next().await? {
    ///     println!("{}: {}", object.key, object.digest);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    fn list_stream(&self) -> RemoteObjectStream<'_>;

    /// Upload the contents of the local file at `body` under `key`,
    /// overwriting any existing object.
    ///
    /// Implementations must validate `key` with
    /// [`validate_key`](crate::validate_key) before use.
    ///
    /// ```no_run
    /// use std::path::Path;
    /// use sitesync_storage::PutOptions;
    /// # use sitesync_storage::{ObjectStore, error::Result};
    /// # async fn example(store: &dyn ObjectStore) -> Result<()> {
    /// let options = PutOptions {
    ///     content_type: "text/html".to_string(),
    ///     content_encoding: None,
    ///     cache_control: "max-age=900".to_string(),
    ///     acl: Some("public-read".to_string()),
    /// };
    /// store.put("index.html", Path::new("public/index.html"), &options).await?;
    /// # Ok(())
    /// # }
    /// ```
    async fn put(&self, key: &str, body: &Path, options: &PutOptions) -> Result<()>;
}
