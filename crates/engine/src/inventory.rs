//! Remote inventory.

use crate::error::{ErrorKind, Result};
use futures::TryStreamExt;
use sitesync_storage::{ObjectStore, RemoteObject};
use std::collections::HashMap;
use tracing::instrument;

/// Every object in the remote store, keyed by object key, with its digest.
///
/// Read once at the start of a sync and shared read-only by all workers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    digests: HashMap<String, String>,
}

impl Inventory {
    /// Read the complete listing of `store`.
    #[instrument(skip(store), fields(bucket = store.name()))]
    pub async fn fetch(store: &dyn ObjectStore) -> Result<Self> {
        let mut inventory = Self::default();
        let mut objects = store.list_stream();
        loop {
            match objects.try_next().await {
                Ok(Some(object)) => inventory.insert(object),
                Ok(None) => break,
                Err(err) => {
                    let kind = if err.is_credentials() { ErrorKind::Credentials } else { ErrorKind::Inventory };
                    return Err(err.raise(kind));
                },
            }
        }
        tracing::info!(bucket = store.name(), objects = inventory.len(), "Fetched remote inventory");
        Ok(inventory)
    }

    fn insert(&mut self, object: RemoteObject) {
        if let Some(previous) = self.digests.insert(object.key.clone(), object.digest) {
            tracing::warn!(key = object.key, previous, "Duplicate key in remote listing; keeping the later entry");
        }
    }

    pub fn digest(&self, key: &str) -> Option<&str> {
        self.digests.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.digests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digests.is_empty()
    }
}
impl FromIterator<RemoteObject> for Inventory {
    fn from_iter<I: IntoIterator<Item = RemoteObject>>(iter: I) -> Self {
        let mut inventory = Self::default();
        for object in iter {
            inventory.insert(object);
        }
        inventory
    }
}
