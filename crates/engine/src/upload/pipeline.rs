use crate::error::{ErrorKind, Result};
use crate::inventory::Inventory;
use crate::report::ChangedKeys;
use crate::upload::{FileOutcome, UploadSettings, upload_file};
use crate::walk::{LocalFile, LocalFileStream, walk};
use exn::ResultExt;
use futures::TryStreamExt;
use sitesync_storage::StoreHandle;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

/// Everything the collector saw, once every worker has finished.
#[derive(Debug, Default)]
pub(crate) struct Collected {
    pub changed: ChangedKeys,
    pub unchanged: u64,
    pub failed: Vec<String>,
}
impl Collected {
    fn record(&mut self, outcome: FileOutcome) {
        match outcome {
            FileOutcome::Uploaded { path, .. } => {
                if !self.changed.insert(path) {
                    tracing::warn!("Same path uploaded twice in one run");
                }
            },
            FileOutcome::Unchanged { .. } => self.unchanged += 1,
            FileOutcome::Failed { key } => self.failed.push(key),
        }
    }
}

/// Walk `root` and upload what changed using `concurrency` workers.
///
/// One producer feeds a bounded queue of `queue_capacity` files; the workers
/// drain it and report each outcome to a single collector. Returns once the
/// producer has ended, every worker has been joined and the collector has
/// drained its channel. A walk failure is only reported after that point, so
/// uploads already in flight are allowed to finish.
pub(crate) async fn run(
    store: StoreHandle,
    inventory: Arc<Inventory>,
    settings: Arc<UploadSettings>,
    root: PathBuf,
    concurrency: usize,
    queue_capacity: usize,
) -> Result<Collected> {
    run_files(store, inventory, settings, walk(root), concurrency, queue_capacity).await
}

async fn run_files(
    store: StoreHandle,
    inventory: Arc<Inventory>,
    settings: Arc<UploadSettings>,
    mut files: LocalFileStream,
    concurrency: usize,
    queue_capacity: usize,
) -> Result<Collected> {
    let (work_tx, work_rx) = async_channel::bounded::<LocalFile>(queue_capacity);
    let (outcome_tx, mut outcome_rx) = mpsc::channel::<FileOutcome>(queue_capacity);

    let producer = tokio::spawn(async move {
        let mut discovered = 0_u64;
        while let Some(file) = files.try_next().await? {
            discovered += 1;
            if work_tx.send(file).await.is_err() {
                // Every worker is gone; nothing left to feed.
                break;
            }
        }
        Ok::<_, crate::error::Error>(discovered)
    });

    let mut workers = JoinSet::new();
    for worker in 0..concurrency {
        let (work_rx, outcome_tx) = (work_rx.clone(), outcome_tx.clone());
        let (store, inventory, settings) = (store.clone(), inventory.clone(), settings.clone());
        workers.spawn(async move {
            let mut processed = 0_u64;
            while let Ok(file) = work_rx.recv().await {
                let outcome = upload_file(store.as_ref(), &inventory, &settings, file).await;
                processed += 1;
                if outcome_tx.send(outcome).await.is_err() {
                    break;
                }
            }
            tracing::debug!(worker, processed, "Worker finished");
        });
    }
    // Only the tasks may hold channel ends, or nothing would ever close.
    drop(work_rx);
    drop(outcome_tx);

    let collector = tokio::spawn(async move {
        let mut collected = Collected::default();
        while let Some(outcome) = outcome_rx.recv().await {
            collected.record(outcome);
        }
        collected
    });

    let mut aborted = None;
    while let Some(joined) = workers.join_next().await {
        if let Err(err) = joined {
            tracing::error!(%err, "Upload worker aborted");
            aborted = Some(err);
        }
    }
    let produced = producer.await.or_raise(|| ErrorKind::Pipeline)?;
    let collected = collector.await.or_raise(|| ErrorKind::Pipeline)?;
    if let Some(err) = aborted {
        return Err(err).or_raise(|| ErrorKind::Pipeline);
    }

    match produced {
        Ok(discovered) => {
            tracing::debug!(discovered, uploaded = collected.changed.len(), "Upload pipeline finished");
            Ok(collected)
        },
        Err(err) => {
            tracing::warn!(
                uploaded = collected.changed.len(),
                "Local files could not all be read; uploads made so far will not be invalidated",
            );
            Err(err)
        },
    }
}
