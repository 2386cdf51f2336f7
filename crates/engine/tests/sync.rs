use sitesync_cdn::backend::MockCdn;
use sitesync_compress::{Compression, CompressionPolicy};
use sitesync_engine::error::ErrorKind;
use sitesync_engine::{SyncOptions, sync};
use sitesync_storage::backend::MockStore;
use std::path::Path;
use std::sync::Arc;

const LOGO_SIZE: usize = 10 * 1024;

fn write(root: &Path, relative: &str, data: &[u8]) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, data).unwrap();
}

fn index_html() -> Vec<u8> {
    let mut html = b"<!doctype html><html><body>".to_vec();
    html.resize(600 - b"</body></html>".len(), b'x');
    html.extend_from_slice(b"</body></html>");
    html
}

fn logo_png() -> Vec<u8> {
    let mut png = b"\x89PNG\r\n\x1a\n".to_vec();
    png.resize(LOGO_SIZE, 7);
    png
}

/// `index.html` is new; `logo.png` is already stored with identical content.
fn fixture() -> (tempfile::TempDir, Arc<MockStore>, Arc<MockCdn>) {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "index.html", &index_html());
    write(dir.path(), "logo.png", &logo_png());
    let store = Arc::new(MockStore::with_objects([("logo.png", logo_png())]).with_name("example.com"));
    let cdn = Arc::new(MockCdn::with_distributions([
        ("E1", vec!["other.org"]),
        ("E2", vec!["example.com", "www.example.com"]),
    ]));
    (dir, store, cdn)
}

fn paths(report: &sitesync_engine::SyncReport) -> Vec<&str> {
    report.changed.iter().collect()
}

#[tokio::test(flavor = "multi_thread")]
async fn compresses_uploads_and_invalidates_only_changed_files() {
    let (dir, store, cdn) = fixture();
    let options = SyncOptions::new(dir.path(), "example.com");

    let report = sync(store.clone(), cdn.clone(), &options).await.unwrap();
    assert_eq!(paths(&report), vec!["/index.html"]);
    assert_eq!(report.unchanged, 1);
    assert!(report.failed.is_empty());

    let index = store.object("index.html").await.unwrap();
    let put = index.options.unwrap();
    assert_eq!(put.content_encoding.as_deref(), Some("gzip"));
    assert_eq!(put.content_type, "text/html");
    assert_eq!(Compression::Gzip.decompress(&index.data).unwrap(), index_html());
    assert_eq!(store.puts().await, vec!["index.html".to_string()]);

    let receipt = report.invalidation.unwrap();
    assert_eq!(receipt.distribution_id, "E2");
    assert_eq!(receipt.paths, vec!["/index.html".to_string()]);
    assert_eq!(cdn.invalidations().await.len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn reupload_puts_everything() {
    let (dir, store, cdn) = fixture();
    let mut options = SyncOptions::new(dir.path(), "example.com");
    options.upload.force = true;

    let report = sync(store.clone(), cdn.clone(), &options).await.unwrap();
    assert_eq!(paths(&report), vec!["/index.html", "/logo.png"]);
    assert_eq!(report.unchanged, 0);
    // Already-compressed media is stored as-is.
    let logo = store.object("logo.png").await.unwrap();
    assert_eq!(logo.options.unwrap().content_encoding, None);
    assert_eq!(logo.data, logo_png());
    let invalidations = cdn.invalidations().await;
    assert_eq!(invalidations.len(), 1);
    assert_eq!(invalidations[0].1.paths, vec!["/index.html".to_string(), "/logo.png".to_string()]);
}

#[tokio::test(flavor = "multi_thread")]
async fn second_run_changes_nothing() {
    let (dir, store, cdn) = fixture();
    let options = SyncOptions::new(dir.path(), "example.com");

    sync(store.clone(), cdn.clone(), &options).await.unwrap();
    let report = sync(store.clone(), cdn.clone(), &options).await.unwrap();
    assert!(report.changed.is_empty());
    assert_eq!(report.unchanged, 2);
    assert_eq!(report.invalidation, None);
    assert_eq!(store.puts().await.len(), 1);
    assert_eq!(cdn.invalidations().await.len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_distribution_is_fatal_but_uploads_remain() {
    let (dir, store, cdn) = fixture();
    let options = SyncOptions::new(dir.path(), "example.net");

    let err = sync(store.clone(), cdn.clone(), &options).await.unwrap_err();
    assert!(matches!(&*err, ErrorKind::NoDistribution(domain) if domain == "example.net"));
    assert!(store.object("index.html").await.unwrap().options.is_some());
    assert!(cdn.invalidations().await.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_put_is_reported_and_not_invalidated() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.html", b"<p>a</p>");
    write(dir.path(), "b.html", b"<p>b</p>");
    write(dir.path(), "c.html", b"<p>c</p>");
    let store = Arc::new(MockStore::default().failing_put("b.html"));
    let cdn = Arc::new(MockCdn::with_distributions([("E1", vec!["example.com"])]));

    let report = sync(store.clone(), cdn.clone(), &SyncOptions::new(dir.path(), "example.com")).await.unwrap();
    assert_eq!(report.failed, vec!["b.html".to_string()]);
    assert_eq!(paths(&report), vec!["/a.html", "/c.html"]);
    assert_eq!(report.invalidation.unwrap().paths, vec!["/a.html".to_string(), "/c.html".to_string()]);
}

#[tokio::test(flavor = "multi_thread")]
async fn inventory_failure_is_fatal() {
    let (dir, _, cdn) = fixture();
    let store = Arc::new(MockStore::default().missing());
    let err = sync(store.clone(), cdn.clone(), &SyncOptions::new(dir.path(), "example.com")).await.unwrap_err();
    assert!(matches!(&*err, ErrorKind::Inventory));
    assert!(store.puts().await.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn credential_failures_are_classified() {
    let (dir, _, cdn) = fixture();
    let store = Arc::new(MockStore::default().denied());
    let err = sync(store, cdn, &SyncOptions::new(dir.path(), "example.com")).await.unwrap_err();
    assert!(err.is_credentials());
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_site_does_not_invalidate() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), ".hidden/secret.txt", b"nope");
    write(dir.path(), ".DS_Store", b"nope");
    let store = Arc::new(MockStore::default());
    let cdn = Arc::new(MockCdn::with_distributions([("E1", vec!["example.com"])]));

    let report = sync(store.clone(), cdn.clone(), &SyncOptions::new(dir.path(), "example.com")).await.unwrap();
    assert!(report.changed.is_empty());
    assert_eq!(report.unchanged, 0);
    assert!(store.puts().await.is_empty());
    assert_eq!(cdn.pages_served().await, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn dry_run_computes_changes_without_side_effects() {
    let (dir, store, cdn) = fixture();
    let mut options = SyncOptions::new(dir.path(), "example.com");
    options.dry_run = true;

    let report = sync(store.clone(), cdn.clone(), &options).await.unwrap();
    assert_eq!(paths(&report), vec!["/index.html"]);
    assert_eq!(report.invalidation, None);
    assert!(store.puts().await.is_empty());
    assert!(store.object("index.html").await.is_none());
    assert!(cdn.invalidations().await.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn compression_can_be_disabled() {
    let (dir, store, cdn) = fixture();
    let mut options = SyncOptions::new(dir.path(), "example.com");
    options.upload.policy = CompressionPolicy::disabled();

    sync(store.clone(), cdn, &options).await.unwrap();
    let index = store.object("index.html").await.unwrap();
    assert_eq!(index.data, index_html());
    assert_eq!(index.options.unwrap().content_encoding, None);
}

#[tokio::test]
async fn zero_workers_rejected() {
    let (dir, store, cdn) = fixture();
    let mut options = SyncOptions::new(dir.path(), "example.com");
    options.concurrency = 0;
    let err = sync(store.clone(), cdn, &options).await.unwrap_err();
    assert!(matches!(&*err, ErrorKind::InvalidOptions(_)));
    assert!(store.puts().await.is_empty());
}
