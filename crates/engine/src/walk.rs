//! Local file discovery.

use crate::error::{ErrorKind, Result};
use async_stream::stream;
use futures::Stream;
use std::path::{Component, Path, PathBuf};
use std::pin::Pin;
use tokio::fs::{self, DirEntry};

pub type LocalFileStream = Pin<Box<dyn Stream<Item = Result<LocalFile>> + Send>>;

/// A regular file found under the sync root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    /// Absolute (or root-joined) path to read the content from
    pub path: PathBuf,
    /// Path relative to the root, `/`-separated, no leading slash
    pub key: String,
    pub size: u64,
    /// Lowercase extension without the dot; empty when there is none
    pub extension: String,
}

enum WalkEntry {
    File(LocalFile),
    Descend(PathBuf),
    Skip,
}

/// Walk `root`, yielding every non-hidden regular file beneath it.
///
/// Entries whose name starts with `.` are skipped, and hidden directories are
/// not descended into. Symbolic links are followed to regular files only.
/// The stream is lazy: directories are read as the consumer pulls.
///
/// A directory that cannot be read (the root included) yields an error item
/// and ends the stream.
pub fn walk(root: impl Into<PathBuf>) -> LocalFileStream {
    let root = root.into();
    let mut stack = vec![root.clone()];

    Box::pin(stream! {
        while let Some(current) = stack.pop() {
            let mut entries = match fs::read_dir(&current).await {
                Ok(entries) => entries,
                Err(err) => {
                    yield Err(exn::Exn::from(err).raise(ErrorKind::Walk(current)));
                    return;
                },
            };
            loop {
                let entry = match entries.next_entry().await {
                    Ok(Some(entry)) => entry,
                    Ok(None) => break,
                    Err(err) => {
                        yield Err(exn::Exn::from(err).raise(ErrorKind::Walk(current)));
                        return;
                    },
                };
                match process_entry(&root, entry).await {
                    WalkEntry::File(file) => yield Ok(file),
                    WalkEntry::Descend(dir) => stack.push(dir),
                    WalkEntry::Skip => {},
                }
            }
        }
    })
}

async fn process_entry(root: &Path, entry: DirEntry) -> WalkEntry {
    let path = entry.path();
    if entry.file_name().as_encoded_bytes().starts_with(b".") {
        tracing::trace!(path = %path.display(), "Skipping hidden entry");
        return WalkEntry::Skip;
    }
    let file_type = match entry.file_type().await {
        Ok(file_type) => file_type,
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "Unable to stat entry; skipping");
            return WalkEntry::Skip;
        },
    };
    if file_type.is_dir() {
        return WalkEntry::Descend(path);
    }
    // Follows symbolic links.
    let metadata = match fs::metadata(&path).await {
        Ok(metadata) => metadata,
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "Broken symbolic link; skipping");
            return WalkEntry::Skip;
        },
    };
    if metadata.is_dir() {
        tracing::debug!(path = %path.display(), "Not descending into symbolic link to directory");
        return WalkEntry::Skip;
    }
    if !metadata.is_file() {
        tracing::debug!(path = %path.display(), "Not a regular file; skipping");
        return WalkEntry::Skip;
    }
    let Some(key) = object_key(root, &path) else {
        tracing::warn!(path = %path.display(), "Path is not valid UTF-8 and cannot be used as an object key; skipping");
        return WalkEntry::Skip;
    };
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    WalkEntry::File(LocalFile { path, key, size: metadata.len(), extension })
}

/// The `/`-separated path of `path` relative to `root`.
fn object_key(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts = relative
        .components()
        .map(|component| match component {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()?;
    (!parts.is_empty()).then(|| parts.join("/"))
}
