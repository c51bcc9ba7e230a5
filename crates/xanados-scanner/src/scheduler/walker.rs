//! Directory expansion with exclusion rules, walked off the async executor.

use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};
use xanados_core::config::WalkConfig;
use xanados_core::constants::VCS_DIRS;
use xanados_core::errors::ConfigError;

/// Exclusion rules applied while expanding a directory submission.
#[derive(Debug, Clone)]
pub struct WalkFilter {
    max_file_size: u64,
    follow_symlinks: bool,
    excluded_roots: Vec<PathBuf>,
    exclude: GlobSet,
}

impl WalkFilter {
    /// Build from config. An invalid glob is a configuration error.
    pub fn from_config(config: &WalkConfig) -> Result<Self, ConfigError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &config.exclude {
            let glob = Glob::new(pattern).map_err(|e| ConfigError::ValidationFailed {
                field: "walk.exclude".to_string(),
                message: format!("invalid glob {pattern:?}: {e}"),
            })?;
            builder.add(glob);
        }
        let exclude = builder.build().map_err(|e| ConfigError::ValidationFailed {
            field: "walk.exclude".to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            max_file_size: config.effective_max_file_size(),
            follow_symlinks: config.effective_follow_symlinks(),
            excluded_roots: config
                .effective_excluded_roots()
                .into_iter()
                .map(PathBuf::from)
                .collect(),
            exclude,
        })
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Whether `path` lies under a pseudo-filesystem root.
    pub fn is_excluded_root(&self, path: &Path) -> bool {
        self.excluded_roots.iter().any(|root| path.starts_with(root))
    }

    /// Directories and files never descended into or enqueued.
    fn prunes(&self, entry: &DirEntry) -> bool {
        if self.is_excluded_root(entry.path()) {
            return true;
        }
        if entry.file_type().is_dir()
            && entry
                .file_name()
                .to_str()
                .is_some_and(|name| VCS_DIRS.contains(&name))
        {
            return true;
        }
        self.exclude.is_match(entry.path())
    }
}

/// A regular file found during expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedFile {
    pub path: PathBuf,
    pub size: u64,
}

/// Result of expanding one directory.
#[derive(Debug, Default)]
pub struct Expansion {
    pub files: Vec<ExpandedFile>,
    /// Oversized files and unreadable entries.
    pub skipped: usize,
}

/// Enumerate the regular files under `root` and collect them.
pub async fn expand(root: &Path, filter: &WalkFilter, batch_size: usize) -> Expansion {
    let mut files = Vec::new();
    let skipped = expand_with(root, filter, batch_size, |file| files.push(file)).await;
    Expansion { files, skipped }
}

/// Walk `root` on the blocking pool, handing each regular file to `on_file`
/// as batches of `batch_size` arrive. The caller yields between batches so
/// a large tree never monopolizes a runtime thread. Returns the number of
/// skipped entries.
pub async fn expand_with<F>(
    root: &Path,
    filter: &WalkFilter,
    batch_size: usize,
    mut on_file: F,
) -> usize
where
    F: FnMut(ExpandedFile),
{
    let batch_size = batch_size.max(1);
    let (tx, mut rx) = mpsc::channel(BATCHES_IN_FLIGHT);
    let root = root.to_path_buf();
    let filter = filter.clone();
    let walker = tokio::task::spawn_blocking(move || walk(&root, &filter, batch_size, &tx));

    while let Some(batch) = rx.recv().await {
        for file in batch {
            on_file(file);
        }
        tokio::task::yield_now().await;
    }

    match walker.await {
        Ok(skipped) => skipped,
        Err(e) => {
            warn!(error = %e, "directory walk failed");
            0
        }
    }
}

/// Batches buffered between the walking thread and the async receiver.
const BATCHES_IN_FLIGHT: usize = 2;

fn walk(
    root: &Path,
    filter: &WalkFilter,
    batch_size: usize,
    tx: &mpsc::Sender<Vec<ExpandedFile>>,
) -> usize {
    let mut skipped = 0usize;
    let mut batch = Vec::with_capacity(batch_size);

    let entries = WalkDir::new(root)
        .follow_links(filter.follow_symlinks)
        .into_iter()
        .filter_entry(|entry| !filter.prunes(entry));

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!(error = %e, "skipping unreadable entry");
                skipped += 1;
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let size = match entry.metadata() {
            Ok(metadata) => metadata.len(),
            Err(e) => {
                debug!(path = %entry.path().display(), error = %e, "skipping file without metadata");
                skipped += 1;
                continue;
            }
        };
        if size > filter.max_file_size {
            debug!(path = %entry.path().display(), size, "skipping oversized file");
            skipped += 1;
            continue;
        }

        batch.push(ExpandedFile {
            path: entry.into_path(),
            size,
        });
        if batch.len() >= batch_size {
            let full = std::mem::replace(&mut batch, Vec::with_capacity(batch_size));
            // The receiver is gone only when the submitting task was dropped.
            if tx.blocking_send(full).is_err() {
                return skipped;
            }
        }
    }

    if !batch.is_empty() {
        let _ = tx.blocking_send(batch);
    }
    skipped
}
