//! Cheap change detection: path + mtime + size, no content hashing.

use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Cache key for a file's scan result.
///
/// A changed mtime or size yields a different fingerprint, so stale results
/// are never served. When metadata cannot be read the path alone is used,
/// which gives up change detection for that file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Fingerprint {
    Metadata {
        path: PathBuf,
        mtime_secs: i64,
        mtime_nanos: u32,
        size: u64,
    },
    PathOnly(PathBuf),
}

impl Fingerprint {
    pub fn from_metadata(path: impl Into<PathBuf>, metadata: &Metadata) -> Self {
        let (mtime_secs, mtime_nanos) = metadata
            .modified()
            .map(|m| mtime_parts(&m))
            .unwrap_or((0, 0));
        Self::Metadata {
            path: path.into(),
            mtime_secs,
            mtime_nanos,
            size: metadata.len(),
        }
    }

    /// Fingerprint the file as it is on disk now.
    pub fn probe(path: &Path) -> Self {
        match std::fs::metadata(path) {
            Ok(metadata) => Self::from_metadata(path, &metadata),
            Err(_) => Self::PathOnly(path.to_path_buf()),
        }
    }

    /// Async variant of [`Fingerprint::probe`] for use on the executor.
    pub async fn probe_async(path: &Path) -> Self {
        match tokio::fs::metadata(path).await {
            Ok(metadata) => Self::from_metadata(path, &metadata),
            Err(_) => Self::PathOnly(path.to_path_buf()),
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Metadata { path, .. } | Self::PathOnly(path) => path,
        }
    }

    /// File size, when metadata was available.
    pub fn size(&self) -> Option<u64> {
        match self {
            Self::Metadata { size, .. } => Some(*size),
            Self::PathOnly(_) => None,
        }
    }
}

/// Extract mtime as (seconds, nanoseconds) from SystemTime.
fn mtime_parts(mtime: &SystemTime) -> (i64, u32) {
    match mtime.duration_since(std::time::UNIX_EPOCH) {
        Ok(d) => (d.as_secs() as i64, d.subsec_nanos()),
        Err(_) => (0, 0),
    }
}
