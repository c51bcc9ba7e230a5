//! Detector invocation errors.

use std::path::PathBuf;

/// Why a single file could not be scanned.
///
/// Never aborts the engine: the worker folds it into `ScanResult::error`.
#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("detection failed: {reason}")]
    Failed { reason: String },

    #[error("detection timed out after {timeout_ms}ms")]
    TimedOut { timeout_ms: u64 },

    #[error("detector panicked: {reason}")]
    Panicked { reason: String },

    #[error("IO error scanning {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("resource unavailable: {reason}")]
    ResourceUnavailable { reason: String },
}

impl DetectionError {
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }
}
