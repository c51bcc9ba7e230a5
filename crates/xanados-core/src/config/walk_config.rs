//! Directory expansion configuration.

use serde::{Deserialize, Serialize};

use crate::constants;

/// Configuration for expanding a submitted directory into per-file requests.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct WalkConfig {
    /// Files above this size are skipped. Default: 100 MiB.
    pub max_file_size: Option<u64>,
    /// Follow symbolic links while walking. Default: false.
    pub follow_symlinks: Option<bool>,
    /// Extra glob patterns to exclude (matched against the full path).
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Roots never descended into. Default: /proc, /sys, /dev, /run.
    #[serde(default)]
    pub excluded_roots: Vec<String>,
}

impl WalkConfig {
    pub fn effective_max_file_size(&self) -> u64 {
        self.max_file_size
            .unwrap_or(constants::DEFAULT_MAX_FILE_SIZE)
    }

    pub fn effective_follow_symlinks(&self) -> bool {
        self.follow_symlinks.unwrap_or(false)
    }

    /// Returns the configured excluded roots, or the pseudo-filesystem defaults.
    pub fn effective_excluded_roots(&self) -> Vec<String> {
        if self.excluded_roots.is_empty() {
            constants::DEFAULT_EXCLUDED_ROOTS
                .iter()
                .map(|s| s.to_string())
                .collect()
        } else {
            self.excluded_roots.clone()
        }
    }
}
