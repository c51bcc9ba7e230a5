//! Dispatch priority assigned at submission time.

use serde::{Deserialize, Serialize};

/// Ordinal scan priority. Lower rank is served first.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ScanPriority {
    /// Executables, scripts, and anything under a system binary directory.
    Critical = 1,
    /// Office and document formats, and files in user home/download areas.
    High = 2,
    /// Archives.
    Medium = 3,
    /// Media, and files under temp/cache directories.
    Low = 4,
    /// Bulk work with no signal either way.
    #[default]
    Background = 5,
}

impl ScanPriority {
    /// Numeric rank (1 = highest).
    pub fn rank(self) -> u8 {
        self as u8
    }
}

impl std::fmt::Display for ScanPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Background => "background",
        };
        f.write_str(name)
    }
}
