//! Scan depth, threat level, detector output, and the per-file result.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::resource::ResourceKind;
use crate::errors::DetectionError;

/// Thoroughness tier requested for a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanDepth {
    Quick,
    Full,
    Custom,
    Realtime,
    Deep,
}

impl ScanDepth {
    /// Only quick scans are answered from the result cache. Deeper scans
    /// always run fresh but still refresh the cache.
    pub fn consults_cache(self) -> bool {
        matches!(self, Self::Quick)
    }

    /// Permits a worker must hold while the detector runs, in acquisition order.
    pub fn required_resources(self) -> &'static [ResourceKind] {
        match self {
            Self::Quick | Self::Custom | Self::Realtime => &[ResourceKind::FileIo],
            Self::Full => &[
                ResourceKind::FileIo,
                ResourceKind::MlComputation,
                ResourceKind::ThreatAnalysis,
            ],
            Self::Deep => &[
                ResourceKind::FileIo,
                ResourceKind::MlComputation,
                ResourceKind::ThreatAnalysis,
                ResourceKind::CpuIntensive,
            ],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quick => "quick",
            Self::Full => "full",
            Self::Custom => "custom",
            Self::Realtime => "realtime",
            Self::Deep => "deep",
        }
    }
}

impl std::fmt::Display for ScanDepth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordinal threat classification.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ThreatLevel {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

/// What a detector reports for one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detection {
    pub threat_level: ThreatLevel,
    /// Threat identifiers in the order the detector found them.
    pub threats_found: Vec<String>,
}

impl Detection {
    /// A detection with no findings.
    pub fn clean() -> Self {
        Self::default()
    }

    pub fn with_threats(threat_level: ThreatLevel, threats_found: Vec<String>) -> Self {
        Self {
            threat_level,
            threats_found,
        }
    }
}

/// Outcome of one completed or failed scan request.
///
/// A failed scan has the same shape as a clean one except for `error`;
/// `threat_level` is `Low` on failure, so callers must check `error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    pub path: PathBuf,
    pub scan_depth: ScanDepth,
    pub threat_level: ThreatLevel,
    pub scan_duration_ms: u64,
    pub file_size_bytes: u64,
    pub threats_found: Vec<String>,
    pub error: Option<String>,
}

impl ScanResult {
    /// Build a result from a successful detection.
    pub fn from_detection(
        path: impl Into<PathBuf>,
        scan_depth: ScanDepth,
        file_size_bytes: u64,
        scan_duration_ms: u64,
        detection: Detection,
    ) -> Self {
        Self {
            path: path.into(),
            scan_depth,
            threat_level: detection.threat_level,
            scan_duration_ms,
            file_size_bytes,
            threats_found: detection.threats_found,
            error: None,
        }
    }

    /// Build a failed result carrying the detector error text.
    pub fn failed(
        path: impl Into<PathBuf>,
        scan_depth: ScanDepth,
        file_size_bytes: u64,
        scan_duration_ms: u64,
        error: &DetectionError,
    ) -> Self {
        Self {
            path: path.into(),
            scan_depth,
            threat_level: ThreatLevel::Low,
            scan_duration_ms,
            file_size_bytes,
            threats_found: Vec::new(),
            error: Some(error.to_string()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Whether the detector reported at least one threat.
    pub fn is_infected(&self) -> bool {
        !self.threats_found.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_quick_consults_cache() {
        assert!(ScanDepth::Quick.consults_cache());
        for depth in [
            ScanDepth::Full,
            ScanDepth::Custom,
            ScanDepth::Realtime,
            ScanDepth::Deep,
        ] {
            assert!(!depth.consults_cache(), "{depth} must bypass the cache");
        }
    }

    #[test]
    fn every_depth_needs_file_io_first() {
        for depth in [
            ScanDepth::Quick,
            ScanDepth::Full,
            ScanDepth::Custom,
            ScanDepth::Realtime,
            ScanDepth::Deep,
        ] {
            let kinds = depth.required_resources();
            assert_eq!(kinds[0], ResourceKind::FileIo);
            assert!(kinds.windows(2).all(|w| w[0] < w[1]), "{depth} not in acquisition order");
        }
    }

    #[test]
    fn deep_scans_take_ml_permits() {
        assert!(ScanDepth::Deep
            .required_resources()
            .contains(&ResourceKind::MlComputation));
        assert!(ScanDepth::Full
            .required_resources()
            .contains(&ResourceKind::ThreatAnalysis));
        assert!(!ScanDepth::Quick
            .required_resources()
            .contains(&ResourceKind::MlComputation));
    }

    #[test]
    fn failed_result_is_low_with_error() {
        let err = DetectionError::Failed {
            reason: "engine crashed".to_string(),
        };
        let result = ScanResult::failed("/bad", ScanDepth::Quick, 10, 3, &err);
        assert_eq!(result.threat_level, ThreatLevel::Low);
        assert!(result.is_error());
        assert!(result.error.as_deref().unwrap_or_default().contains("engine crashed"));
        assert!(!result.is_infected());
    }

    #[test]
    fn threat_levels_are_ordered() {
        assert!(ThreatLevel::Low < ThreatLevel::Medium);
        assert!(ThreatLevel::High < ThreatLevel::Critical);
    }
}
