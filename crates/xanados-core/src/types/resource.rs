//! Resource classes gated by admission control.

use serde::{Deserialize, Serialize};

/// One of the fixed resource pools a scan may need a permit for.
///
/// Declaration order is the global acquisition order: a task that needs
/// several permits always takes them in this order, so two tasks can never
/// wait on each other's pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    FileIo,
    Network,
    MlComputation,
    ThreatAnalysis,
    Database,
    Cache,
    Gpu,
    CpuIntensive,
}

impl ResourceKind {
    /// Number of resource classes.
    pub const COUNT: usize = 8;

    /// Every resource class, in acquisition order.
    pub const ALL: [ResourceKind; Self::COUNT] = [
        ResourceKind::FileIo,
        ResourceKind::Network,
        ResourceKind::MlComputation,
        ResourceKind::ThreatAnalysis,
        ResourceKind::Database,
        ResourceKind::Cache,
        ResourceKind::Gpu,
        ResourceKind::CpuIntensive,
    ];

    /// Dense index into per-kind arrays.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::FileIo => "file_io",
            Self::Network => "network",
            Self::MlComputation => "ml_computation",
            Self::ThreatAnalysis => "threat_analysis",
            Self::Database => "database",
            Self::Cache => "cache",
            Self::Gpu => "gpu",
            Self::CpuIntensive => "cpu_intensive",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_matches_position_in_all() {
        for (i, kind) in ResourceKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn ordering_follows_declaration() {
        assert!(ResourceKind::FileIo < ResourceKind::MlComputation);
        assert!(ResourceKind::ThreatAnalysis < ResourceKind::CpuIntensive);
    }
}
