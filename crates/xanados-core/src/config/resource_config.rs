//! Resource pool limit overrides.

use serde::{Deserialize, Serialize};

use crate::types::ResourceKind;

/// Per-class concurrency limits. Any value set here replaces the limit
/// derived from host capacity.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ResourceConfig {
    pub file_io: Option<usize>,
    pub network: Option<usize>,
    pub ml_computation: Option<usize>,
    pub threat_analysis: Option<usize>,
    pub database: Option<usize>,
    pub cache: Option<usize>,
    pub gpu: Option<usize>,
    pub cpu_intensive: Option<usize>,
}

impl ResourceConfig {
    /// The override for `kind`, if any.
    pub fn limit_for(&self, kind: ResourceKind) -> Option<usize> {
        match kind {
            ResourceKind::FileIo => self.file_io,
            ResourceKind::Network => self.network,
            ResourceKind::MlComputation => self.ml_computation,
            ResourceKind::ThreatAnalysis => self.threat_analysis,
            ResourceKind::Database => self.database,
            ResourceKind::Cache => self.cache,
            ResourceKind::Gpu => self.gpu,
            ResourceKind::CpuIntensive => self.cpu_intensive,
        }
    }

    /// Set the override for `kind`.
    pub fn set_limit(&mut self, kind: ResourceKind, limit: Option<usize>) {
        let slot = match kind {
            ResourceKind::FileIo => &mut self.file_io,
            ResourceKind::Network => &mut self.network,
            ResourceKind::MlComputation => &mut self.ml_computation,
            ResourceKind::ThreatAnalysis => &mut self.threat_analysis,
            ResourceKind::Database => &mut self.database,
            ResourceKind::Cache => &mut self.cache,
            ResourceKind::Gpu => &mut self.gpu,
            ResourceKind::CpuIntensive => &mut self.cpu_intensive,
        };
        *slot = limit;
    }
}
