//! Engine lifecycle errors.

use super::ConfigError;

/// Misconfiguration surfaced while building or starting an engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("engine configured with zero workers")]
    NoWorkers,

    #[error("engine must be started from within a tokio runtime")]
    NoRuntime,

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}
