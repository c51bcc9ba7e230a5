//! Configuration system.
//! TOML-based, 4-layer resolution: CLI > env > project > user > defaults.

pub mod cache_config;
pub mod engine_config;
pub mod pressure_config;
pub mod resource_config;
pub mod scanner_config;
pub mod walk_config;

pub use cache_config::CacheConfig;
pub use engine_config::EngineConfig;
pub use pressure_config::PressureConfig;
pub use resource_config::ResourceConfig;
pub use scanner_config::{CliOverrides, ScannerConfig};
pub use walk_config::WalkConfig;
