//! Error handling for the scan engine.
//! One error enum per subsystem, `thiserror` only.

pub mod config_error;
pub mod detection_error;
pub mod engine_error;
pub mod resource_error;

pub use config_error::ConfigError;
pub use detection_error::DetectionError;
pub use engine_error::EngineError;
pub use resource_error::ResourceError;
