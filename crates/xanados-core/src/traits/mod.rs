//! Capability seams. The engine consumes these; it never implements them.

pub mod callback;
pub mod detector;
pub mod pressure;

pub use callback::ScanCallback;
pub use detector::Detector;
pub use pressure::{PressureMonitor, Unthrottled};
