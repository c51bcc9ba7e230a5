//! Host pressure: a lock-free gauge read by workers and the background
//! task that feeds it.

pub mod gauge;
pub mod sampler;

pub use gauge::PressureGauge;
pub use sampler::PressureSampler;
