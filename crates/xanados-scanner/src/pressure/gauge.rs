//! Last published CPU/memory sample and the throttle flag derived from it.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use xanados_core::config::PressureConfig;
use xanados_core::traits::PressureMonitor;

/// Shared atomics written by the sampler and read by every worker.
#[derive(Debug)]
pub struct PressureGauge {
    cpu_bits: AtomicU32,
    memory_bits: AtomicU32,
    throttled: AtomicBool,
    cpu_threshold: f32,
    memory_threshold: f32,
}

impl PressureGauge {
    pub fn new(cpu_threshold: f32, memory_threshold: f32) -> Self {
        Self {
            cpu_bits: AtomicU32::new(0f32.to_bits()),
            memory_bits: AtomicU32::new(0f32.to_bits()),
            throttled: AtomicBool::new(false),
            cpu_threshold,
            memory_threshold,
        }
    }

    pub fn from_config(config: &PressureConfig) -> Self {
        Self::new(
            config.effective_cpu_threshold(),
            config.effective_memory_threshold(),
        )
    }

    /// Store a new sample. Returns the new throttle flag when it changed.
    pub fn publish(&self, cpu_percent: f32, memory_percent: f32) -> Option<bool> {
        self.cpu_bits.store(cpu_percent.to_bits(), Ordering::Relaxed);
        self.memory_bits
            .store(memory_percent.to_bits(), Ordering::Relaxed);
        let throttle =
            cpu_percent >= self.cpu_threshold || memory_percent >= self.memory_threshold;
        let previous = self.throttled.swap(throttle, Ordering::AcqRel);
        (previous != throttle).then_some(throttle)
    }

    pub fn cpu_percent(&self) -> f32 {
        f32::from_bits(self.cpu_bits.load(Ordering::Relaxed))
    }

    pub fn memory_percent(&self) -> f32 {
        f32::from_bits(self.memory_bits.load(Ordering::Relaxed))
    }

    pub fn is_throttled(&self) -> bool {
        self.throttled.load(Ordering::Acquire)
    }
}

impl PressureMonitor for PressureGauge {
    fn should_throttle(&self) -> bool {
        self.is_throttled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn either_threshold_throttles() {
        let gauge = PressureGauge::new(90.0, 80.0);
        assert_eq!(gauge.publish(95.0, 10.0), Some(true));
        assert!(gauge.should_throttle());
        assert_eq!(gauge.publish(10.0, 85.0), None, "still throttled, no transition");
        assert_eq!(gauge.publish(10.0, 10.0), Some(false));
        assert!(!gauge.should_throttle());
    }

    #[test]
    fn last_sample_is_readable() {
        let gauge = PressureGauge::new(90.0, 90.0);
        gauge.publish(42.5, 61.25);
        assert_eq!(gauge.cpu_percent(), 42.5);
        assert_eq!(gauge.memory_percent(), 61.25);
    }
}
