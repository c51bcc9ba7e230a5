//! Background task polling host CPU and memory.

use std::sync::Arc;
use std::time::Duration;

use sysinfo::System;
use tokio::task::JoinHandle;
use tracing::{error, info, trace, warn, Instrument};
use xanados_core::tracing::metrics::names;

use super::gauge::PressureGauge;

/// Periodically refreshes `sysinfo` on the blocking pool and publishes the
/// sample to a [`PressureGauge`].
#[derive(Debug)]
pub struct PressureSampler {
    gauge: Arc<PressureGauge>,
    interval: Duration,
}

impl PressureSampler {
    pub fn new(gauge: Arc<PressureGauge>, interval: Duration) -> Self {
        Self { gauge, interval }
    }

    /// Start sampling on the current runtime. Abort the handle to stop.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run().instrument(tracing::info_span!(names::PRESSURE)))
    }

    async fn run(self) {
        info!(interval_ms = self.interval.as_millis() as u64, "pressure sampler started");
        let mut system = System::new();
        loop {
            let sampled = tokio::task::spawn_blocking(move || {
                let sample = sample(&mut system);
                (system, sample)
            })
            .await;

            let (cpu, memory) = match sampled {
                Ok((returned, sample)) => {
                    system = returned;
                    sample
                }
                Err(e) => {
                    error!(error = %e, "pressure sampling failed, sampler exiting");
                    return;
                }
            };

            trace!(cpu_percent = cpu, memory_percent = memory, "pressure sample");
            match self.gauge.publish(cpu, memory) {
                Some(true) => warn!(
                    cpu_percent = cpu,
                    memory_percent = memory,
                    "host under pressure, throttling dispatch"
                ),
                Some(false) => info!(
                    cpu_percent = cpu,
                    memory_percent = memory,
                    "host pressure cleared, resuming dispatch"
                ),
                None => {}
            }

            tokio::time::sleep(self.interval).await;
        }
    }
}

/// CPU usage and memory usage, both in percent.
fn sample(system: &mut System) -> (f32, f32) {
    system.refresh_cpu_usage();
    system.refresh_memory();
    let cpu = system.global_cpu_usage();
    let total = system.total_memory();
    let memory = if total == 0 {
        0.0
    } else {
        (system.used_memory() as f64 / total as f64 * 100.0) as f32
    };
    (cpu, memory)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_is_within_percent_range() {
        let mut system = System::new();
        let (cpu, memory) = sample(&mut system);
        assert!((0.0..=100.0 * 1024.0).contains(&cpu));
        assert!((0.0..=100.0).contains(&memory));
    }

    #[tokio::test]
    async fn sampler_publishes_and_aborts() {
        let gauge = Arc::new(PressureGauge::new(1000.0, 1000.0));
        let handle = PressureSampler::new(Arc::clone(&gauge), Duration::from_millis(10)).spawn();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!gauge.is_throttled());
        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());
    }
}
