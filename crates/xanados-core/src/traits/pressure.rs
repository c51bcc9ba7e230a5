/// Host resource signal polled by workers before dispatch.
///
/// Implementations must answer without blocking; sampling happens elsewhere.
pub trait PressureMonitor: Send + Sync {
    /// Whether new dispatch should pause.
    fn should_throttle(&self) -> bool;
}

/// A monitor that never throttles.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unthrottled;

impl PressureMonitor for Unthrottled {
    fn should_throttle(&self) -> bool {
        false
    }
}
