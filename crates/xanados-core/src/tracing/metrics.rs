//! Span names and span helpers for scan telemetry.
//!
//! Using consistent span names keeps log queries uniform across the
//! scheduler, directory expansion, and pressure sampler.

/// Span names as constants for programmatic use.
pub mod names {
    pub const SCAN: &str = "xanados.scan";
    pub const EXPAND: &str = "xanados.expand";
    pub const PRESSURE: &str = "xanados.pressure";
}

/// Create the span wrapping one request's processing.
#[macro_export]
macro_rules! scan_span {
    ($request_id:expr, $path:expr, $depth:expr) => {
        tracing::debug_span!(
            $crate::tracing::metrics::names::SCAN,
            request_id = %$request_id,
            path = %$path.display(),
            depth = %$depth
        )
    };
}
