use std::future::Future;
use std::path::Path;

use crate::errors::DetectionError;
use crate::types::{Detection, ScanDepth};

/// Threat detection capability invoked by scan workers.
///
/// May be backed by a signature scanner, an ML classifier, or both. Blocking
/// work (file reads, hashing) should be moved off the async executor by the
/// implementation. A returned error or a panic becomes a failed `ScanResult`
/// for that file only.
pub trait Detector: Send + Sync + 'static {
    /// Scan one file at the requested depth.
    fn scan(
        &self,
        path: &Path,
        depth: ScanDepth,
    ) -> impl Future<Output = Result<Detection, DetectionError>> + Send;

    /// Human-readable detector name.
    fn name(&self) -> &str;
}
