use crate::types::ScanResult;

/// Per-request completion hook supplied by the submitter.
///
/// Invoked exactly once per completed or failed request. A panic inside the
/// hook is caught and logged at the call site.
pub trait ScanCallback: Send + Sync {
    fn on_result(&self, result: &ScanResult);
}

impl<F> ScanCallback for F
where
    F: Fn(&ScanResult) + Send + Sync,
{
    fn on_result(&self, result: &ScanResult) {
        self(result)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::types::{Detection, ScanDepth};

    #[test]
    fn closures_are_callbacks() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let callback: Arc<dyn ScanCallback> = Arc::new(move |_: &ScanResult| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let result =
            ScanResult::from_detection("/tmp/a", ScanDepth::Quick, 1, 1, Detection::clean());
        callback.on_result(&result);
        callback.on_result(&result);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }
}
