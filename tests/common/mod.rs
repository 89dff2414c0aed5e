#![allow(dead_code)]

use perfrun::{BoxError, FnInvoker, Invoker, PerfRunError, PerformanceTracker, Result};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Tracker that counts lifecycle calls
#[derive(Default)]
pub struct RecordingTracker {
    never_start: bool,
    started: AtomicBool,
    pub invocations: AtomicU64,
    pub stop_calls: AtomicU64,
    pub clear_calls: AtomicU64,
}

impl RecordingTracker {
    /// Tracker whose warm-up never ends
    pub fn never_starting() -> Self {
        Self {
            never_start: true,
            ..Self::default()
        }
    }

    pub fn stops(&self) -> u64 {
        self.stop_calls.load(Ordering::SeqCst)
    }

    pub fn clears(&self) -> u64 {
        self.clear_calls.load(Ordering::SeqCst)
    }
}

impl PerformanceTracker for RecordingTracker {
    fn invoke(&self, invoker: &dyn Invoker) -> Result<()> {
        if !self.never_start {
            self.started.store(true, Ordering::SeqCst);
        }
        self.invocations.fetch_add(1, Ordering::SeqCst);
        invoker
            .invoke()
            .map_err(|source| PerfRunError::InvocationFailed {
                invoker: invoker.id().to_string(),
                source,
            })
    }

    fn is_tracking_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    fn stop_tracking(&self) {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn clear(&self) {
        self.clear_calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// Invoker counting its calls
pub fn counting_invoker(calls: Arc<AtomicU64>) -> impl Invoker + 'static {
    FnInvoker::new("counting", move || {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok::<(), BoxError>(())
    })
}
