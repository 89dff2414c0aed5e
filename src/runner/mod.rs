//! Invocation runners
//!
//! A runner repeats an invocation until its stop condition holds. Count
//! runners share an [`InvocationCounter`], timed runners each own a deadline,
//! and a [`ConcurrentRunner`] fans a set of runners out to worker threads.

pub mod concurrent;
pub mod count;
pub mod timed;

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use crate::invoke::Invoker;
use crate::timing::WaitTimer;
use crate::tracker::PerformanceTracker;
use crate::Result;

// Re-export commonly used types
pub use concurrent::ConcurrentRunner;
pub use count::CountRunner;
pub use timed::TimedRunner;

/// One execution loop: run to completion or failure, then release resources
pub trait InvocationRunner: Send {
    /// Execute invocations until the stop condition holds or one fails
    fn run(&mut self) -> Result<()>;

    /// Release resources; calling it again has no effect
    fn close(&mut self);

    /// Invocations started by this runner so far
    fn executions(&self) -> u64;
}

/// Everything a runner needs to execute and pace one invocation
#[derive(Clone)]
pub struct RunnerContext {
    pub invoker: Arc<dyn Invoker>,
    pub tracker: Arc<dyn PerformanceTracker>,
    pub wait_timer: Arc<dyn WaitTimer>,
}

impl RunnerContext {
    pub fn new(
        invoker: Arc<dyn Invoker>,
        tracker: Arc<dyn PerformanceTracker>,
        wait_timer: Arc<dyn WaitTimer>,
    ) -> Self {
        Self {
            invoker,
            tracker,
            wait_timer,
        }
    }

    /// Invoke through the tracker, then sleep for the pacing delay
    pub(crate) fn invoke_and_wait(&self, invocation_index: u64) -> Result<()> {
        self.tracker.invoke(self.invoker.as_ref())?;
        let delay = self.wait_timer.delay_for(invocation_index);
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        Ok(())
    }
}

/// Invocation budget shared by sibling count runners
#[derive(Debug, Clone)]
pub struct InvocationCounter {
    remaining: Arc<AtomicI64>,
}

impl InvocationCounter {
    pub fn new(invocations: u64) -> Self {
        let initial = i64::try_from(invocations).unwrap_or(i64::MAX);
        Self {
            remaining: Arc::new(AtomicI64::new(initial)),
        }
    }

    /// Claim one invocation slot
    ///
    /// A single atomic decrement; a negative result means the budget was
    /// already exhausted and nothing may be executed.
    pub fn try_claim(&self) -> bool {
        self.remaining.fetch_sub(1, Ordering::AcqRel) - 1 >= 0
    }

    /// Slots not yet claimed
    pub fn remaining(&self) -> u64 {
        self.remaining.load(Ordering::Acquire).max(0) as u64
    }
}
