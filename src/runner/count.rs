//! Count-based runner

use super::{InvocationCounter, InvocationRunner, RunnerContext};
use crate::Result;

/// Executes invocations while slots of a shared counter can be claimed
pub struct CountRunner {
    context: RunnerContext,
    counter: InvocationCounter,
    executions: u64,
    closed: bool,
}

impl CountRunner {
    pub fn new(context: RunnerContext, counter: InvocationCounter) -> Self {
        Self {
            context,
            counter,
            executions: 0,
            closed: false,
        }
    }
}

impl InvocationRunner for CountRunner {
    fn run(&mut self) -> Result<()> {
        while self.counter.try_claim() {
            let index = self.executions;
            self.executions += 1;
            self.context.invoke_and_wait(index)?;
        }
        tracing::debug!(
            invoker = self.context.invoker.id(),
            executions = self.executions,
            "invocation count exhausted"
        );
        Ok(())
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            tracing::trace!(invoker = self.context.invoker.id(), "count runner closed");
        }
    }

    fn executions(&self) -> u64 {
        self.executions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::testing::counting_context;
    use crate::PerfRunError;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_runs_exactly_n_times() {
        let calls = Arc::new(AtomicU64::new(0));
        let mut runner = CountRunner::new(counting_context(calls.clone(), None), InvocationCounter::new(5));
        runner.run().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert_eq!(runner.executions(), 5);
    }

    #[test]
    fn test_zero_invocations_returns_immediately() {
        let calls = Arc::new(AtomicU64::new(0));
        let mut runner = CountRunner::new(counting_context(calls.clone(), None), InvocationCounter::new(0));
        runner.run().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_failure_stops_without_consuming_more_slots() {
        let calls = Arc::new(AtomicU64::new(0));
        let counter = InvocationCounter::new(10);
        let mut runner = CountRunner::new(counting_context(calls.clone(), Some(3)), counter.clone());

        let err = runner.run().unwrap_err();
        assert!(matches!(err, PerfRunError::InvocationFailed { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(counter.remaining(), 7);
    }

    #[test]
    fn test_close_is_idempotent() {
        let calls = Arc::new(AtomicU64::new(0));
        let mut runner = CountRunner::new(counting_context(calls, None), InvocationCounter::new(1));
        runner.close();
        runner.close();
        assert!(runner.closed);
    }
}
