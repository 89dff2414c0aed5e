//! Time-based runner

use std::time::{Duration, Instant};
use super::{InvocationRunner, RunnerContext};
use crate::Result;

/// Executes invocations until its own run window has elapsed
///
/// The deadline is fixed when `run` is entered, so a worker that starts late
/// because of ramp-up still gets its full window.
pub struct TimedRunner {
    context: RunnerContext,
    run_for: Duration,
    executions: u64,
    closed: bool,
}

impl TimedRunner {
    pub fn new(context: RunnerContext, run_for: Duration) -> Self {
        Self {
            context,
            run_for,
            executions: 0,
            closed: false,
        }
    }
}

impl InvocationRunner for TimedRunner {
    fn run(&mut self) -> Result<()> {
        let deadline = Instant::now() + self.run_for;
        // checked before each invocation; an invocation in flight may overrun
        while Instant::now() < deadline {
            let index = self.executions;
            self.executions += 1;
            self.context.invoke_and_wait(index)?;
        }
        tracing::debug!(
            invoker = self.context.invoker.id(),
            executions = self.executions,
            run_for_ms = self.run_for.as_millis() as u64,
            "run window elapsed"
        );
        Ok(())
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            tracing::trace!(invoker = self.context.invoker.id(), "timed runner closed");
        }
    }

    fn executions(&self) -> u64 {
        self.executions
    }
}
