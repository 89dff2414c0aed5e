//! Concurrent fan-out with ramp-up
//!
//! Every sub-runner gets its own OS thread. Worker `i` waits `i * ramp_up`
//! before its loop starts. Threads are scoped to `run`, so none of them can
//! outlive it, even when a worker fails early.

use std::any::Any;
use std::thread;
use std::time::{Duration, Instant};
use super::InvocationRunner;
use crate::{PerfRunError, Result, WORKER_THREAD_PREFIX};

/// Runs a set of runners in parallel, staggering their start
pub struct ConcurrentRunner {
    name: String,
    runners: Vec<Box<dyn InvocationRunner>>,
    ramp_up: Duration,
    closed: bool,
}

impl ConcurrentRunner {
    pub fn new(name: impl Into<String>, runners: Vec<Box<dyn InvocationRunner>>, ramp_up: Duration) -> Self {
        Self {
            name: name.into(),
            runners,
            ramp_up,
            closed: false,
        }
    }

    /// Number of workers
    pub fn worker_count(&self) -> usize {
        self.runners.len()
    }

    /// Invocations started by each worker, in worker order
    pub fn executions_per_worker(&self) -> Vec<u64> {
        self.runners.iter().map(|r| r.executions()).collect()
    }

    fn start_offset(&self, index: usize) -> Duration {
        self.ramp_up
            .saturating_mul(u32::try_from(index).unwrap_or(u32::MAX))
    }
}

impl InvocationRunner for ConcurrentRunner {
    fn run(&mut self) -> Result<()> {
        let started = Instant::now();
        let offsets: Vec<Duration> = (0..self.runners.len()).map(|i| self.start_offset(i)).collect();
        tracing::info!(
            name = %self.name,
            workers = self.runners.len(),
            ramp_up_ms = self.ramp_up.as_millis() as u64,
            "starting workers"
        );

        let name = self.name.as_str();
        let outcomes: Vec<Result<()>> = thread::scope(|scope| {
            let mut handles = Vec::with_capacity(self.runners.len());
            let mut outcomes = Vec::with_capacity(self.runners.len());

            for (index, (runner, offset)) in self.runners.iter_mut().zip(offsets).enumerate() {
                let spawned = thread::Builder::new()
                    .name(format!("{}-{}-{}", WORKER_THREAD_PREFIX, name, index))
                    .spawn_scoped(scope, move || {
                        let begin = started + offset;
                        let now = Instant::now();
                        if begin > now {
                            thread::sleep(begin - now);
                        }
                        tracing::debug!(worker = index, "worker started");
                        let outcome = runner.run();
                        tracing::debug!(
                            worker = index,
                            executions = runner.executions(),
                            failed = outcome.is_err(),
                            "worker finished"
                        );
                        outcome
                    });

                match spawned {
                    Ok(handle) => handles.push(handle),
                    Err(e) => {
                        // workers already spawned still run to completion below
                        outcomes.push(Err(PerfRunError::WorkerError(format!(
                            "Failed to spawn worker {}: {}",
                            index, e
                        ))));
                        break;
                    }
                }
            }

            let mut joined: Vec<Result<()>> = handles
                .into_iter()
                .enumerate()
                .map(|(index, handle)| {
                    handle.join().unwrap_or_else(|payload| {
                        Err(PerfRunError::WorkerError(format!(
                            "Worker {} panicked: {}",
                            index,
                            panic_message(payload.as_ref())
                        )))
                    })
                })
                .collect();
            joined.append(&mut outcomes);
            joined
        });

        first_failure(outcomes)
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        for runner in self.runners.iter_mut() {
            runner.close();
        }
    }

    fn executions(&self) -> u64 {
        self.runners.iter().map(|r| r.executions()).sum()
    }
}

/// Reduce worker outcomes to the failure of the lowest-indexed worker;
/// other failures are only logged
fn first_failure(outcomes: Vec<Result<()>>) -> Result<()> {
    let mut first = None;
    for (index, outcome) in outcomes.into_iter().enumerate() {
        if let Err(err) = outcome {
            if first.is_none() {
                first = Some(err);
            } else {
                tracing::warn!(worker = index, error = %err, "suppressed failure of concurrent worker");
            }
        }
    }
    match first {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
