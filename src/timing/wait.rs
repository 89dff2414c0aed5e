//! Pacing between invocations
//!
//! A worker sleeps for the delay returned by its [`WaitTimer`] after every
//! invocation. Timers are shared by all workers of a run.

use std::sync::Arc;
use std::time::Duration;
use rand::Rng;
use serde::{Deserialize, Serialize};
use crate::{PerfRunError, Result};

/// Determines the pause after an invocation
pub trait WaitTimer: Send + Sync {
    /// Delay to sleep after the invocation with the given index (0-based,
    /// counted per worker)
    fn delay_for(&self, invocation_index: u64) -> Duration;
}

/// No pause at all
#[derive(Debug, Clone, Copy, Default)]
pub struct NoWait;

impl WaitTimer for NoWait {
    fn delay_for(&self, _invocation_index: u64) -> Duration {
        Duration::ZERO
    }
}

/// The same pause after every invocation
#[derive(Debug, Clone, Copy)]
pub struct ConstantTimer {
    delay: Duration,
}

impl ConstantTimer {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl WaitTimer for ConstantTimer {
    fn delay_for(&self, _invocation_index: u64) -> Duration {
        self.delay
    }
}

/// A uniformly distributed pause in `[min, max]`
#[derive(Debug, Clone, Copy)]
pub struct RandomTimer {
    min: Duration,
    max: Duration,
}

impl RandomTimer {
    pub fn new(min: Duration, max: Duration) -> Result<Self> {
        if min > max {
            return Err(PerfRunError::ConfigError(format!(
                "random wait timer minimum ({} ms) exceeds maximum ({} ms)",
                min.as_millis(),
                max.as_millis()
            )));
        }
        Ok(Self { min, max })
    }
}

impl WaitTimer for RandomTimer {
    fn delay_for(&self, _invocation_index: u64) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        let nanos = rand::thread_rng().gen_range(self.min.as_nanos()..=self.max.as_nanos());
        Duration::from_nanos(nanos as u64)
    }
}

/// A pause growing linearly with the invocation index
#[derive(Debug, Clone, Copy)]
pub struct CumulatedTimer {
    initial: Duration,
    increment: Duration,
}

impl CumulatedTimer {
    pub fn new(initial: Duration, increment: Duration) -> Self {
        Self { initial, increment }
    }
}

impl WaitTimer for CumulatedTimer {
    fn delay_for(&self, invocation_index: u64) -> Duration {
        let steps = u32::try_from(invocation_index).unwrap_or(u32::MAX);
        self.initial
            .saturating_add(self.increment.saturating_mul(steps))
    }
}

/// Serializable wait timer selector, delays in milliseconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum WaitTimerConfig {
    /// Invoke back to back
    #[default]
    None,
    /// Fixed pause
    Constant { delay: u64 },
    /// Uniformly random pause
    Random { min: u64, max: u64 },
    /// `initial + index * increment`
    Cumulated { initial: u64, increment: u64 },
}

impl WaitTimerConfig {
    /// Instantiate the timer
    pub fn build(&self) -> Result<Arc<dyn WaitTimer>> {
        let timer: Arc<dyn WaitTimer> = match *self {
            WaitTimerConfig::None => Arc::new(NoWait),
            WaitTimerConfig::Constant { delay } => {
                Arc::new(ConstantTimer::new(Duration::from_millis(delay)))
            }
            WaitTimerConfig::Random { min, max } => Arc::new(RandomTimer::new(
                Duration::from_millis(min),
                Duration::from_millis(max),
            )?),
            WaitTimerConfig::Cumulated { initial, increment } => Arc::new(CumulatedTimer::new(
                Duration::from_millis(initial),
                Duration::from_millis(increment),
            )),
        };
        Ok(timer)
    }
}
