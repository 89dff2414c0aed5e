//! Latency clocks
//!
//! A clock returns a monotonically increasing reading; the tracker takes the
//! difference between two readings around an invocation as its latency.

use std::sync::Arc;
use std::time::{Duration, Instant};
use serde::{Deserialize, Serialize};
use crate::Result;

/// Source of time readings used for latency measurement
pub trait Clock: Send + Sync {
    /// Short name used as key for recorded samples
    fn name(&self) -> &'static str;

    /// Current reading, relative to an arbitrary fixed origin
    fn now(&self) -> Duration;
}

/// Wall-clock time based on the monotonic [`Instant`]
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn name(&self) -> &'static str {
        "system"
    }

    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// CPU time consumed by the calling thread
///
/// Readings are per thread, so start and stop must be taken on the same
/// thread. Runners always invoke on the worker's own thread.
#[cfg(unix)]
#[derive(Debug, Clone, Default)]
pub struct ThreadCpuClock;

#[cfg(unix)]
impl Clock for ThreadCpuClock {
    fn name(&self) -> &'static str {
        "thread-cpu"
    }

    fn now(&self) -> Duration {
        // SAFETY: timespec is plain data; all-zero is a valid value.
        let mut ts: libc::timespec = unsafe { std::mem::zeroed() };
        // SAFETY: `ts` is a valid, writable timespec for the duration of the call.
        let rc = unsafe { libc::clock_gettime(libc::CLOCK_THREAD_CPUTIME_ID, &mut ts) };
        if rc != 0 {
            return Duration::ZERO;
        }
        Duration::new(ts.tv_sec as u64, ts.tv_nsec as u32)
    }
}

/// Serializable clock selector used in [`crate::ExecutionConfig`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClockKind {
    /// Elapsed wall-clock time
    System,
    /// CPU time of the worker thread (unix only)
    ThreadCpu,
}

impl ClockKind {
    /// Instantiate the clock
    pub fn build(&self) -> Result<Arc<dyn Clock>> {
        match self {
            ClockKind::System => Ok(Arc::new(SystemClock::new())),
            #[cfg(unix)]
            ClockKind::ThreadCpu => Ok(Arc::new(ThreadCpuClock)),
            #[cfg(not(unix))]
            ClockKind::ThreadCpu => Err(crate::PerfRunError::ConfigError(
                "thread-cpu clock is only available on unix platforms".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let first = clock.now();
        std::thread::sleep(Duration::from_millis(2));
        let second = clock.now();
        assert!(second > first);
        assert_eq!(clock.name(), "system");
    }

    #[cfg(unix)]
    #[test]
    fn test_thread_cpu_clock_advances_under_load() {
        let clock = ThreadCpuClock;
        let start = clock.now();
        let mut acc = 0u64;
        for i in 0..2_000_000u64 {
            acc = acc.wrapping_mul(31).wrapping_add(i);
        }
        std::hint::black_box(acc);
        assert!(clock.now() >= start);
    }

    #[test]
    fn test_clock_kind_deserializes_kebab_case() {
        #[derive(Deserialize)]
        struct Wrapper {
            clocks: Vec<ClockKind>,
        }
        let parsed: Wrapper = toml::from_str(r#"clocks = ["system", "thread-cpu"]"#).unwrap();
        assert_eq!(parsed.clocks, vec![ClockKind::System, ClockKind::ThreadCpu]);
        assert_eq!(ClockKind::System.build().unwrap().name(), "system");
    }
}
