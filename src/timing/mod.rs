//! Timing collaborators
//!
//! Clocks the tracker measures latencies with, and wait timers that pace
//! consecutive invocations of a worker.

pub mod clock;
pub mod wait;

// Re-export commonly used types
pub use clock::{Clock, ClockKind, SystemClock};
#[cfg(unix)]
pub use clock::ThreadCpuClock;
pub use wait::{ConstantTimer, CumulatedTimer, NoWait, RandomTimer, WaitTimer, WaitTimerConfig};
