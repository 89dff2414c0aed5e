//! Utility functions module
//!
//! Contains helpers for parsing and formatting durations and rates.

pub mod units;

// Re-export commonly used functions
pub use units::{calculate_throughput, format_duration, format_latency, parse_millis};
