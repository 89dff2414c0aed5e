//! Data models module
//!
//! Contains the serializable snapshot a tracker publishes when tracking stops.

pub mod snapshot;

// Re-export commonly used types
pub use snapshot::{ClockSummary, TrackerSnapshot};
