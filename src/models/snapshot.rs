//! Tracker snapshot data models
//!
//! Raw counts and latency sums recorded by [`crate::LatencyTracker`]. No
//! statistical evaluation happens here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// State of a tracker at the moment tracking was stopped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerSnapshot {
    /// Invoker the samples belong to
    pub invoker: String,
    /// When the warm-up period was over and recording began
    pub tracking_started_at: Option<DateTime<Utc>>,
    /// When tracking was stopped
    pub tracking_stopped_at: DateTime<Utc>,
    /// All invocations, including those during warm-up and failed ones
    pub total_invocations: u64,
    /// Invocations that failed
    pub failed_invocations: u64,
    /// One entry per configured clock
    pub clocks: Vec<ClockSummary>,
}

/// Latency samples recorded with one clock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClockSummary {
    /// Clock name
    pub clock: String,
    /// Number of recorded invocations
    pub samples: u64,
    /// Sum of all recorded latencies
    #[serde(with = "duration_serde")]
    pub total: Duration,
    /// Largest recorded latency
    #[serde(with = "duration_serde")]
    pub max: Duration,
}

impl ClockSummary {
    /// Empty summary for the named clock
    pub fn new(clock: impl Into<String>) -> Self {
        Self {
            clock: clock.into(),
            samples: 0,
            total: Duration::ZERO,
            max: Duration::ZERO,
        }
    }

    /// Add one latency sample
    pub fn record(&mut self, latency: Duration) {
        self.samples += 1;
        self.total = self.total.saturating_add(latency);
        self.max = self.max.max(latency);
    }

    /// Arithmetic mean of the samples, zero without samples
    pub fn mean(&self) -> Duration {
        match u32::try_from(self.samples) {
            Ok(0) => Duration::ZERO,
            Ok(n) => self.total / n,
            Err(_) => Duration::from_nanos((self.total.as_nanos() / self.samples as u128) as u64),
        }
    }
}

impl TrackerSnapshot {
    /// Samples recorded with the named clock
    pub fn clock(&self, name: &str) -> Option<&ClockSummary> {
        self.clocks.iter().find(|c| c.clock == name)
    }

    /// Number of invocations recorded after the warm-up
    pub fn tracked_invocations(&self) -> u64 {
        self.clocks.first().map(|c| c.samples).unwrap_or(0)
    }
}

// Durations are stored as nanoseconds
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_nanos().min(u64::MAX as u128) as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let nanos = u64::deserialize(deserializer)?;
        Ok(Duration::from_nanos(nanos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_summary_record_and_mean() {
        let mut summary = ClockSummary::new("system");
        assert_eq!(summary.mean(), Duration::ZERO);

        summary.record(Duration::from_millis(2));
        summary.record(Duration::from_millis(6));
        assert_eq!(summary.samples, 2);
        assert_eq!(summary.total, Duration::from_millis(8));
        assert_eq!(summary.max, Duration::from_millis(6));
        assert_eq!(summary.mean(), Duration::from_millis(4));
    }

    #[test]
    fn test_snapshot_json_uses_nanoseconds() {
        let mut summary = ClockSummary::new("system");
        summary.record(Duration::from_micros(3));
        let snapshot = TrackerSnapshot {
            invoker: "t".to_string(),
            tracking_started_at: None,
            tracking_stopped_at: Utc::now(),
            total_invocations: 1,
            failed_invocations: 0,
            clocks: vec![summary],
        };

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["clocks"][0]["total"], 3000);

        let back: TrackerSnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(back.tracked_invocations(), 1);
        assert_eq!(back.clock("system").unwrap().max, Duration::from_micros(3));
    }
}
