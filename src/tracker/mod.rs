//! Performance tracking
//!
//! Runners hand every invocation to a [`PerformanceTracker`], which times it
//! and decides whether the warm-up period is over. The orchestrating
//! [`crate::PerfTest`] owns the stop/clear part of the lifecycle:
//! `idle -> started -> stopped -> cleared`. A cleared tracker is re-armed
//! and starts again once the next run is past its warm-up.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use chrono::{DateTime, Utc};
use crate::config::ExecutionConfig;
use crate::invoke::Invoker;
use crate::models::{ClockSummary, TrackerSnapshot};
use crate::timing::Clock;
use crate::{PerfRunError, Result};

/// Observes invocations executed by the runners
pub trait PerformanceTracker: Send + Sync {
    /// Execute `invoker` once, recording its timing
    fn invoke(&self, invoker: &dyn Invoker) -> Result<()>;

    /// Whether the warm-up period was over at some invocation
    fn is_tracking_started(&self) -> bool;

    /// Finish recording
    fn stop_tracking(&self);

    /// Drop recorded state
    fn clear(&self);
}

/// Lifecycle of a tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingState {
    Idle,
    Started,
    Stopped,
    Cleared,
}

impl TrackingState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => TrackingState::Started,
            2 => TrackingState::Stopped,
            3 => TrackingState::Cleared,
            _ => TrackingState::Idle,
        }
    }
}

#[derive(Debug, Default)]
struct Recording {
    started_at: Option<DateTime<Utc>>,
    clocks: Vec<ClockSummary>,
}

/// Tracker that sums up latencies per clock once the warm-up is over
///
/// The warm-up is measured from construction of the tracker and, after a
/// `clear`, from the first invocation of the next run.
pub struct LatencyTracker {
    invoker_id: String,
    clocks: Vec<Arc<dyn Clock>>,
    warm_up: Duration,
    warm_up_origin: Mutex<Option<Instant>>,
    state: AtomicU8,
    invocations: AtomicU64,
    failures: AtomicU64,
    recording: Mutex<Recording>,
    last_snapshot: Mutex<Option<TrackerSnapshot>>,
}

impl LatencyTracker {
    /// Create a tracker for the given invoker id
    pub fn new(invoker_id: impl Into<String>, clocks: Vec<Arc<dyn Clock>>, warm_up: Duration) -> Self {
        let recording = Recording {
            started_at: None,
            clocks: clocks.iter().map(|c| ClockSummary::new(c.name())).collect(),
        };
        Self {
            invoker_id: invoker_id.into(),
            clocks,
            warm_up,
            warm_up_origin: Mutex::new(Some(Instant::now())),
            state: AtomicU8::new(TrackingState::Idle as u8),
            invocations: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            recording: Mutex::new(recording),
            last_snapshot: Mutex::new(None),
        }
    }

    /// Create a tracker with the clocks and warm-up of `config`
    pub fn from_config(invoker_id: impl Into<String>, config: &ExecutionConfig) -> Result<Self> {
        let clocks = config
            .clocks
            .iter()
            .map(|kind| kind.build())
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(invoker_id, clocks, config.warm_up_duration()))
    }

    /// Current lifecycle state
    pub fn state(&self) -> TrackingState {
        TrackingState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Number of invocations seen so far, warm-up included
    pub fn invocation_count(&self) -> u64 {
        self.invocations.load(Ordering::Relaxed)
    }

    /// Snapshot published by the last `stop_tracking` call
    ///
    /// Survives `clear`, so callers can inspect the results after the run.
    pub fn last_snapshot(&self) -> Option<TrackerSnapshot> {
        lock(&self.last_snapshot).clone()
    }

    fn snapshot(&self) -> TrackerSnapshot {
        let recording = lock(&self.recording);
        TrackerSnapshot {
            invoker: self.invoker_id.clone(),
            tracking_started_at: recording.started_at,
            tracking_stopped_at: Utc::now(),
            total_invocations: self.invocations.load(Ordering::Relaxed),
            failed_invocations: self.failures.load(Ordering::Relaxed),
            clocks: recording.clocks.clone(),
        }
    }

    /// Start tracking if the warm-up is over; the first caller wins
    fn check_warm_up(&self) {
        let current = self.state.load(Ordering::Acquire);
        if current != TrackingState::Idle as u8 && current != TrackingState::Cleared as u8 {
            return;
        }
        let origin = *lock(&self.warm_up_origin).get_or_insert_with(Instant::now);
        if origin.elapsed() < self.warm_up {
            return;
        }
        if self
            .state
            .compare_exchange(
                current,
                TrackingState::Started as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
        {
            lock(&self.recording).started_at = Some(Utc::now());
            tracing::debug!(
                invoker = %self.invoker_id,
                warm_up_ms = self.warm_up.as_millis() as u64,
                "warm-up over, tracking started"
            );
        }
    }
}

impl PerformanceTracker for LatencyTracker {
    fn invoke(&self, invoker: &dyn Invoker) -> Result<()> {
        self.check_warm_up();
        self.invocations.fetch_add(1, Ordering::Relaxed);

        let start: Vec<Duration> = self.clocks.iter().map(|c| c.now()).collect();
        let outcome = invoker.invoke();
        let stop: Vec<Duration> = self.clocks.iter().map(|c| c.now()).collect();

        if let Err(source) = outcome {
            self.failures.fetch_add(1, Ordering::Relaxed);
            return Err(PerfRunError::InvocationFailed {
                invoker: invoker.id().to_string(),
                source,
            });
        }

        if self.state() == TrackingState::Started {
            let mut recording = lock(&self.recording);
            for ((summary, begin), end) in recording.clocks.iter_mut().zip(&start).zip(&stop) {
                summary.record(end.saturating_sub(*begin));
            }
        }
        Ok(())
    }

    fn is_tracking_started(&self) -> bool {
        matches!(self.state(), TrackingState::Started | TrackingState::Stopped)
    }

    fn stop_tracking(&self) {
        if self
            .state
            .compare_exchange(
                TrackingState::Started as u8,
                TrackingState::Stopped as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            return;
        }
        let snapshot = self.snapshot();
        tracing::info!(
            invoker = %self.invoker_id,
            total = snapshot.total_invocations,
            tracked = snapshot.tracked_invocations(),
            failed = snapshot.failed_invocations,
            "tracking stopped"
        );
        *lock(&self.last_snapshot) = Some(snapshot);
    }

    fn clear(&self) {
        {
            let mut recording = lock(&self.recording);
            recording.started_at = None;
            for summary in recording.clocks.iter_mut() {
                *summary = ClockSummary::new(summary.clock.clone());
            }
        }
        self.invocations.store(0, Ordering::Relaxed);
        self.failures.store(0, Ordering::Relaxed);
        *lock(&self.warm_up_origin) = None;
        self.state.store(TrackingState::Cleared as u8, Ordering::Release);
    }
}

// Poisoning is ignored: no critical section can panic halfway through an update.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
