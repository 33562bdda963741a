//! Per-attempt observation hooks.
//!
//! Every attempt of an invocation is reported to the caller's observers.
//! Observers see the outcome but cannot influence it: a panicking observer
//! is caught and logged.

use crate::error::FailureKind;
use parking_lot::Mutex;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;
use tracing::{debug, warn};

/// Result of a single attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The attempt produced the final successful result.
    Success,
    /// The attempt failed and another attempt is scheduled.
    RetryableFailure(FailureKind),
    /// The attempt failed and the invocation stops here.
    TerminalFailure(FailureKind),
}

impl AttemptOutcome {
    /// Failure kind, if the attempt failed.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Success => None,
            Self::RetryableFailure(kind) | Self::TerminalFailure(kind) => Some(*kind),
        }
    }
}

/// Record of one physical request/response cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallAttempt {
    /// Attempt number (1-based).
    pub attempt: u32,
    /// What happened.
    pub outcome: AttemptOutcome,
    /// Time spent in this attempt.
    pub elapsed: Duration,
    /// HTTP status, if a response arrived.
    pub status: Option<u16>,
    /// Backoff scheduled before the next attempt.
    pub next_delay: Option<Duration>,
}

/// Hook notified after each attempt.
pub trait AttemptObserver: Send + Sync {
    /// Called once per attempt, in order.
    fn on_attempt(&self, attempt: &CallAttempt);
}

/// Observer that emits `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl AttemptObserver for TracingObserver {
    fn on_attempt(&self, attempt: &CallAttempt) {
        let elapsed_ms = attempt.elapsed.as_millis() as u64;
        match attempt.outcome {
            AttemptOutcome::Success => debug!(
                attempt = attempt.attempt,
                status = attempt.status,
                elapsed_ms,
                "Attempt succeeded"
            ),
            AttemptOutcome::RetryableFailure(kind) => warn!(
                attempt = attempt.attempt,
                status = attempt.status,
                elapsed_ms,
                kind = %kind,
                wait_ms = attempt.next_delay.map(|d| d.as_millis() as u64),
                "Attempt failed, retrying after backoff"
            ),
            AttemptOutcome::TerminalFailure(kind) => warn!(
                attempt = attempt.attempt,
                status = attempt.status,
                elapsed_ms,
                kind = %kind,
                "Attempt failed, giving up"
            ),
        }
    }
}

/// Observer that keeps every attempt in memory.
#[derive(Debug, Default)]
pub struct AttemptLog {
    attempts: Mutex<Vec<CallAttempt>>,
}

impl AttemptLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of recorded attempts.
    pub fn attempts(&self) -> Vec<CallAttempt> {
        self.attempts.lock().clone()
    }

    /// Number of recorded attempts.
    pub fn len(&self) -> usize {
        self.attempts.lock().len()
    }

    /// Check if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.attempts.lock().is_empty()
    }

    /// Scheduled backoff delays, in order.
    pub fn delays(&self) -> Vec<Duration> {
        self.attempts
            .lock()
            .iter()
            .filter_map(|a| a.next_delay)
            .collect()
    }

    /// Forget all recorded attempts.
    pub fn clear(&self) {
        self.attempts.lock().clear();
    }
}

impl AttemptObserver for AttemptLog {
    fn on_attempt(&self, attempt: &CallAttempt) {
        self.attempts.lock().push(attempt.clone());
    }
}

/// Notify an observer, swallowing panics.
pub(crate) fn notify(observer: &dyn AttemptObserver, attempt: &CallAttempt) {
    if catch_unwind(AssertUnwindSafe(|| observer.on_attempt(attempt))).is_err() {
        warn!(attempt = attempt.attempt, "Attempt observer panicked; ignoring");
    }
}
