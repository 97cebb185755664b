//! Single-build guard and last-result slot.
//!
//! At most one build runs at a time. [`BuildTracker::try_start`] flips the
//! running flag with a compare-and-swap and hands back a [`BuildGuard`];
//! a second caller gets `None` while the guard is alive. There is no queue
//! and no cancellation. Dropping the guard clears the flag even if the build
//! panicked.

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Outcome of the most recent build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildOutcome {
    pub success: bool,
    /// Summary lines on success, empty on failure.
    pub summary: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BuildOutcome {
    pub fn succeeded(summary: Vec<String>) -> Self {
        Self {
            success: true,
            summary,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            summary: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// The JSON body of `GET /api/build/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildStatus {
    pub running: bool,
    pub last_run: Option<String>,
    pub last_result: Option<BuildOutcome>,
}

#[derive(Debug, Default)]
struct LastRun {
    finished_at: Option<String>,
    outcome: Option<BuildOutcome>,
}

#[derive(Debug, Default)]
pub struct BuildTracker {
    running: AtomicBool,
    last: Mutex<LastRun>,
}

impl BuildTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the build slot. `None` if a build is already running.
    pub fn try_start(self: &Arc<Self>) -> Option<BuildGuard> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BuildGuard {
                tracker: Arc::clone(self),
            })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn status(&self) -> BuildStatus {
        let last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        BuildStatus {
            running: self.is_running(),
            last_run: last.finished_at.clone(),
            last_result: last.outcome.clone(),
        }
    }
}

/// Proof that the caller holds the build slot.
#[derive(Debug)]
pub struct BuildGuard {
    tracker: Arc<BuildTracker>,
}

impl BuildGuard {
    /// Record the outcome and release the slot.
    pub fn finish(self, outcome: BuildOutcome, finished_at: String) {
        let mut last = self
            .tracker
            .last
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        last.finished_at = Some(finished_at);
        last.outcome = Some(outcome);
    }
}

impl Drop for BuildGuard {
    fn drop(&mut self) {
        self.tracker.running.store(false, Ordering::Release);
    }
}
