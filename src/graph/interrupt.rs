//! Cooperative cancellation for long-running analyses.
//!
//! Quadratic and exponential routines (closeness, betweenness, all-paths,
//! bridges, articulation points, Louvain) poll an [`Interrupt`] inside their
//! loops. An interrupt carries an optional shared cancel flag (set to `true`
//! from any thread to stop early) and an optional wall-clock deadline.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::error::{AnalysisError, AnalysisResult};

/// Cancellation flag + deadline, polled by iterative algorithms.
#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    cancel: Option<Arc<AtomicBool>>,
    deadline: Option<Instant>,
}

impl Interrupt {
    /// An interrupt that never fires.
    pub fn none() -> Self {
        Self::default()
    }

    /// Attach a shared cancel flag.
    pub fn with_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Attach an absolute deadline.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Attach a deadline relative to now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Build from an optional millisecond budget (as found in `AnalyticsConfig`).
    pub fn from_timeout_ms(timeout_ms: Option<u64>) -> Self {
        match timeout_ms {
            Some(ms) => Self::none().with_timeout(Duration::from_millis(ms)),
            None => Self::none(),
        }
    }

    /// Returns an error once the flag is raised or the deadline has passed.
    pub fn check(&self) -> AnalysisResult<()> {
        if let Some(flag) = &self.cancel {
            if flag.load(Ordering::Relaxed) {
                return Err(AnalysisError::Cancelled);
            }
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(AnalysisError::DeadlineExceeded);
            }
        }
        Ok(())
    }
}
