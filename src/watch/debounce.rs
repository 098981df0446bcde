// src/watch/debounce.rs

//! Quiescence-window bookkeeping for the watch scheduler.
//!
//! Pure state: callers pass the current time in, so the coalescing rules are
//! testable without a runtime.

use std::time::Duration;

use tokio::time::Instant;

/// Default quiet period after the last change before a run starts.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Collapses a burst of notifications into one pending run.
///
/// Every notification pushes the deadline to `now + window`; the run becomes
/// due only once the deadline passes without another notification.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    deadline: Option<Instant>,
    pending: usize,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
            pending: 0,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Record a notification, restarting the window.
    pub fn notify(&mut self, now: Instant) {
        self.deadline = Some(now + self.window);
        self.pending += 1;
    }

    /// When the pending run becomes due, if one is pending.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// If the window has elapsed, clear it and return how many notifications
    /// were coalesced into this run.
    pub fn take_due(&mut self, now: Instant) -> Option<usize> {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                Some(std::mem::take(&mut self.pending))
            }
            _ => None,
        }
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}
