//! Debounced local typing indicator.
//!
//! Turns a stream of input edits into at most one "started typing" and
//! one "stopped typing" notification per burst. Time is passed in, so the
//! caller decides how to schedule `poll` (a `tokio::time::sleep_until` on
//! [`TypingDebounce::deadline`] works well).

use std::time::{Duration, Instant};

/// Quiet period after the last edit before typing is considered stopped.
pub const DEFAULT_TYPING_TIMEOUT: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone)]
pub struct TypingDebounce {
    timeout: Duration,
    last_input: Option<Instant>,
}

impl Default for TypingDebounce {
    fn default() -> Self {
        Self::new(DEFAULT_TYPING_TIMEOUT)
    }
}

impl TypingDebounce {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            last_input: None,
        }
    }

    pub fn is_typing(&self) -> bool {
        self.last_input.is_some()
    }

    /// When `poll` should next be called, if typing.
    pub fn deadline(&self) -> Option<Instant> {
        self.last_input.map(|at| at + self.timeout)
    }

    /// Record an edit. Returns `Some(true)` when this starts a burst.
    pub fn input(&mut self, now: Instant) -> Option<bool> {
        let started = self.last_input.is_none();
        self.last_input = Some(now);
        started.then_some(true)
    }

    /// Returns `Some(false)` once the quiet period has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<bool> {
        match self.deadline() {
            Some(deadline) if now >= deadline => {
                self.last_input = None;
                Some(false)
            }
            _ => None,
        }
    }

    /// Sending a message ends the burst right away.
    pub fn message_sent(&mut self) -> Option<bool> {
        self.last_input.take().map(|_| false)
    }
}
