//! Bounded restart of the update dispatcher after fatal polling errors.

use std::time::{Duration, Instant};
use teloxide::{ApiError, RequestError};

pub const MAX_FATAL_ERRORS: usize = 5;
pub const FAILURE_WINDOW: Duration = Duration::from_secs(60);
pub const RESTART_DELAY: Duration = Duration::from_secs(30);
/// Lets the previous long poll expire before polling again.
pub const SETTLE_DELAY: Duration = Duration::from_secs(2);

/// Errors after which polling cannot continue: another instance took over, the token was
/// revoked, or Telegram answered with something unparseable. Everything else is transient.
pub fn is_fatal_polling_error(error: &RequestError) -> bool {
    matches!(
        error,
        RequestError::Api(ApiError::TerminatedByOtherGetUpdates | ApiError::InvalidToken)
            | RequestError::InvalidJson { .. }
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartDecision {
    /// Sleep this long, then start a new dispatcher.
    Restart(Duration),
    /// Too many fatal errors in the window; stay down.
    GiveUp,
}

/// Counts consecutive fatal failures. A failure more than `window` after the previous one starts
/// a new run, as does [`RestartPolicy::record_success`].
#[derive(Debug, Clone)]
pub struct RestartPolicy {
    max_failures: usize,
    window: Duration,
    delay: Duration,
    settle: Duration,
    consecutive: usize,
    last_failure: Option<Instant>,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self::new(MAX_FATAL_ERRORS, FAILURE_WINDOW, RESTART_DELAY, SETTLE_DELAY)
    }
}

impl RestartPolicy {
    pub fn new(max_failures: usize, window: Duration, delay: Duration, settle: Duration) -> Self {
        Self {
            max_failures,
            window,
            delay,
            settle,
            consecutive: 0,
            last_failure: None,
        }
    }

    /// Records a fatal failure at `now`.
    pub fn record_failure(&mut self, now: Instant) -> RestartDecision {
        let chained = self
            .last_failure
            .is_some_and(|last| now.saturating_duration_since(last) <= self.window);
        self.consecutive = if chained { self.consecutive + 1 } else { 1 };
        self.last_failure = Some(now);
        if self.consecutive > self.max_failures {
            RestartDecision::GiveUp
        } else {
            RestartDecision::Restart(self.delay + self.settle)
        }
    }

    /// A restarted dispatcher received updates again; the failure run is over.
    pub fn record_success(&mut self) {
        self.consecutive = 0;
        self.last_failure = None;
    }

    pub fn consecutive_failures(&self) -> usize {
        self.consecutive
    }
}
