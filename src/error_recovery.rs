// src/error_recovery.rs
//! Linear backoff bounded by a total wait budget.
//!
//! Retries stop when the time already spent waiting reaches the site's
//! maximum wait, never on an attempt counter, so the budget alone decides how
//! long a caller can be kept waiting.

use crate::constants::{BACKOFF_STEP, INITIAL_BACKOFF};
use std::time::Duration;

/// Where the client goes to sleep between attempts.
///
/// Injected into a [`crate::Site`] so tests can record waits instead of
/// blocking the thread.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// Blocks the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Retry state for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backoff {
    delay: Duration,
    waited: Duration,
}

impl Backoff {
    pub fn new() -> Self {
        Self {
            delay: INITIAL_BACKOFF,
            waited: Duration::ZERO,
        }
    }

    /// The delay the next retry would use before clamping.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Time already charged against the budget.
    pub fn waited(&self) -> Duration {
        self.waited
    }

    pub fn is_exhausted(&self, budget: Duration) -> bool {
        self.waited >= budget
    }

    /// Charges the next wait against `budget` and grows the delay by one step.
    ///
    /// The last wait is clamped to whatever budget remains, so total sleep never
    /// overshoots `budget` by a whole step. Returns `None` once the budget is
    /// spent.
    pub fn next_wait(&mut self, budget: Duration) -> Option<Duration> {
        if self.is_exhausted(budget) {
            return None;
        }
        let wait = self.delay.min(budget - self.waited);
        self.waited += wait;
        self.delay += BACKOFF_STEP;
        Some(wait)
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_grows_linearly_until_budget_is_spent() {
        let mut backoff = Backoff::new();
        let budget = Duration::from_secs(120);

        let waits: Vec<u64> = std::iter::from_fn(|| backoff.next_wait(budget))
            .map(|wait| wait.as_secs())
            .collect();

        assert_eq!(waits, vec![5, 10, 15, 20, 25, 30, 15]);
        assert_eq!(backoff.waited(), budget);
    }

    #[test]
    fn zero_budget_never_waits() {
        let mut backoff = Backoff::new();
        assert_eq!(backoff.next_wait(Duration::ZERO), None);
    }

    #[test]
    fn reset_restores_initial_delay() {
        let mut backoff = Backoff::new();
        backoff.next_wait(Duration::from_secs(60));
        backoff.next_wait(Duration::from_secs(60));
        backoff.reset();
        assert_eq!(backoff.delay(), INITIAL_BACKOFF);
        assert_eq!(backoff.waited(), Duration::ZERO);
    }
}
