//! Retry delay after failed cycles.

use std::time::Duration;

/// Delay before the next cycle.
///
/// With no outstanding transport failures the delay is the base interval.
/// After `n` consecutive transport failures it is
/// `min(base * 2^(n-1), max)`, so the first retry still comes after exactly
/// one interval. Any cycle that reaches the service resets the count.
#[derive(Clone, Debug)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    consecutive_failures: u32,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max: max.max(base),
            consecutive_failures: 0,
        }
    }

    pub fn base(&self) -> Duration {
        self.base
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn record_transport_failure(&mut self) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
    }

    /// The service answered (successfully or with a malformed response).
    pub fn reset(&mut self) {
        self.consecutive_failures = 0;
    }

    pub fn next_delay(&self) -> Duration {
        let doublings = self.consecutive_failures.saturating_sub(1).min(31);
        self.base
            .checked_mul(1u32 << doublings)
            .map_or(self.max, |delay| delay.min(self.max))
    }
}
