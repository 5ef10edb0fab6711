//! Wall-clock source.

use walletview_types::Timestamp;

/// Source of the current time.
///
/// The sync engine reads "now" through this trait so status lines can be
/// produced deterministically in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// The system clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}
