//! Nullable clock: deterministic time for testing.

use walletview_types::Timestamp;
use walletview_utils::Clock;

/// A deterministic clock for testing: always reads the time it was built with.
pub struct NullClock {
    current: Timestamp,
}

impl NullClock {
    pub fn new(initial_secs: u64) -> Self {
        Self {
            current: Timestamp::new(initial_secs),
        }
    }
}

impl Clock for NullClock {
    fn now(&self) -> Timestamp {
        self.current
    }
}
