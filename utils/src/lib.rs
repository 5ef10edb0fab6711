//! Shared utilities for walletview.

pub mod clock;
pub mod logging;
pub mod stats;
pub mod time;

pub use clock::{Clock, SystemClock};
pub use logging::{init_logging, LogFormat};
pub use stats::StatsCounter;
pub use time::format_duration;
