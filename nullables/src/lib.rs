//! Nullable infrastructure for deterministic testing.
//!
//! External dependencies of the sync engine (the wallet service and the
//! clock) sit behind traits. This crate provides test implementations that:
//! - Return scripted values
//! - Can be controlled programmatically (failures, hangs, time)
//! - Never touch the network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod transport;

pub use clock::NullClock;
pub use transport::{NullTransport, RecordedCall};
