//! Fundamental types for walletview.
//!
//! This crate defines the data model shared across the workspace: the
//! wallet-service views (balance, status, addresses) and the raw block and
//! transaction records returned by `getTransactions`. Field names follow the
//! wallet service's camelCase JSON so the types can be decoded directly.

pub mod address;
pub mod time;
pub mod transaction;
pub mod wallet;

pub use address::WalletAddress;
pub use time::Timestamp;
pub use transaction::{Block, RawTransaction, Transfer};
pub use wallet::{Balance, Status};
