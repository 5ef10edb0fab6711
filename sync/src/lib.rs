//! Synchronization and reconciliation engine for walletview.
//!
//! One refresh cycle flows strictly one way:
//! [`StateFetcher`] → [`reconcile`] → [`ViewModelBuilder`] → consumer.
//! [`SyncDriver`] repeats the cycle on a fixed interval from a background
//! task and delivers each [`ViewUpdate`] over a channel.

pub mod backoff;
pub mod config;
pub mod diff;
pub mod driver;
pub mod error;
pub mod fetcher;
pub mod format;
pub mod reconcile;
pub mod shutdown;
pub mod view;

pub use backoff::Backoff;
pub use config::SyncConfig;
pub use diff::{apply_changes, diff_rows, RowChange};
pub use driver::{DriverState, SyncDriver, SyncHandle, ViewUpdate};
pub use error::SyncError;
pub use fetcher::{StateFetcher, WalletSnapshot};
pub use reconcile::{reconcile, CounterpartyMatch, Direction, ReconciledTransaction};
pub use shutdown::ShutdownController;
pub use view::{TransactionRow, ViewModel, ViewModelBuilder};
