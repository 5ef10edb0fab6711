//! View model builder.
//!
//! Turns a fetched snapshot and its reconciled transactions into the
//! display-ready record set handed to the presentation layer. This is pure
//! formatting: the same inputs always produce the same [`ViewModel`].

use chrono_tz::Tz;
use serde::Serialize;

use walletview_types::{Status, Timestamp, WalletAddress};

use crate::format::{format_clock_time, format_currency, format_timestamp};
use crate::reconcile::{CounterpartyMatch, Direction, ReconciledTransaction};
use crate::WalletSnapshot;

/// One display row of the transaction list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TransactionRow {
    pub key: String,
    pub direction: Direction,
    pub confirmed: bool,
    pub display_amount: String,
    pub display_time: String,
    pub counterparty: CounterpartyMatch,
    pub payment_id: String,
}

impl TransactionRow {
    /// Counterparty address, absent when no transfer matched.
    pub fn counterparty_address(&self) -> Option<&WalletAddress> {
        self.counterparty.address()
    }
}

/// A complete, display-ready snapshot of the wallet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ViewModel {
    pub available_balance: String,
    pub locked_balance: String,
    pub primary_address: WalletAddress,
    pub addresses: Vec<WalletAddress>,
    /// Newest block first.
    pub transactions: Vec<TransactionRow>,
    pub status_summary: String,
    pub block_count: u64,
    pub peer_count: u64,
}

/// Formats reconciled data for display in a fixed time zone.
#[derive(Clone, Debug)]
pub struct ViewModelBuilder {
    tz: Tz,
}

impl ViewModelBuilder {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Build the view model. `now` is the build completion time shown in the
    /// status line.
    pub fn build(
        &self,
        snapshot: &WalletSnapshot,
        reconciled: &[ReconciledTransaction],
        now: Timestamp,
    ) -> ViewModel {
        let balance = snapshot.balance();
        let status = snapshot.status();

        ViewModel {
            available_balance: format_currency(i128::from(balance.available)),
            locked_balance: format_currency(i128::from(balance.locked)),
            primary_address: snapshot.primary_address().clone(),
            addresses: snapshot.addresses().to_vec(),
            transactions: reconciled.iter().map(|tx| self.row(tx)).collect(),
            status_summary: self.status_summary(status, now),
            block_count: status.block_count,
            peer_count: status.peer_count,
        }
    }

    pub fn row(&self, tx: &ReconciledTransaction) -> TransactionRow {
        TransactionRow {
            key: tx.key.clone(),
            direction: tx.direction,
            confirmed: tx.confirmed,
            display_amount: format_currency(i128::from(tx.amount)),
            display_time: format_timestamp(tx.timestamp, &self.tz),
            counterparty: tx.counterparty.clone(),
            payment_id: tx.payment_id.clone(),
        }
    }

    pub fn status_summary(&self, status: &Status, now: Timestamp) -> String {
        let height = match status.known_block_count {
            Some(known) if status.is_syncing() => {
                format!("{} (syncing to {known})", status.block_count)
            }
            _ => status.block_count.to_string(),
        };
        format!(
            "Current block height: {height} | Peer count {} | Last Updated {}",
            status.peer_count,
            format_clock_time(now, &self.tz)
        )
    }
}
