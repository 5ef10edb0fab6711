//! Blocks and transactions returned by `getTransactions`.
//!
//! The service returns only the wallet's own transactions, grouped by the
//! block that contains them. Blocks arrive oldest-first.

use serde::{Deserialize, Serialize};

use crate::address::WalletAddress;
use crate::time::Timestamp;

/// A single address/amount line item inside a transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    #[serde(default)]
    pub address: WalletAddress,
    pub amount: i64,
}

impl Transfer {
    pub fn new(address: impl Into<WalletAddress>, amount: i64) -> Self {
        Self {
            address: address.into(),
            amount,
        }
    }
}

/// A transaction exactly as the wallet service reports it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransaction {
    /// Stable identifier. Some service versions omit it.
    #[serde(default)]
    pub transaction_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_index: Option<u64>,
    /// Net effect on the wallet. Negative means outgoing.
    pub amount: i64,
    /// Network fee; only meaningful for outgoing transactions.
    #[serde(default)]
    pub fee: u64,
    /// Maturity height, or 0 when spendable immediately.
    #[serde(default)]
    pub unlock_time: u64,
    pub timestamp: Timestamp,
    #[serde(default)]
    pub transfers: Vec<Transfer>,
    #[serde(default)]
    pub payment_id: String,
    /// Set for block-reward (coinbase) transactions.
    #[serde(default)]
    pub is_base: bool,
}

/// A block holding zero or more of the wallet's transactions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_hash: Option<String>,
    #[serde(default)]
    pub transactions: Vec<RawTransaction>,
}
