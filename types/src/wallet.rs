//! Wallet-level views returned by `getBalance` and `getStatus`.

use serde::{Deserialize, Serialize};

/// Spendable and locked funds, in the smallest currency unit.
///
/// Display value is `amount / 100`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    #[serde(rename = "availableBalance")]
    pub available: u64,
    #[serde(rename = "lockedAmount")]
    pub locked: u64,
}

/// Chain and network status as seen by the wallet service.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    /// Local chain height. Non-decreasing across cycles barring reorgs.
    pub block_count: u64,
    pub peer_count: u64,
    /// Height of the best chain the service has heard of, if reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub known_block_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_block_hash: Option<String>,
}

impl Status {
    /// Whether the service reports a known height ahead of its local one.
    pub fn is_syncing(&self) -> bool {
        self.known_block_count
            .is_some_and(|known| known > self.block_count)
    }
}
