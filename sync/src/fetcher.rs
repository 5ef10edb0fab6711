//! State fetcher: the four wallet queries of one refresh cycle.

use std::future::Future;
use std::time::Duration;

use walletview_rpc::client::{GET_ADDRESSES, GET_BALANCE, GET_STATUS, GET_TRANSACTIONS};
use walletview_rpc::{GetTransactionsParams, RpcError, RpcTransport, WalletClient};
use walletview_types::{Balance, Block, Status, WalletAddress};

use crate::SyncError;

/// Raw wallet state assembled by one fetch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WalletSnapshot {
    balance: Balance,
    addresses: Vec<WalletAddress>,
    status: Status,
    blocks: Vec<Block>,
}

impl WalletSnapshot {
    /// Assemble a snapshot. A wallet with no addresses has no primary
    /// address to show and is rejected as a malformed `getAddresses` answer.
    pub fn new(
        balance: Balance,
        addresses: Vec<WalletAddress>,
        status: Status,
        blocks: Vec<Block>,
    ) -> Result<Self, SyncError> {
        if addresses.is_empty() {
            return Err(RpcError::malformed(GET_ADDRESSES, "wallet reported no addresses").into());
        }
        Ok(Self {
            balance,
            addresses,
            status,
            blocks,
        })
    }

    pub fn balance(&self) -> &Balance {
        &self.balance
    }

    /// All addresses, in the order the service returned them.
    pub fn addresses(&self) -> &[WalletAddress] {
        &self.addresses
    }

    /// The first address returned by the service.
    pub fn primary_address(&self) -> &WalletAddress {
        &self.addresses[0]
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    /// Blocks in service order (oldest first).
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }
}

/// Issues `getBalance`, `getAddresses`, `getStatus` and `getTransactions`,
/// in that order, against an injected client.
///
/// There is no retry here: a failed call fails the whole fetch and the
/// driver tries again on its next tick.
pub struct StateFetcher<T> {
    client: WalletClient<T>,
    call_timeout: Duration,
}

impl<T: RpcTransport> StateFetcher<T> {
    pub fn new(client: WalletClient<T>, call_timeout: Duration) -> Self {
        Self {
            client,
            call_timeout,
        }
    }

    pub async fn fetch(&self) -> Result<WalletSnapshot, SyncError> {
        let balance = self.bounded(GET_BALANCE, self.client.get_balance()).await?;
        let addresses = self
            .bounded(GET_ADDRESSES, self.client.get_addresses())
            .await?;
        if addresses.is_empty() {
            return Err(RpcError::malformed(GET_ADDRESSES, "wallet reported no addresses").into());
        }
        let status = self.bounded(GET_STATUS, self.client.get_status()).await?;

        let params = GetTransactionsParams {
            block_count: status.block_count,
            first_block_index: 1,
            addresses: addresses.clone(),
        };
        let blocks = self
            .bounded(GET_TRANSACTIONS, self.client.get_transactions(&params))
            .await?;

        tracing::debug!(
            block_count = status.block_count,
            addresses = addresses.len(),
            blocks = blocks.len(),
            "fetched wallet state"
        );
        WalletSnapshot::new(balance, addresses, status, blocks)
    }

    /// Apply the per-call deadline, independent of the transport's own.
    async fn bounded<R>(
        &self,
        method: &str,
        call: impl Future<Output = Result<R, RpcError>>,
    ) -> Result<R, RpcError> {
        match tokio::time::timeout(self.call_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(RpcError::Timeout {
                method: method.to_string(),
                after_ms: self.call_timeout.as_millis() as u64,
            }),
        }
    }
}
