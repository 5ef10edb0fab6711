//! Typed wallet-service calls.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use walletview_types::{Balance, Block, Status, WalletAddress};

use crate::error::RpcError;
use crate::transport::RpcTransport;

pub const GET_BALANCE: &str = "getBalance";
pub const GET_ADDRESSES: &str = "getAddresses";
pub const GET_STATUS: &str = "getStatus";
pub const GET_TRANSACTIONS: &str = "getTransactions";

/// Parameters of `getTransactions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetTransactionsParams {
    pub block_count: u64,
    pub first_block_index: u64,
    pub addresses: Vec<WalletAddress>,
}

#[derive(Debug, Deserialize)]
struct AddressesResult {
    addresses: Vec<WalletAddress>,
}

#[derive(Debug, Deserialize)]
struct TransactionsResult {
    items: Vec<Block>,
}

/// Typed client for the wallet service.
///
/// Owns its transport; the sync engine receives a `WalletClient` at
/// construction rather than reaching for a shared connection.
pub struct WalletClient<T> {
    transport: T,
}

impl<T: RpcTransport> WalletClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetch available and locked balance.
    pub async fn get_balance(&self) -> Result<Balance, RpcError> {
        self.typed_call(GET_BALANCE, json!({})).await
    }

    /// Fetch every address owned by the wallet, in service order.
    pub async fn get_addresses(&self) -> Result<Vec<WalletAddress>, RpcError> {
        let result: AddressesResult = self.typed_call(GET_ADDRESSES, json!({})).await?;
        Ok(result.addresses)
    }

    /// Fetch chain height and peer count.
    pub async fn get_status(&self) -> Result<Status, RpcError> {
        self.typed_call(GET_STATUS, json!({})).await
    }

    /// Fetch the blocks containing the wallet's transactions, oldest first.
    pub async fn get_transactions(
        &self,
        params: &GetTransactionsParams,
    ) -> Result<Vec<Block>, RpcError> {
        let params = serde_json::to_value(params)
            .map_err(|e| RpcError::malformed(GET_TRANSACTIONS, format!("bad params: {e}")))?;
        let result: TransactionsResult = self.typed_call(GET_TRANSACTIONS, params).await?;
        Ok(result.items)
    }

    async fn typed_call<R: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<R, RpcError> {
        let result = self.transport.call(method, params).await?;
        serde_json::from_value(result).map_err(|e| RpcError::malformed(method, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Answers each method with a canned value and records params.
    struct CannedTransport {
        answers: HashMap<&'static str, Value>,
        seen: Mutex<Vec<(String, Value)>>,
    }

    impl CannedTransport {
        fn new(answers: &[(&'static str, Value)]) -> Self {
            Self {
                answers: answers.iter().cloned().collect(),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl RpcTransport for CannedTransport {
        async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError> {
            self.seen
                .lock()
                .unwrap()
                .push((method.to_string(), params));
            self.answers
                .get(method)
                .cloned()
                .ok_or_else(|| RpcError::Transport(format!("no answer for {method}")))
        }
    }

    #[tokio::test]
    async fn decodes_balance() {
        let client = WalletClient::new(CannedTransport::new(&[(
            GET_BALANCE,
            json!({"availableBalance": 10, "lockedAmount": 2}),
        )]));
        let balance = client.get_balance().await.unwrap();
        assert_eq!(balance, Balance { available: 10, locked: 2 });
    }

    #[tokio::test]
    async fn wrong_shape_is_malformed() {
        let client = WalletClient::new(CannedTransport::new(&[(
            GET_STATUS,
            json!({"blockCount": "many"}),
        )]));
        let err = client.get_status().await.unwrap_err();
        assert!(matches!(err, RpcError::Malformed { ref method, .. } if method == GET_STATUS));
    }

    #[tokio::test]
    async fn get_transactions_sends_camel_case_params() {
        let client = WalletClient::new(CannedTransport::new(&[(
            GET_TRANSACTIONS,
            json!({"items": []}),
        )]));
        let params = GetTransactionsParams {
            block_count: 500,
            first_block_index: 1,
            addresses: vec![WalletAddress::new("A"), WalletAddress::new("B")],
        };
        let blocks = client.get_transactions(&params).await.unwrap();
        assert!(blocks.is_empty());

        let seen = client.transport().seen.lock().unwrap();
        assert_eq!(
            seen[0].1,
            json!({"blockCount": 500, "firstBlockIndex": 1, "addresses": ["A", "B"]})
        );
    }

    #[tokio::test]
    async fn transport_errors_pass_through() {
        let client = WalletClient::new(CannedTransport::new(&[]));
        let err = client.get_addresses().await.unwrap_err();
        assert!(err.is_transport());
    }
}
