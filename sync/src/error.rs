use thiserror::Error;

use walletview_rpc::RpcError;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("wallet RPC error: {0}")]
    Rpc(#[from] RpcError),

    #[error("config error: {0}")]
    Config(String),

    #[error("sync task failed: {0}")]
    Task(String),
}

impl SyncError {
    /// Whether this failure should grow the retry backoff.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Rpc(e) if e.is_transport())
    }
}
