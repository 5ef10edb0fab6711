//! JSON-RPC client for the wallet service.
//!
//! Provides:
//! - [`RpcTransport`], the request/response seam (real HTTP or a test double)
//! - [`HttpTransport`], JSON-RPC 2.0 over HTTP via `reqwest`
//! - [`WalletClient`], typed wrappers for the four calls a sync cycle needs

pub mod client;
pub mod error;
pub mod transport;

pub use client::{GetTransactionsParams, WalletClient};
pub use error::RpcError;
pub use transport::{HttpTransport, RpcTransport};
