//! RPC error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    /// The request did not complete (connection, HTTP status, body read).
    #[error("transport failure: {0}")]
    Transport(String),

    /// The service answered with a JSON-RPC error envelope.
    #[error("wallet service error {code}: {message}")]
    Service { code: i64, message: String },

    /// The call did not finish within its deadline.
    #[error("{method} timed out after {after_ms}ms")]
    Timeout { method: String, after_ms: u64 },

    /// The response was missing fields or had the wrong shape.
    #[error("malformed response to {method}: {detail}")]
    Malformed { method: String, detail: String },
}

impl RpcError {
    pub fn malformed(method: &str, detail: impl Into<String>) -> Self {
        Self::Malformed {
            method: method.to_string(),
            detail: detail.into(),
        }
    }

    /// Whether this is a transport-class failure (as opposed to a
    /// malformed response). Only transport failures feed the retry backoff.
    pub fn is_transport(&self) -> bool {
        !matches!(self, Self::Malformed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert!(RpcError::Transport("refused".into()).is_transport());
        assert!(RpcError::Service {
            code: -32600,
            message: "bad".into()
        }
        .is_transport());
        assert!(RpcError::Timeout {
            method: "getStatus".into(),
            after_ms: 10
        }
        .is_transport());
        assert!(!RpcError::malformed("getStatus", "missing blockCount").is_transport());
    }
}
