//! Request/response transport to the wallet service.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde_json::{json, Value};

use crate::error::RpcError;

/// A single JSON-RPC round trip.
///
/// Implementations return the `result` member of a successful response.
/// The typed layer in [`crate::WalletClient`] is written against this trait
/// so tests can substitute a scripted transport.
pub trait RpcTransport: Send + Sync {
    fn call(
        &self,
        method: &str,
        params: Value,
    ) -> impl Future<Output = Result<Value, RpcError>> + Send;
}

/// JSON-RPC 2.0 over HTTP, as spoken by the wallet service's `/json_rpc`
/// endpoint.
pub struct HttpTransport {
    http: reqwest::Client,
    url: String,
    password: Option<String>,
    timeout: Duration,
    next_id: AtomicU64,
}

impl HttpTransport {
    /// Create a transport targeting `http://{host}:{port}/json_rpc`.
    ///
    /// `timeout` bounds each whole request; connecting is bounded by the
    /// same value.
    pub fn new(
        host: &str,
        port: u16,
        password: Option<String>,
        timeout: Duration,
    ) -> Result<Self, RpcError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| RpcError::Transport(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            url: format!("http://{host}:{port}/json_rpc"),
            password,
            timeout,
            next_id: AtomicU64::new(1),
        })
    }

    /// The endpoint URL.
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl RpcTransport for HttpTransport {
    async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = build_request(id, method, params, self.password.as_deref());
        tracing::trace!(method, id, "sending wallet RPC request");

        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RpcError::Timeout {
                        method: method.to_string(),
                        after_ms: self.timeout.as_millis() as u64,
                    }
                } else {
                    RpcError::Transport(format!("request failed: {e}"))
                }
            })?;

        if !response.status().is_success() {
            return Err(RpcError::Transport(format!(
                "wallet service returned HTTP {}",
                response.status()
            )));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| RpcError::malformed(method, format!("invalid JSON body: {e}")))?;

        parse_response(method, json)
    }
}

/// Build a JSON-RPC 2.0 request body. The `password` member is only present
/// when one is configured.
pub fn build_request(id: u64, method: &str, params: Value, password: Option<&str>) -> Value {
    let mut body = json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "params": params,
    });
    if let (Some(password), Some(obj)) = (password, body.as_object_mut()) {
        obj.insert("password".to_string(), json!(password));
    }
    body
}

/// Unwrap a JSON-RPC response envelope into its `result` member.
pub fn parse_response(method: &str, mut json: Value) -> Result<Value, RpcError> {
    if let Some(error) = json.get("error").filter(|e| !e.is_null()) {
        let code = error.get("code").and_then(Value::as_i64).unwrap_or(0);
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(RpcError::Service { code, message });
    }

    json.get_mut("result")
        .map(Value::take)
        .ok_or_else(|| RpcError::malformed(method, "response has neither result nor error"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_omits_password_when_unset() {
        let body = build_request(7, "getStatus", json!({}), None);
        assert_eq!(body["jsonrpc"], "2.0");
        assert_eq!(body["id"], 7);
        assert_eq!(body["method"], "getStatus");
        assert!(body.get("password").is_none());
    }

    #[test]
    fn request_includes_password_when_set() {
        let body = build_request(1, "getBalance", json!({}), Some("hunter2"));
        assert_eq!(body["password"], "hunter2");
    }

    #[test]
    fn error_envelope_is_service_error() {
        let response = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": -32601, "message": "Method not found"}
        });
        match parse_response("getFoo", response) {
            Err(RpcError::Service { code, message }) => {
                assert_eq!(code, -32601);
                assert_eq!(message, "Method not found");
            }
            other => panic!("expected service error, got {other:?}"),
        }
    }

    #[test]
    fn missing_result_is_malformed() {
        let response = json!({"jsonrpc": "2.0", "id": 1});
        let err = parse_response("getStatus", response).unwrap_err();
        assert!(!err.is_transport());
    }

    #[test]
    fn result_is_extracted() {
        let response = json!({"jsonrpc": "2.0", "id": 1, "error": null, "result": {"blockCount": 3}});
        let result = parse_response("getStatus", response).unwrap();
        assert_eq!(result, json!({"blockCount": 3}));
    }

    #[test]
    fn transport_url_points_at_json_rpc() {
        let transport =
            HttpTransport::new("127.0.0.1", 8070, None, Duration::from_secs(1)).unwrap();
        assert_eq!(transport.url(), "http://127.0.0.1:8070/json_rpc");
    }
}
