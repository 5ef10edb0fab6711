//! Nullable wallet transport: scripted answers, recorded requests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::{json, Value};
use tokio::time::Instant;

use walletview_rpc::client::{GET_ADDRESSES, GET_BALANCE, GET_STATUS, GET_TRANSACTIONS};
use walletview_rpc::{RpcError, RpcTransport};
use walletview_types::{Balance, Block, Status};

/// A request the transport received.
#[derive(Clone, Debug)]
pub struct RecordedCall {
    pub method: String,
    pub params: Value,
    /// Runtime time of the call; follows tokio's paused clock in tests.
    pub at: Instant,
}

#[derive(Default)]
struct Script {
    standing: HashMap<String, Value>,
    once: HashMap<String, VecDeque<Value>>,
    failures: HashMap<String, usize>,
    hang_always: HashSet<String>,
    hang_once: HashMap<String, usize>,
    calls: Vec<RecordedCall>,
}

enum Answer {
    Ready(Result<Value, RpcError>),
    Hang,
}

/// A test transport that answers from a script instead of a wallet service.
///
/// Clones share the same script and call log, so a test can keep one clone
/// for assertions while the engine owns another.
///
/// For each call, in priority order: a pending hang, a pending scripted
/// failure, a one-shot response, the standing response. A method with none
/// of these fails with a transport error.
#[derive(Clone, Default)]
pub struct NullTransport {
    script: Arc<Mutex<Script>>,
}

impl NullTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        // A panic while holding the lock only happens inside a failing test.
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Answer every future `method` call with `result`.
    pub fn respond_with(&self, method: &str, result: Value) {
        self.script().standing.insert(method.to_string(), result);
    }

    /// Answer the next unanswered `method` call with `result`. Queued
    /// one-shot answers take precedence over the standing one.
    pub fn respond_with_once(&self, method: &str, result: Value) {
        self.script()
            .once
            .entry(method.to_string())
            .or_default()
            .push_back(result);
    }

    /// Fail the next `times` calls of `method` with a transport error.
    pub fn fail_next(&self, method: &str, times: usize) {
        *self.script().failures.entry(method.to_string()).or_default() += times;
    }

    /// Never answer `method`.
    pub fn hang(&self, method: &str) {
        self.script().hang_always.insert(method.to_string());
    }

    /// Never answer the next `method` call.
    pub fn hang_once(&self, method: &str) {
        *self.script().hang_once.entry(method.to_string()).or_default() += 1;
    }

    pub fn set_balance(&self, balance: Balance) {
        self.respond_with(
            GET_BALANCE,
            json!({"availableBalance": balance.available, "lockedAmount": balance.locked}),
        );
    }

    pub fn set_addresses(&self, addresses: &[&str]) {
        self.respond_with(GET_ADDRESSES, json!({ "addresses": addresses }));
    }

    pub fn set_status(&self, status: Status) {
        self.respond_with(GET_STATUS, json!(status));
    }

    pub fn set_blocks(&self, blocks: Vec<Block>) {
        self.respond_with(GET_TRANSACTIONS, json!({ "items": blocks }));
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.script().calls.clone()
    }

    fn answer(&self, method: &str, params: Value) -> Answer {
        let mut script = self.script();
        script.calls.push(RecordedCall {
            method: method.to_string(),
            params,
            at: Instant::now(),
        });

        if script.hang_always.contains(method) {
            return Answer::Hang;
        }
        if let Some(pending) = script.hang_once.get_mut(method).filter(|n| **n > 0) {
            *pending -= 1;
            return Answer::Hang;
        }
        if let Some(pending) = script.failures.get_mut(method).filter(|n| **n > 0) {
            *pending -= 1;
            return Answer::Ready(Err(RpcError::Transport(format!(
                "scripted failure for {method}"
            ))));
        }
        if let Some(result) = script.once.get_mut(method).and_then(VecDeque::pop_front) {
            return Answer::Ready(Ok(result));
        }
        match script.standing.get(method) {
            Some(result) => Answer::Ready(Ok(result.clone())),
            None => Answer::Ready(Err(RpcError::Transport(format!(
                "no response scripted for {method}"
            )))),
        }
    }
}

impl RpcTransport for NullTransport {
    fn call(
        &self,
        method: &str,
        params: Value,
    ) -> impl Future<Output = Result<Value, RpcError>> + Send {
        let answer = self.answer(method, params);
        async move {
            match answer {
                Answer::Ready(result) => result,
                Answer::Hang => std::future::pending().await,
            }
        }
    }
}
