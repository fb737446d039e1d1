//! RPC Client Module
//!
//! This module handles all interactions with a Nano node via its JSON-RPC interface.
//! `LedgerRpc` is the seam the crawler depends on; `NanoRpcClient` is the HTTP
//! implementation used in production.

pub mod types;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

use crate::models::{Account, Direction};
use types::{HistoryPage, HistoryResponse, LedgerPage, NodeVersion};

/// Coarse classification of RPC failures, used by the retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Timeout,
    Connection,
    /// The node answered with an `error` field
    Rejected,
    /// The response was missing fields or could not be decoded
    Malformed,
}

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("{action} request timed out")]
    Timeout { action: &'static str },
    #[error("{action} request failed: {source}")]
    Connection {
        action: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("node rejected {action}: {message}")]
    Rejected { action: &'static str, message: String },
    #[error("malformed {action} response: {message}")]
    Malformed { action: &'static str, message: String },
}

impl RpcError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Connection { .. } => ErrorKind::Connection,
            Self::Rejected { .. } => ErrorKind::Rejected,
            Self::Malformed { .. } => ErrorKind::Malformed,
        }
    }
}

/// Queries the crawler issues against the remote ledger service
pub trait LedgerRpc: Send + Sync + 'static {
    /// Fetch the node version, used as a connectivity check
    fn version(&self) -> impl Future<Output = Result<NodeVersion, RpcError>> + Send;

    /// Fetch up to `count` accounts of the global listing, starting at `start` (inclusive)
    fn ledger(&self, start: &Account, count: usize) -> impl Future<Output = Result<LedgerPage, RpcError>> + Send;

    /// Fetch one page of an account's history, resuming at `head` when given
    fn account_history(
        &self,
        account: &Account,
        count: usize,
        head: Option<&str>,
        direction: Direction,
    ) -> impl Future<Output = Result<HistoryPage, RpcError>> + Send;
}

pub struct NanoRpcClient {
    client: reqwest::Client,
    endpoint: String,
}

impl NanoRpcClient {
    /// Create a new RPC client for the node at `endpoint`
    pub fn new(endpoint: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self { client, endpoint })
    }

    /// Get the endpoint URL this client talks to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn call<T: DeserializeOwned>(&self, action: &'static str, mut payload: Value) -> Result<T, RpcError> {
        payload["action"] = Value::from(action);
        tracing::trace!("RPC {} {}", action, payload);

        let response = self.client.post(&self.endpoint).json(&payload).send().await.map_err(|e| classify(action, e))?;
        let body: Value = response.json().await.map_err(|e| classify(action, e))?;

        decode(action, body)
    }
}

impl LedgerRpc for NanoRpcClient {
    async fn version(&self) -> Result<NodeVersion, RpcError> {
        self.call("version", json!({})).await
    }

    async fn ledger(&self, start: &Account, count: usize) -> Result<LedgerPage, RpcError> {
        self.call("ledger", json!({ "account": start.as_str(), "count": count.to_string() })).await
    }

    async fn account_history(
        &self,
        account: &Account,
        count: usize,
        head: Option<&str>,
        direction: Direction,
    ) -> Result<HistoryPage, RpcError> {
        let mut payload = json!({
            "account": account.as_str(),
            "count": count.to_string(),
            "reverse": direction.is_reverse(),
        });
        if let Some(head) = head {
            payload["head"] = Value::from(head);
        }

        let response: HistoryResponse = self.call("account_history", payload).await?;
        Ok(into_history_page(response, direction))
    }
}

fn classify(action: &'static str, err: reqwest::Error) -> RpcError {
    if err.is_timeout() {
        RpcError::Timeout { action }
    } else if err.is_decode() {
        RpcError::Malformed { action, message: err.to_string() }
    } else {
        RpcError::Connection { action, source: err }
    }
}

/// Decode a node response body, surfacing `{"error": ...}` replies as rejections
fn decode<T: DeserializeOwned>(action: &'static str, body: Value) -> Result<T, RpcError> {
    if let Some(message) = body.get("error") {
        let message = message.as_str().map(str::to_string).unwrap_or_else(|| message.to_string());
        return Err(RpcError::Rejected { action, message });
    }

    serde_json::from_value(body).map_err(|e| RpcError::Malformed { action, message: e.to_string() })
}

/// Newest-first pages continue at `previous`, oldest-first pages at `next`
fn into_history_page(response: HistoryResponse, direction: Direction) -> HistoryPage {
    let cursor = match direction {
        Direction::NewestFirst => response.previous,
        Direction::OldestFirst => response.next,
    };

    HistoryPage { entries: response.history, cursor: cursor.filter(|c| !c.is_empty()) }
}
