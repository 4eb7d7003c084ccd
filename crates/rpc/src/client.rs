//! Ethereum JSON-RPC client
//!
//! Sends JSON-RPC 2.0 requests over HTTP POST. One client per endpoint: the
//! public read endpoint and the wallet endpoint are separate instances.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::protocol::{RpcRequest, RpcResponse};

/// JSON-RPC code used by several providers for request throttling.
pub const RATE_LIMIT_CODE: i64 = -32005;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RpcClientError {
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Node error: code={code}, message={message}")]
    Node {
        code: i64,
        message: String,
        data: Option<String>,
    },
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl RpcClientError {
    /// Whether the endpoint asked us to slow down.
    pub fn is_rate_limited(&self) -> bool {
        match self {
            Self::Http { status, body } => {
                *status == StatusCode::TOO_MANY_REQUESTS.as_u16() || mentions_rate_limit(body)
            }
            Self::Node { code, message, .. } => {
                *code == RATE_LIMIT_CODE || mentions_rate_limit(message)
            }
            Self::Transport(message) => mentions_rate_limit(message),
            Self::InvalidResponse(_) => false,
        }
    }

    /// Node or transport message, used for revert and rejection detection.
    pub fn message(&self) -> String {
        match self {
            Self::Node { message, data, .. } => match data {
                Some(data) => format!("{message} {data}"),
                None => message.clone(),
            },
            other => other.to_string(),
        }
    }
}

fn mentions_rate_limit(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("429") || lower.contains("too many requests")
}

pub type Result<T> = std::result::Result<T, RpcClientError>;

/// JSON-RPC client bound to a single HTTP endpoint.
pub struct JsonRpcClient {
    http: Client,
    url: String,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RpcClientError::Transport(e.to_string()))?;
        Ok(Self::with_client(http, url))
    }

    pub fn with_client(http: Client, url: &str) -> Self {
        Self {
            http,
            url: url.to_string(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send a request and return the raw `result` (JSON `null` when absent).
    pub async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest::new(method, params, id);

        debug!(method, id, url = %self.url, "RPC request");

        let response = self
            .http
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| RpcClientError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RpcClientError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(RpcClientError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let response: RpcResponse = serde_json::from_str(&body)
            .map_err(|e| RpcClientError::InvalidResponse(e.to_string()))?;

        if let Some(err) = response.error {
            debug!(method, id, code = err.code, "RPC error: {}", err.message);
            return Err(RpcClientError::Node {
                code: err.code,
                message: err.message,
                data: err.data.map(|d| match d {
                    Value::String(s) => s,
                    other => other.to_string(),
                }),
            });
        }

        Ok(response.result.unwrap_or(Value::Null))
    }

    /// Send a request and deserialize a non-null result.
    pub async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let value = self.request(method, params).await?;
        if value.is_null() {
            return Err(RpcClientError::InvalidResponse(format!(
                "No result for {method}"
            )));
        }
        serde_json::from_value(value).map_err(|e| RpcClientError::InvalidResponse(e.to_string()))
    }
}
