//! JSON-RPC client for Ethereum-style nodes and wallet providers.
//!
//! One primary endpoint plus optional fallbacks; transport failures move on to
//! the next endpoint with exponential backoff, JSON-RPC error objects are
//! returned immediately.

use alloy_primitives::B256;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("endpoint {url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("malformed response to {method}: {reason}")]
    Decode { method: String, reason: String },
    #[error("all {attempts} RPC endpoints failed, last error: {last}")]
    Exhausted { attempts: usize, last: String },
    #[error("timed out waiting for receipt of {0}")]
    ReceiptTimeout(B256),
}

/// Configuration for a single JSON-RPC endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    pub url: String,
    #[serde(default)]
    pub fallback_urls: Vec<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Interval between `eth_getTransactionReceipt` polls
    #[serde(default = "default_receipt_poll_ms")]
    pub receipt_poll_ms: u64,
    /// Give up waiting for a receipt after this long
    #[serde(default = "default_receipt_timeout_secs")]
    pub receipt_timeout_secs: u64,
}

fn default_timeout_ms() -> u64 {
    8000
}

fn default_receipt_poll_ms() -> u64 {
    500
}

fn default_receipt_timeout_secs() -> u64 {
    300
}

impl RpcConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            fallback_urls: Vec::new(),
            timeout_ms: default_timeout_ms(),
            receipt_poll_ms: default_receipt_poll_ms(),
            receipt_timeout_secs: default_receipt_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

pub struct RpcClient {
    pub primary_url: String,
    pub fallback_urls: Vec<String>,
    http: Client,
}

impl RpcClient {
    pub fn from_config(cfg: &RpcConfig) -> Result<Self, RpcError> {
        let http = Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()?;

        Ok(Self {
            primary_url: cfg.url.clone(),
            fallback_urls: cfg.fallback_urls.clone(),
            http,
        })
    }

    /// Call RPC method with automatic failover and exponential backoff
    pub async fn call(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, RpcError> {
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let urls = std::iter::once(&self.primary_url).chain(self.fallback_urls.iter());
        let max_attempts = 1 + self.fallback_urls.len();
        let mut backoff_ms = 100u64;
        let mut last_error = String::new();

        for (attempt, url) in urls.enumerate() {
            if attempt > 0 {
                tracing::debug!(method, backoff_ms, "backing off before retry");
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                backoff_ms = (backoff_ms * 2).min(10_000);
            }

            let resp = match self.http.post(url).json(&body).send().await {
                Ok(resp) => resp,
                Err(e) => {
                    tracing::warn!(
                        url = %url,
                        method,
                        error = %e,
                        attempt = attempt + 1,
                        max_attempts,
                        "RPC request failed"
                    );
                    last_error = e.to_string();
                    continue;
                }
            };

            if !resp.status().is_success() {
                tracing::warn!(
                    url = %url,
                    method,
                    status = %resp.status(),
                    attempt = attempt + 1,
                    max_attempts,
                    "RPC endpoint returned error status"
                );
                last_error = RpcError::Status {
                    url: url.clone(),
                    status: resp.status().as_u16(),
                }
                .to_string();
                continue;
            }

            let parsed: RpcResponse = match resp.json().await {
                Ok(parsed) => parsed,
                Err(e) => {
                    tracing::warn!(
                        url = %url,
                        method,
                        error = %e,
                        attempt = attempt + 1,
                        max_attempts,
                        "RPC endpoint returned an unreadable body"
                    );
                    last_error = e.to_string();
                    continue;
                }
            };
            if let Some(err) = parsed.error {
                tracing::debug!(method, code = err.code, message = %err.message, "RPC error response");
                return Err(RpcError::Rpc {
                    code: err.code,
                    message: err.message,
                });
            }

            if attempt > 0 {
                tracing::info!(url = %url, method, "RPC request succeeded after {} retries", attempt);
            }

            return Ok(parsed.result.unwrap_or(serde_json::Value::Null));
        }

        Err(RpcError::Exhausted {
            attempts: max_attempts,
            last: last_error,
        })
    }

    /// Call and decode the result into `T`
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T, RpcError> {
        let value = self.call(method, params).await?;
        serde_json::from_value(value).map_err(|e| RpcError::Decode {
            method: method.to_string(),
            reason: e.to_string(),
        })
    }
}
