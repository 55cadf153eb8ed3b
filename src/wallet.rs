//! Wallet provider capability.
//!
//! Everything the client and the deployer need from a wallet or node:
//! read the selected accounts, read and write the contract, wait for a
//! receipt, and sign a message. [`JsonRpcWallet`] implements it over the
//! standard Ethereum JSON-RPC methods.

use alloy_primitives::{Address, Bytes, B256, U256, U64};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::{Duration, Instant};

use crate::rpc::{RpcClient, RpcConfig, RpcError};

/// Transaction as accepted by `eth_sendTransaction` / `eth_estimateGas`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    pub from: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas: Option<U256>,
    pub data: Bytes,
}

/// The subset of `eth_getTransactionReceipt` we act on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    #[serde(default)]
    pub contract_address: Option<Address>,
    /// 1 on success, 0 on revert (absent on pre-Byzantium chains)
    #[serde(default)]
    pub status: Option<U64>,
    #[serde(default)]
    pub gas_used: Option<U256>,
    #[serde(default)]
    pub block_number: Option<U64>,
}

impl TransactionReceipt {
    pub fn succeeded(&self) -> bool {
        self.status.map_or(true, |s| s == U64::from(1u64))
    }
}

#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Answers only when a provider is present; used for detection.
    async fn chain_id(&self) -> Result<u64, RpcError>;

    /// Accounts exposed by the wallet, selected account first.
    async fn accounts(&self) -> Result<Vec<Address>, RpcError>;

    /// Read-only contract call against the latest block.
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, RpcError>;

    async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<U256, RpcError>;

    /// Submit a transaction; resolves once the hash is known.
    async fn send_transaction(&self, tx: &TransactionRequest) -> Result<B256, RpcError>;

    /// Resolve once the transaction is mined.
    async fn wait_for_receipt(&self, hash: B256) -> Result<TransactionReceipt, RpcError>;

    /// `personal_sign` of a UTF-8 message by `signer`.
    async fn sign_message(&self, message: &str, signer: Address) -> Result<Bytes, RpcError>;
}

pub struct JsonRpcWallet {
    client: RpcClient,
    receipt_poll: Duration,
    receipt_timeout: Duration,
}

impl JsonRpcWallet {
    pub fn from_config(cfg: &RpcConfig) -> Result<Self, RpcError> {
        Ok(Self {
            client: RpcClient::from_config(cfg)?,
            receipt_poll: Duration::from_millis(cfg.receipt_poll_ms.max(1)),
            receipt_timeout: Duration::from_secs(cfg.receipt_timeout_secs),
        })
    }

    pub fn url(&self) -> &str {
        &self.client.primary_url
    }
}

#[async_trait]
impl WalletProvider for JsonRpcWallet {
    async fn chain_id(&self) -> Result<u64, RpcError> {
        let id: U64 = self.client.request("eth_chainId", json!([])).await?;
        Ok(id.to::<u64>())
    }

    async fn accounts(&self) -> Result<Vec<Address>, RpcError> {
        self.client.request("eth_accounts", json!([])).await
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, RpcError> {
        self.client
            .request("eth_call", json!([{ "to": to, "data": data }, "latest"]))
            .await
    }

    async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<U256, RpcError> {
        self.client.request("eth_estimateGas", json!([tx])).await
    }

    async fn send_transaction(&self, tx: &TransactionRequest) -> Result<B256, RpcError> {
        self.client.request("eth_sendTransaction", json!([tx])).await
    }

    /// Poll errors are logged and retried; only the timeout ends the wait.
    async fn wait_for_receipt(&self, hash: B256) -> Result<TransactionReceipt, RpcError> {
        let started = Instant::now();
        loop {
            let polled: Result<Option<TransactionReceipt>, RpcError> = self
                .client
                .request("eth_getTransactionReceipt", json!([hash]))
                .await;
            match polled {
                Ok(Some(receipt)) => return Ok(receipt),
                Ok(None) => {}
                Err(e) => tracing::debug!(tx = %hash, error = %e, "receipt poll failed"),
            }
            if started.elapsed() >= self.receipt_timeout {
                return Err(RpcError::ReceiptTimeout(hash));
            }
            tokio::time::sleep(self.receipt_poll).await;
        }
    }

    async fn sign_message(&self, message: &str, signer: Address) -> Result<Bytes, RpcError> {
        let payload = format!("0x{}", hex::encode(message.as_bytes()));
        self.client
            .request("personal_sign", json!([payload, signer]))
            .await
    }
}
