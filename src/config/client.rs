//! Page client configuration

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::{env_address, env_number, read_toml, ConfigError};
use crate::contract::ContractHandle;
use crate::rpc::RpcConfig;

/// MetaMask's recommended account polling cadence
pub const DEFAULT_ACCOUNT_POLL_MS: u64 = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Wallet provider endpoint; `None` runs without a wallet
    pub wallet: Option<RpcConfig>,

    /// Address of the deployed split contract (built-in interface)
    pub contract_address: Option<Address>,

    /// Artifact written by `split-deploy --artifact`; wins over `contract_address`
    pub deployment_artifact: Option<PathBuf>,

    /// Payee the contract was configured for
    pub payee: Address,

    /// Origin named in the payment attestation, e.g. `https://shop.example`
    pub origin: Option<String>,

    /// Address the GUI bridge listens on
    pub listen_addr: String,

    pub account_poll_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            wallet: Some(RpcConfig::new("http://localhost:8545")),
            contract_address: None,
            deployment_artifact: None,
            payee: Address::ZERO,
            origin: None,
            listen_addr: "127.0.0.1:8080".to_string(),
            account_poll_ms: DEFAULT_ACCOUNT_POLL_MS,
        }
    }
}

impl ClientConfig {
    /// File (if present) + process environment, validated.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::load_with(path, super::process_env)
    }

    pub fn load_with(
        path: &Path,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config: ClientConfig = read_toml(path)?.unwrap_or_default();
        config.apply_env_overrides(env)?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env_overrides(
        &mut self,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        // SPLIT_RPC_URL: empty or "none" disables the wallet
        if let Some(url) = env("SPLIT_RPC_URL") {
            let url = url.trim();
            if url.is_empty() || url.eq_ignore_ascii_case("none") {
                self.wallet = None;
            } else {
                match self.wallet.as_mut() {
                    Some(rpc) => rpc.url = url.to_string(),
                    None => self.wallet = Some(RpcConfig::new(url)),
                }
            }
        }

        if let Some(val) = env("SPLIT_CONTRACT_ADDRESS") {
            self.contract_address = Some(env_address("SPLIT_CONTRACT_ADDRESS", &val)?);
        }

        if let Some(val) = env("SPLIT_DEPLOYMENT_ARTIFACT") {
            self.deployment_artifact = Some(PathBuf::from(val.trim()));
        }

        if let Some(val) = env("SPLIT_PAYEE") {
            self.payee = env_address("SPLIT_PAYEE", &val)?;
        }

        if let Some(val) = env("SPLIT_ORIGIN") {
            self.origin = Some(val.trim().to_string()).filter(|o| !o.is_empty());
        }

        if let Some(val) = env("SPLIT_LISTEN") {
            self.listen_addr = val.trim().to_string();
        }

        if let Some(val) = env("SPLIT_POLL_MS") {
            self.account_poll_ms = env_number("SPLIT_POLL_MS", &val)?;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.payee == Address::ZERO {
            return Err(ConfigError::Invalid("payee must be set".to_string()));
        }
        if self.contract_address.is_none() && self.deployment_artifact.is_none() {
            return Err(ConfigError::Invalid(
                "either contract_address or deployment_artifact must be set".to_string(),
            ));
        }
        if self.account_poll_ms == 0 {
            return Err(ConfigError::Invalid(
                "account_poll_ms must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn contract_handle(&self) -> Result<ContractHandle, ConfigError> {
        if let Some(path) = &self.deployment_artifact {
            return Ok(ContractHandle::load(path)?);
        }
        self.contract_address
            .map(ContractHandle::at)
            .ok_or_else(|| ConfigError::Invalid("no contract configured".to_string()))
    }
}
