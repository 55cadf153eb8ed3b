//! Deployment utility configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::{env_number, read_toml, ConfigError};
use crate::rpc::RpcConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    /// Node the deployer and configurer accounts are unlocked on
    pub rpc: RpcConfig,

    /// Solidity source of the split contract
    pub source: PathBuf,

    /// Contract to pick out of the compiler output
    pub contract_name: String,

    /// `solc` executable
    pub solc: PathBuf,

    /// Fixed gas limit for the deployment; estimated when unset
    pub gas_limit: Option<u64>,

    /// Margin added on top of an estimated gas limit, in percent
    pub gas_headroom_percent: u64,

    /// Where to write `{address, abi}` after a successful deployment
    pub artifact: Option<PathBuf>,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            rpc: RpcConfig::new("http://localhost:8545"),
            source: PathBuf::from("contract/SplitDonation.sol"),
            contract_name: "SplitDonation".to_string(),
            solc: PathBuf::from("solc"),
            gas_limit: None,
            gas_headroom_percent: 20,
            artifact: None,
        }
    }
}

impl DeployConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::load_with(path, super::process_env)
    }

    pub fn load_with(
        path: &Path,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config: DeployConfig = read_toml(path)?.unwrap_or_default();
        config.apply_env_overrides(env)?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env_overrides(
        &mut self,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(url) = env("SPLIT_RPC_URL") {
            self.rpc.url = url.trim().to_string();
        }
        if let Some(solc) = env("SPLIT_SOLC") {
            self.solc = PathBuf::from(solc.trim());
        }
        if let Some(val) = env("SPLIT_GAS_LIMIT") {
            self.gas_limit = Some(env_number("SPLIT_GAS_LIMIT", &val)?);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rpc.url.trim().is_empty() {
            return Err(ConfigError::Invalid("rpc.url must be set".to_string()));
        }
        if self.contract_name.trim().is_empty() {
            return Err(ConfigError::Invalid("contract_name must be set".to_string()));
        }
        if self.gas_limit == Some(0) {
            return Err(ConfigError::Invalid("gas_limit must be positive".to_string()));
        }
        Ok(())
    }
}
