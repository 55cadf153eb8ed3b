//! Compile, deploy, and configure the split contract.
//!
//! The configuration transaction is only sent once the deployment receipt is
//! in. If it fails the contract stays deployed and unconfigured; the error
//! carries its address so the operator can configure it by hand.

use alloy_json_abi::JsonAbi;
use alloy_primitives::{Address, Bytes, B256, U256};
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

use crate::contract::{missing_method, ContractHandle};
use crate::rpc::RpcError;
use crate::wallet::{TransactionRequest, WalletProvider};

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("compilation failed: {0}")]
    Compile(String),
    #[error("deployment failed: {0}")]
    Deployment(String),
    #[error("contract deployed at {address} but configuration failed: {reason}")]
    Configuration { address: Address, reason: String },
    #[error("invalid ratio: {0}")]
    InvalidRatio(String),
    #[error("contract deployed at {address} but writing the artifact failed: {reason}")]
    Artifact { address: Address, reason: String },
}

#[derive(Debug, Clone)]
pub struct CompiledContract {
    pub abi: JsonAbi,
    pub bytecode: Bytes,
}

pub trait Compiler: Send + Sync {
    fn compile(&self, source: &Path, contract_name: &str) -> Result<CompiledContract, DeployError>;
}

/// `solc` run as a subprocess.
pub struct Solc {
    pub binary: PathBuf,
}

impl Compiler for Solc {
    fn compile(&self, source: &Path, contract_name: &str) -> Result<CompiledContract, DeployError> {
        tracing::info!(source = %source.display(), contract = contract_name, "compiling");
        let output = Command::new(&self.binary)
            .arg("--combined-json")
            .arg("abi,bin")
            .arg(source)
            .output()
            .map_err(|e| {
                DeployError::Compile(format!("failed to run {}: {}", self.binary.display(), e))
            })?;

        if !output.status.success() {
            return Err(DeployError::Compile(
                String::from_utf8_lossy(&output.stderr).into_owned(),
            ));
        }
        parse_combined_json(&String::from_utf8_lossy(&output.stdout), contract_name)
    }
}

/// Pick `contract_name` out of `solc --combined-json abi,bin` output.
///
/// Keys look like `path/File.sol:Name` (or `:Name` for stdin input). Older
/// compilers emit the ABI as a JSON string, newer ones as an array.
pub fn parse_combined_json(output: &str, contract_name: &str) -> Result<CompiledContract, DeployError> {
    let json: serde_json::Value = serde_json::from_str(output)
        .map_err(|e| DeployError::Compile(format!("unreadable compiler output: {}", e)))?;
    let contracts = json
        .get("contracts")
        .and_then(|c| c.as_object())
        .ok_or_else(|| DeployError::Compile("compiler output has no contracts".to_string()))?;

    let suffix = format!(":{}", contract_name);
    let entry = contracts
        .iter()
        .find(|(key, _)| key.ends_with(&suffix) || key.as_str() == contract_name)
        .map(|(_, v)| v)
        .ok_or_else(|| {
            DeployError::Compile(format!("contract `{}` not found in compiler output", contract_name))
        })?;

    let abi_value = match entry.get("abi") {
        Some(serde_json::Value::String(raw)) => serde_json::from_str(raw)
            .map_err(|e| DeployError::Compile(format!("unreadable ABI: {}", e)))?,
        Some(value) => value.clone(),
        None => return Err(DeployError::Compile("compiler output has no ABI".to_string())),
    };
    let abi: JsonAbi = serde_json::from_value(abi_value)
        .map_err(|e| DeployError::Compile(format!("unreadable ABI: {}", e)))?;
    if let Some(name) = missing_method(&abi) {
        return Err(DeployError::Compile(format!("contract ABI is missing method `{}`", name)));
    }

    let bin = entry
        .get("bin")
        .and_then(|b| b.as_str())
        .map(|b| b.trim_start_matches("0x"))
        .filter(|b| !b.is_empty())
        .ok_or_else(|| DeployError::Compile("compiler output has no bytecode".to_string()))?;
    let bytecode = hex::decode(bin)
        .map_err(|e| DeployError::Compile(format!("bytecode is not hex: {}", e)))?;

    Ok(CompiledContract {
        abi,
        bytecode: bytecode.into(),
    })
}

/// Operator inputs for one run.
#[derive(Debug, Clone)]
pub struct DeployPlan {
    pub deployer: Address,
    pub configurer: Address,
    pub numerator: U256,
    pub denominator: U256,
    pub gas_limit: Option<u64>,
    pub gas_headroom_percent: u64,
}

impl DeployPlan {
    pub fn validate(&self) -> Result<(), DeployError> {
        if self.denominator.is_zero() {
            return Err(DeployError::InvalidRatio("denominator must be nonzero".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Deployment {
    pub handle: ContractHandle,
    pub deploy_tx: B256,
    pub configure_tx: B256,
}

fn with_headroom(estimate: U256, percent: u64) -> U256 {
    estimate + estimate * U256::from(percent) / U256::from(100u64)
}

/// Deploy `compiled`, wait for it to be mined, then configure the payee ratio.
pub async fn deploy_and_configure(
    wallet: &dyn WalletProvider,
    compiled: &CompiledContract,
    plan: &DeployPlan,
) -> Result<Deployment, DeployError> {
    plan.validate()?;
    let deploy_err = |e: RpcError| DeployError::Deployment(e.to_string());

    let mut tx = TransactionRequest {
        from: plan.deployer,
        to: None,
        value: None,
        gas: None,
        data: compiled.bytecode.clone(),
    };
    let gas = match plan.gas_limit {
        Some(limit) => U256::from(limit),
        None => {
            let estimate = wallet.estimate_gas(&tx).await.map_err(deploy_err)?;
            with_headroom(estimate, plan.gas_headroom_percent)
        }
    };
    tx.gas = Some(gas);

    let deploy_tx = wallet.send_transaction(&tx).await.map_err(deploy_err)?;
    tracing::info!(tx = %deploy_tx, deployer = %plan.deployer, gas = %gas, "deployment submitted");

    let receipt = wallet.wait_for_receipt(deploy_tx).await.map_err(deploy_err)?;
    if !receipt.succeeded() {
        let used = receipt
            .gas_used
            .map(|g| g.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        return Err(DeployError::Deployment(format!(
            "transaction {} reverted (gas used {} of limit {})",
            deploy_tx, used, gas
        )));
    }
    let address = receipt.contract_address.ok_or_else(|| {
        DeployError::Deployment(format!("receipt of {} has no contract address", deploy_tx))
    })?;
    tracing::info!(%address, "contract deployed");

    let config_err = |reason: String| DeployError::Configuration { address, reason };
    let configure = TransactionRequest {
        from: plan.configurer,
        to: Some(address),
        value: None,
        gas: None,
        data: ContractHandle::configure_call(plan.numerator, plan.denominator),
    };
    let configure_tx = wallet
        .send_transaction(&configure)
        .await
        .map_err(|e| config_err(e.to_string()))?;
    let receipt = wallet
        .wait_for_receipt(configure_tx)
        .await
        .map_err(|e| config_err(e.to_string()))?;
    if !receipt.succeeded() {
        return Err(config_err(format!("transaction {} reverted", configure_tx)));
    }
    tracing::info!(tx = %configure_tx, numerator = %plan.numerator, denominator = %plan.denominator, "payee ratio configured");

    let handle = ContractHandle::new(address, compiled.abi.clone())
        .map_err(|e| DeployError::Compile(e.to_string()))?;
    Ok(Deployment {
        handle,
        deploy_tx,
        configure_tx,
    })
}

/// Compile then [`deploy_and_configure`]; writes the artifact if asked to.
pub async fn run(
    compiler: &dyn Compiler,
    wallet: &dyn WalletProvider,
    source: &Path,
    contract_name: &str,
    plan: &DeployPlan,
    artifact: Option<&Path>,
) -> Result<Deployment, DeployError> {
    plan.validate()?;
    let compiled = compiler.compile(source, contract_name)?;
    let deployment = deploy_and_configure(wallet, &compiled, plan).await?;
    if let Some(path) = artifact {
        deployment
            .handle
            .save(path)
            .map_err(|e| DeployError::Artifact {
                address: deployment.handle.address,
                reason: e.to_string(),
            })?;
        tracing::info!(path = %path.display(), "deployment artifact written");
    }
    Ok(deployment)
}
