use std::path::PathBuf;
use std::process::ExitCode;

use alloy_primitives::{Address, U256};
use clap::Parser;

use split_donate::config::DeployConfig;
use split_donate::deploy::{self, DeployError, DeployPlan, Solc};
use split_donate::init_tracing;
use split_donate::validation::parse_address;
use split_donate::wallet::JsonRpcWallet;

/// Deploy the donation split contract and set the payee's donation ratio.
#[derive(Debug, Parser)]
#[command(name = "split-deploy", version)]
struct Cli {
    /// Account that deploys the contract (must be unlocked on the node)
    #[arg(value_parser = address_arg)]
    deployer: Address,

    /// Account whose donation ratio is configured, i.e. the payee
    #[arg(value_parser = address_arg)]
    configurer: Address,

    /// Donated share numerator
    #[arg(value_parser = uint_arg)]
    numerator: U256,

    /// Donated share denominator, nonzero
    #[arg(value_parser = uint_arg)]
    denominator: U256,

    /// TOML configuration file
    #[arg(long, default_value = "split-deploy.toml")]
    config: PathBuf,

    /// JSON-RPC endpoint of the node
    #[arg(long)]
    rpc_url: Option<String>,

    /// Solidity source file
    #[arg(long)]
    source: Option<PathBuf>,

    /// Contract name inside the compiler output
    #[arg(long)]
    contract: Option<String>,

    /// Fixed deployment gas limit instead of an estimate
    #[arg(long)]
    gas_limit: Option<u64>,

    /// solc executable
    #[arg(long)]
    solc: Option<PathBuf>,

    /// Write the `{address, abi}` deployment artifact here
    #[arg(long)]
    artifact: Option<PathBuf>,
}

fn address_arg(s: &str) -> Result<Address, String> {
    parse_address(s).ok_or_else(|| format!("`{}` is not a valid address", s))
}

fn uint_arg(s: &str) -> Result<U256, String> {
    U256::from_str_radix(s.trim(), 10).map_err(|e| format!("`{}` is not an unsigned integer: {}", s, e))
}

impl Cli {
    fn merged_config(&self) -> anyhow::Result<DeployConfig> {
        let mut cfg = DeployConfig::load(&self.config)?;
        if let Some(url) = &self.rpc_url {
            cfg.rpc.url = url.clone();
        }
        if let Some(source) = &self.source {
            cfg.source = source.clone();
        }
        if let Some(name) = &self.contract {
            cfg.contract_name = name.clone();
        }
        if self.gas_limit.is_some() {
            cfg.gas_limit = self.gas_limit;
        }
        if let Some(solc) = &self.solc {
            cfg.solc = solc.clone();
        }
        if self.artifact.is_some() {
            cfg.artifact = self.artifact.clone();
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let cfg = cli.merged_config()?;
    let plan = DeployPlan {
        deployer: cli.deployer,
        configurer: cli.configurer,
        numerator: cli.numerator,
        denominator: cli.denominator,
        gas_limit: cfg.gas_limit,
        gas_headroom_percent: cfg.gas_headroom_percent,
    };

    let wallet = JsonRpcWallet::from_config(&cfg.rpc)?;
    let solc = Solc {
        binary: cfg.solc.clone(),
    };
    println!("Deploying {} from {} via {}", cfg.contract_name, plan.deployer, wallet.url());

    match deploy::run(
        &solc,
        &wallet,
        &cfg.source,
        &cfg.contract_name,
        &plan,
        cfg.artifact.as_deref(),
    )
    .await
    {
        Ok(deployment) => {
            println!("Contract address: {}", deployment.handle.address);
            println!(
                "Donation ratio for {} set to {}/{}",
                plan.configurer, plan.numerator, plan.denominator
            );
            if let Some(path) = &cfg.artifact {
                println!("Artifact: {}", path.display());
            }
            Ok(())
        }
        Err(DeployError::Configuration { address, reason }) => {
            // the contract exists and can be configured by hand
            println!("Contract address: {}", address);
            anyhow::bail!("configuration of {} failed: {}", address, reason)
        }
        Err(DeployError::Artifact { address, reason }) => {
            println!("Contract address: {}", address);
            println!(
                "Donation ratio for {} set to {}/{}",
                plan.configurer, plan.numerator, plan.denominator
            );
            anyhow::bail!("artifact for {} not written: {}", address, reason)
        }
        Err(e) => Err(e.into()),
    }
}
