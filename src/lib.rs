//! Donation split dapp: deploy the percentage-split contract, and bridge a GUI
//! to a wallet provider for reading the donation percentage and paying.

pub mod amount;
pub mod attestation;
pub mod bootstrap;
pub mod bridge;
pub mod client;
pub mod config;
pub mod contract;
pub mod deploy;
pub mod percent;
pub mod ports;
pub mod rpc;
pub mod session;
pub mod validation;
pub mod wallet;

pub use bootstrap::{bootstrap, AccountState, AccountWatcher, ClientRuntime};
pub use client::{ClientContext, ClientError};
pub use contract::ContractHandle;
pub use ports::{GuiEvent, GuiRequest, PortSender};
pub use session::Session;
pub use wallet::{JsonRpcWallet, WalletProvider};

/// Initialise `tracing` from `SPLIT_LOG`, falling back to `RUST_LOG`, then `info`.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = std::env::var("SPLIT_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".into());
    let env_filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}
