//! Start-up: detect the wallet provider, build the client context, and run the
//! account poller.

use alloy_primitives::Address;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::client::ClientContext;
use crate::config::ClientConfig;
use crate::ports::StartupConfig;
use crate::wallet::{JsonRpcWallet, WalletProvider};

/// The wallet's selected account as last seen by the poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountState {
    /// No successful poll yet.
    Unsampled,
    /// First account reported by the wallet, `None` when it exposes none.
    Selected(Option<Address>),
}

/// Polls the wallet for its selected account and publishes changes.
pub struct AccountWatcher;

impl AccountWatcher {
    /// Spawn the poller. Only samples that differ from the previous one wake
    /// receivers. The task ends once every receiver has been dropped.
    pub fn spawn(
        wallet: Arc<dyn WalletProvider>,
        period: Duration,
    ) -> (watch::Receiver<AccountState>, JoinHandle<()>) {
        let (tx, rx) = watch::channel(AccountState::Unsampled);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                if tx.is_closed() {
                    break;
                }

                match wallet.accounts().await {
                    Ok(accounts) => {
                        let sample = AccountState::Selected(accounts.first().copied());
                        let changed = tx.send_if_modified(|current| {
                            if *current == sample {
                                false
                            } else {
                                *current = sample;
                                true
                            }
                        });
                        if changed {
                            tracing::info!(account = ?accounts.first(), "selected account changed");
                        }
                    }
                    Err(e) => tracing::debug!(error = %e, "account poll failed"),
                }
            }
            tracing::debug!("account poller stopped");
        });

        (rx, handle)
    }
}

/// Returns the provider when it is configured and answers.
pub async fn detect_wallet(cfg: &ClientConfig) -> Option<Arc<dyn WalletProvider>> {
    let rpc = cfg.wallet.as_ref()?;
    let wallet = match JsonRpcWallet::from_config(rpc) {
        Ok(w) => w,
        Err(e) => {
            tracing::warn!(error = %e, "wallet provider client could not be built");
            return None;
        }
    };

    match wallet.chain_id().await {
        Ok(chain_id) => {
            tracing::info!(url = %wallet.url(), chain_id, "wallet provider detected");
            Some(Arc::new(wallet) as Arc<dyn WalletProvider>)
        }
        Err(e) => {
            tracing::warn!(url = %wallet.url(), error = %e, "wallet provider not reachable, running without wallet");
            None
        }
    }
}

/// Shared state for every GUI session in this process.
#[derive(Clone)]
pub struct ClientRuntime {
    pub ctx: Arc<ClientContext>,
    pub accounts: Option<watch::Receiver<AccountState>>,
}

impl ClientRuntime {
    /// With a wallet in the context, start polling it for account changes.
    pub fn start(ctx: ClientContext, poll_period: Duration) -> Self {
        let accounts = ctx
            .wallet_handle()
            .map(|wallet| AccountWatcher::spawn(wallet, poll_period).0);
        Self {
            ctx: Arc::new(ctx),
            accounts,
        }
    }

    pub fn startup_config(&self) -> StartupConfig {
        StartupConfig {
            wallet_available: self.ctx.wallet_available(),
            payee_address: self.ctx.payee(),
        }
    }
}

/// Full start-up from configuration.
pub async fn bootstrap(cfg: &ClientConfig) -> anyhow::Result<ClientRuntime> {
    let contract = cfg.contract_handle()?;
    tracing::info!(contract = %contract.address, payee = %cfg.payee, "client configured");

    let wallet = detect_wallet(cfg).await;
    let ctx = ClientContext::new(wallet, contract, cfg.payee, cfg.origin.clone());
    Ok(ClientRuntime::start(
        ctx,
        Duration::from_millis(cfg.account_poll_ms),
    ))
}
