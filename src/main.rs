use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use split_donate::config::ClientConfig;
use split_donate::{bootstrap, bridge, init_tracing};

/// Bridge a browser GUI to a wallet provider and the donation split contract.
#[derive(Debug, Parser)]
#[command(name = "split-donate", version)]
struct Args {
    /// TOML configuration file; SPLIT_* environment variables override it
    #[arg(long, short, default_value = "split-donate.toml")]
    config: PathBuf,

    /// Listen address, overriding the configuration
    #[arg(long)]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing();

    let mut cfg = ClientConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    if let Some(listen) = args.listen {
        cfg.listen_addr = listen;
    }

    let runtime = bootstrap(&cfg).await?;
    let startup = runtime.startup_config();
    info!(
        wallet_available = startup.wallet_available,
        payee = %startup.payee_address,
        "split-donate starting"
    );

    let addr: SocketAddr = cfg
        .listen_addr
        .parse()
        .with_context(|| format!("invalid listen address `{}`", cfg.listen_addr))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(listen = %addr, "GUI bridge listening");

    axum::serve(listener, bridge::router(runtime))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await?;
    Ok(())
}
