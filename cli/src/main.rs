pub mod cli;

use anyhow::Context;
use clap::Parser;
use tokio::sync::broadcast::error::RecvError;

use cli::Cli;
use common::logger::init_logger;
use config_discovery::{ConfigDiscovery, Snapshot};

fn print_markets(snapshot: &Snapshot, asset: &str) {
    let markets = snapshot.markets_by_asset_name(asset);
    if markets.is_empty() {
        println!("No markets for {asset} (composedAt={})", snapshot.composed_at());
        return;
    }

    for market in markets {
        println!(
            "Market {}: address={}, vaultAddress={}, settlementToken={}",
            market.name, market.address, market.vault_address, market.settlement_token
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger("config-discovery");

    let cli = Cli::parse();

    let mut discovery = ConfigDiscovery::connect(cli.discovery_config())
        .await
        .with_context(|| format!("can't initialize config from {}", cli.url))?;

    let snapshot = discovery.snapshot()?;
    print_markets(&snapshot, &cli.asset);

    if cli.watch {
        let mut updates = discovery.subscribe();

        loop {
            tokio::select! {
                res = updates.recv() => match res {
                    Ok(snapshot) => {
                        tracing::info!(composed_at = %snapshot.composed_at(), "config updated");
                        print_markets(&snapshot, &cli.asset);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "update feed lagged");
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Shutdown signal received");
                    break;
                }
            }
        }
    }

    discovery.shutdown().await;

    Ok(())
}
