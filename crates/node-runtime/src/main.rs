use anyhow::{Context, Result};
use node_runtime::config::NodeConfig;
use node_runtime::container;
use oracle_telemetry::{init_telemetry, TelemetryConfig};
use ov_02_dispatch::domain::ChainPolicy;
use shared_types::{Address, ChainId};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    init_telemetry(&TelemetryConfig::from_env()).context("Failed to initialize telemetry")?;

    let mut config = NodeConfig::load().context("Failed to load configuration")?;

    // A bare config still yields a runnable node: one simulated chain.
    if config.chains.is_empty() {
        info!("No chains configured, falling back to a single devnet chain");
        config.chains.push(node_runtime::config::ChainConfig {
            id: ChainId::devnet(),
            active: true,
            sender: Address::new("0xdevnode").context("devnet sender")?,
            policy: ChainPolicy::default(),
        });
    }

    let container = container::build_devnet(&config).context("Failed to wire node")?;
    let handles = container.start();
    info!("Oracle node is running. Press Ctrl+C to stop.");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Shutting down");
    for handle in handles {
        handle.abort();
    }
    Ok(())
}
