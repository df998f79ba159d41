//! Pulsemap Node binary
//!
//! Geospatial poll aggregation daemon.

use pulsemap_node::{NodeConfig, PulsemapNode};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pulsemap_node=info,pulsemap_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Pulsemap Node");

    let config = NodeConfig::from_env()?;

    let node = PulsemapNode::new(config)?;
    node.run().await?;

    Ok(())
}
