//! Node configuration.

use crate::error::{Error, Result};
use pulsemap_engine::ResolutionLadder;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for a Pulsemap node.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Data directory for storage
    pub data_dir: PathBuf,

    /// HTTP API listen address
    pub api_addr: SocketAddr,

    /// Aggregated resolution levels; the finest is the base layer
    pub ladder: ResolutionLadder,

    /// How often the scheduler rolls up dirty polls
    pub rollup_interval: Duration,
}

impl NodeConfig {
    /// Create config from environment variables with sensible defaults.
    pub fn from_env() -> Result<Self> {
        let data_dir = PathBuf::from(
            std::env::var("PULSEMAP_DATA_DIR").unwrap_or_else(|_| "./pulsemap-data".to_string()),
        );

        let api_addr = std::env::var("PULSEMAP_API_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()
            .map_err(|_| Error::Config("invalid PULSEMAP_API_ADDR".into()))?;

        let ladder = std::env::var("PULSEMAP_RESOLUTIONS")
            .unwrap_or_else(|_| "4,6,8".to_string())
            .parse::<ResolutionLadder>()
            .map_err(|e| Error::Config(format!("invalid PULSEMAP_RESOLUTIONS: {e}")))?;

        let rollup_interval = std::env::var("PULSEMAP_ROLLUP_INTERVAL_SECS")
            .unwrap_or_else(|_| "60".to_string())
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| Error::Config("invalid PULSEMAP_ROLLUP_INTERVAL_SECS".into()))?;

        Ok(Self {
            data_dir,
            api_addr,
            ladder,
            rollup_interval,
        })
    }
}
