//! Pulsemap Node - the main application entry point.
//!
//! Architecture:
//! - Single daemon process with shared RocksDB storage
//! - HTTP API for ingest (submission writes) and aggregate reads
//! - Background scheduler rolling up dirty polls

use crate::api;
use crate::config::NodeConfig;
use crate::error::Result;
use pulsemap_engine::{
    RangeQueryService, ResponseAggregator, RollupEngine, RollupScheduler,
};
use pulsemap_store::{AggregateStore, RocksStore};
use std::sync::Arc;

/// Shared state for the node - single store instance shared by all
/// components.
pub struct NodeState {
    pub store: Arc<dyn AggregateStore>,
    pub aggregator: ResponseAggregator,
    pub rollup: Arc<RollupEngine>,
    pub query: RangeQueryService,
}

impl NodeState {
    /// Wire the engine components around one store.
    pub fn new(store: Arc<dyn AggregateStore>, config: &NodeConfig) -> Self {
        Self {
            aggregator: ResponseAggregator::new(store.clone(), config.ladder.clone()),
            rollup: Arc::new(RollupEngine::new(store.clone(), config.ladder.clone())),
            query: RangeQueryService::new(store.clone(), config.ladder.clone()),
            store,
        }
    }
}

/// A Pulsemap node instance.
pub struct PulsemapNode {
    state: Arc<NodeState>,
    config: NodeConfig,
}

impl PulsemapNode {
    /// Create a new node with RocksDB storage under the data directory.
    pub fn new(config: NodeConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;
        let store: Arc<dyn AggregateStore> = Arc::new(RocksStore::open(&config.data_dir)?);
        let state = Arc::new(NodeState::new(store, &config));
        Ok(Self { state, config })
    }

    /// Get the shared state (for API handlers).
    pub fn state(&self) -> Arc<NodeState> {
        Arc::clone(&self.state)
    }

    /// Run the node (starts the HTTP server and the rollup scheduler).
    pub async fn run(self) -> Result<()> {
        tracing::info!("Pulsemap node starting");
        tracing::info!("  API: http://{}", self.config.api_addr);
        tracing::info!("  Data: {:?}", self.config.data_dir);
        tracing::info!("  Resolutions: {:?}", self.config.ladder.levels());

        let scheduler = RollupScheduler::new(
            self.state.store.clone(),
            self.state.rollup.clone(),
            self.config.rollup_interval,
        );
        scheduler.spawn();

        let app = api::build_router(self.state.clone());

        let listener = tokio::net::TcpListener::bind(self.config.api_addr).await?;
        tracing::info!("HTTP server listening on {}", self.config.api_addr);

        axum::serve(listener, app).await?;

        Ok(())
    }
}
