//! Pulsemap Node
//!
//! The daemon wiring: RocksDB-backed store, aggregation engine, HTTP API,
//! and the periodic rollup scheduler.

pub mod api;
mod config;
mod error;
mod node;

pub use config::NodeConfig;
pub use error::{Error, Result};
pub use node::{NodeState, PulsemapNode};
