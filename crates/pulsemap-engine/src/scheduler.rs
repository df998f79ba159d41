//! Periodic rollup of dirty polls.

use crate::error::Error;
use crate::rollup::RollupEngine;
use pulsemap_store::AggregateStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Drives the rollup engine from the dirty-poll set on a fixed interval.
///
/// A failed rollup leaves its poll dirty, so it is retried on the next tick
/// rather than immediately; other polls in the same tick are unaffected.
pub struct RollupScheduler {
    store: Arc<dyn AggregateStore>,
    engine: Arc<RollupEngine>,
    interval: Duration,
}

impl RollupScheduler {
    pub fn new(
        store: Arc<dyn AggregateStore>,
        engine: Arc<RollupEngine>,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            engine,
            interval,
        }
    }

    /// Spawn the scheduler loop.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(interval_secs = self.interval.as_secs(), "rollup scheduler started");
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick fires immediately; skip it so a fresh start
            // does not race initial ingest.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                self.run_once();
            }
        })
    }

    /// Roll up every dirty poll once. Returns the number of successful
    /// rollups.
    pub fn run_once(&self) -> usize {
        let polls = match self.store.list_dirty_polls() {
            Ok(polls) => polls,
            Err(e) => {
                warn!(error = %e, "failed to list dirty polls");
                return 0;
            }
        };

        let mut rolled = 0;
        for poll in polls {
            match self.engine.rollup(&poll) {
                Ok(summary) => {
                    debug!(poll, counted = summary.respondents_counted, "scheduled rollup done");
                    rolled += 1;
                }
                Err(Error::RollupInProgress(_)) => {
                    debug!(poll, "rollup already running, skipping");
                }
                Err(e) => {
                    warn!(poll, error = %e, "rollup failed, poll stays dirty");
                }
            }
        }
        rolled
    }
}
