//! Threshold and validator-set refresh job.
//!
//! Keeps the per-chain signature thresholds and the cached validator sets
//! warm so the round job reads them without touching RPC on its own hot
//! path. Per-chain failures are already absorbed downstream with
//! last-known-good semantics.

use crate::adapters::InMemoryCache;
use async_trait::async_trait;
use ov_01_consensus::{ConsensusLayer, RequiredSignaturesResolver, ValidatorSetFilter};
use ov_03_scheduler::PeriodicJob;
use shared_types::ChainId;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub struct RefreshJob {
    thresholds: Arc<RequiredSignaturesResolver<InMemoryCache>>,
    validator_sets: Arc<ValidatorSetFilter<InMemoryCache>>,
    chains: Vec<ChainId>,
    interval: Duration,
    lock_ttl: Duration,
}

impl RefreshJob {
    pub fn new(
        thresholds: Arc<RequiredSignaturesResolver<InMemoryCache>>,
        validator_sets: Arc<ValidatorSetFilter<InMemoryCache>>,
        chains: Vec<ChainId>,
        interval: Duration,
        lock_ttl: Duration,
    ) -> Self {
        Self {
            thresholds,
            validator_sets,
            chains,
            interval,
            lock_ttl,
        }
    }
}

#[async_trait]
impl PeriodicJob for RefreshJob {
    fn name(&self) -> &str {
        "threshold-refresh"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn lock_ttl(&self) -> Duration {
        self.lock_ttl
    }

    async fn run(&self) -> Result<(), String> {
        self.thresholds.refresh().await;
        let layer2 = self.thresholds.get_all(ConsensusLayer::Layer2).await;
        let on_chain = self.thresholds.get_all(ConsensusLayer::OnChain).await;
        debug!(
            layer2_cached = layer2.len(),
            on_chain_cached = on_chain.len(),
            chains = self.chains.len(),
            "Thresholds refreshed"
        );
        for chain_id in &self.chains {
            if let Err(e) = self.validator_sets.validators(chain_id).await {
                debug!(chain_id = %chain_id, error = %e, "Validator-set warmup failed");
            }
        }
        Ok(())
    }
}
