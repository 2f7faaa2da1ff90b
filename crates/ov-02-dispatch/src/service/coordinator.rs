//! Fan-out of one round's payloads across all configured chains.
//!
//! Chains are independent: every engine runs concurrently and a failure on
//! one chain never blocks or fails another. The coordinator itself never
//! returns an error; per-chain outcomes carry the failures.

use crate::domain::DispatchError;
use crate::service::engine::{DispatchConfirmation, DispatchEngine};
use shared_types::{ChainId, DeviationConsensus};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, warn};

/// What happened on one chain during one round.
#[derive(Debug)]
pub struct ChainDispatchOutcome {
    pub chain_id: ChainId,
    pub result: Result<DispatchConfirmation, DispatchError>,
}

/// Routes per-chain payloads to their engines.
pub struct DispatchCoordinator {
    engines: HashMap<ChainId, Arc<DispatchEngine>>,
}

impl DispatchCoordinator {
    pub fn new(engines: Vec<Arc<DispatchEngine>>) -> Self {
        let engines = engines
            .into_iter()
            .map(|e| (e.chain_id().clone(), e))
            .collect();
        Self { engines }
    }

    pub fn chains(&self) -> impl Iterator<Item = &ChainId> {
        self.engines.keys()
    }

    /// Dispatch every payload of a round, concurrently, one engine per
    /// chain. Payloads for chains without a configured engine are dropped
    /// with a warning.
    pub async fn dispatch_round(
        &self,
        payloads: HashMap<ChainId, DeviationConsensus>,
    ) -> Vec<ChainDispatchOutcome> {
        let mut tasks = JoinSet::new();
        for (chain_id, consensus) in payloads {
            let Some(engine) = self.engines.get(&chain_id) else {
                warn!(chain_id = %chain_id, "No dispatch engine configured for chain, dropping payload");
                continue;
            };
            let engine = Arc::clone(engine);
            tasks.spawn(async move {
                let result = engine.dispatch(&consensus).await;
                ChainDispatchOutcome { chain_id, result }
            });
        }

        let mut outcomes = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => error!(error = %e, "Dispatch task panicked"),
            }
        }
        outcomes
    }
}
