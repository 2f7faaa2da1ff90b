//! Required-signatures resolver.
//!
//! Maintains the authoritative signature threshold per chain and per layer.
//! All chains are refreshed in parallel; a read failure keeps the previous
//! cached value for that (chain, layer) pair, so a transient RPC failure
//! never zeroes out a previously known threshold. Writes are per chain,
//! best-effort, not atomic across chains.

use crate::domain::thresholds::{cache_key, ConsensusLayer, RequiredSignatures};
use crate::domain::ConsensusError;
use crate::ports::ThresholdContract;
use shared_types::{ChainId, KeyValueCache};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// The two threshold contracts of one chain.
#[derive(Clone)]
pub struct ThresholdContracts {
    pub layer2: Arc<dyn ThresholdContract>,
    pub on_chain: Arc<dyn ThresholdContract>,
}

/// Polls each chain's contracts for `requiredSignatures()` and caches the
/// result with last-known-good fallback.
pub struct RequiredSignaturesResolver<C: KeyValueCache> {
    cache: Arc<C>,
    contracts: HashMap<ChainId, ThresholdContracts>,
}

impl<C: KeyValueCache + 'static> RequiredSignaturesResolver<C> {
    pub fn new(cache: Arc<C>, contracts: HashMap<ChainId, ThresholdContracts>) -> Self {
        Self { cache, contracts }
    }

    /// Chains this resolver knows about.
    pub fn chains(&self) -> impl Iterator<Item = &ChainId> {
        self.contracts.keys()
    }

    /// Refresh every chain's thresholds in parallel.
    pub async fn refresh(&self) {
        let mut tasks = JoinSet::new();
        for (chain_id, contracts) in &self.contracts {
            let cache = Arc::clone(&self.cache);
            let chain_id = chain_id.clone();
            let contracts = contracts.clone();
            tasks.spawn(async move {
                Self::refresh_chain(cache, chain_id, contracts).await;
            });
        }
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "Threshold refresh task failed to join");
            }
        }
    }

    async fn refresh_chain(cache: Arc<C>, chain_id: ChainId, contracts: ThresholdContracts) {
        let key = cache_key(&chain_id);
        let mut thresholds = Self::read_cached(&cache, &key).await.unwrap_or_default();

        let (layer2, on_chain) = tokio::join!(
            contracts.layer2.required_signatures(),
            contracts.on_chain.required_signatures(),
        );
        for (layer, outcome) in [
            (ConsensusLayer::Layer2, layer2),
            (ConsensusLayer::OnChain, on_chain),
        ] {
            match outcome {
                Ok(value) => thresholds.set_layer(layer, value),
                Err(reason) => debug!(
                    chain_id = %chain_id,
                    layer = %layer,
                    reason = %reason,
                    "Keeping cached threshold after read failure"
                ),
            }
        }

        match serde_json::to_string(&thresholds) {
            Ok(payload) => {
                if let Err(reason) = cache.set(&key, payload, None).await {
                    warn!(chain_id = %chain_id, reason = %reason, "Failed to write threshold cache");
                }
            }
            Err(e) => warn!(chain_id = %chain_id, error = %e, "Failed to serialize thresholds"),
        }
    }

    async fn read_cached(cache: &C, key: &str) -> Option<RequiredSignatures> {
        let payload = cache.get(key).await.ok().flatten()?;
        serde_json::from_str(&payload).ok()
    }

    /// Current threshold for one chain and layer. `None` on cold start.
    pub async fn get(
        &self,
        layer: ConsensusLayer,
        chain_id: &ChainId,
    ) -> Result<Option<u32>, ConsensusError> {
        let payload = self
            .cache
            .get(&cache_key(chain_id))
            .await
            .map_err(ConsensusError::CacheError)?;
        let Some(payload) = payload else {
            return Ok(None);
        };
        let thresholds: RequiredSignatures =
            serde_json::from_str(&payload).map_err(|e| ConsensusError::CacheError(e.to_string()))?;
        Ok(thresholds.for_layer(layer))
    }

    /// Current thresholds for every known chain that has a cached value.
    pub async fn get_all(&self, layer: ConsensusLayer) -> HashMap<ChainId, u32> {
        let mut all = HashMap::new();
        for chain_id in self.contracts.keys() {
            if let Ok(Some(value)) = self.get(layer, chain_id).await {
                all.insert(chain_id.clone(), value);
            }
        }
        all
    }
}
