//! The consensus round job.
//!
//! One tick is one round: check leadership, assemble a proposal, collect
//! fleet responses, resolve per chain, then hand every payload that clears
//! its chain's threshold to the dispatch coordinator. Non-leaders do
//! nothing; their signing happens inside the leader's response collection.

use crate::adapters::InMemoryCache;
use crate::config::ConsensusStrategy;
use async_trait::async_trait;
use ov_01_consensus::domain::VersionChecker;
use ov_01_consensus::{
    ConsensusConstraints, ConsensusLayer, ConsensusResult, LeaderSelector, OptimizedResolver,
    ProposalSource, RequiredSignaturesResolver, ResponseSource, Signer, SimpleResolver,
    ValidatorSetFilter,
};
use ov_02_dispatch::DispatchCoordinator;
use ov_03_scheduler::PeriodicJob;
use shared_types::{ChainId, DeviationConsensus, RoundProposal, ValidatorResponse};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// Round parameters lifted from node configuration.
pub struct RoundSettings {
    pub registry_chain: ChainId,
    pub round_length_secs: u64,
    pub strategy: ConsensusStrategy,
    pub discrepancy_cutoff: usize,
    pub minimum_required_power: u128,
    pub version: String,
    pub chains: Vec<ChainId>,
    pub interval: Duration,
    pub lock_ttl: Duration,
}

pub struct RoundJob {
    settings: RoundSettings,
    version_checker: VersionChecker,
    selector: Box<dyn LeaderSelector>,
    signer: Arc<dyn Signer>,
    validator_sets: Arc<ValidatorSetFilter<InMemoryCache>>,
    thresholds: Arc<RequiredSignaturesResolver<InMemoryCache>>,
    proposal_source: Arc<dyn ProposalSource>,
    response_source: Arc<dyn ResponseSource>,
    coordinator: Arc<DispatchCoordinator>,
}

impl RoundJob {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        settings: RoundSettings,
        selector: Box<dyn LeaderSelector>,
        signer: Arc<dyn Signer>,
        validator_sets: Arc<ValidatorSetFilter<InMemoryCache>>,
        thresholds: Arc<RequiredSignaturesResolver<InMemoryCache>>,
        proposal_source: Arc<dyn ProposalSource>,
        response_source: Arc<dyn ResponseSource>,
        coordinator: Arc<DispatchCoordinator>,
    ) -> Self {
        let version_checker = VersionChecker::new(&settings.version);
        Self {
            settings,
            version_checker,
            selector,
            signer,
            validator_sets,
            thresholds,
            proposal_source,
            response_source,
            coordinator,
        }
    }

    fn unix_now() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }

    /// Round timestamp: wall time aligned down to the round boundary, so
    /// every node computes the same leader for the same round.
    fn round_timestamp(&self) -> u64 {
        let now = Self::unix_now();
        now - (now % self.settings.round_length_secs)
    }

    fn resolve(
        &self,
        responses: &[ValidatorResponse],
        required_signatures: u32,
    ) -> ConsensusResult {
        match self.settings.strategy {
            ConsensusStrategy::Simple => SimpleResolver::new(self.settings.discrepancy_cutoff)
                .resolve(responses, &self.version_checker),
            ConsensusStrategy::Optimized => OptimizedResolver::new().resolve(
                responses,
                &self.version_checker,
                &ConsensusConstraints {
                    minimum_required_signatures: required_signatures as usize,
                    minimum_required_power: self.settings.minimum_required_power,
                },
            ),
        }
    }

    async fn payload_for_chain(
        &self,
        chain_id: &ChainId,
        proposal: &RoundProposal,
        responses: &[ValidatorResponse],
        data_timestamp: u64,
    ) -> Option<DeviationConsensus> {
        let required = match self.thresholds.get(ConsensusLayer::Layer2, chain_id).await {
            Ok(Some(required)) => required,
            Ok(None) => {
                warn!(chain_id = %chain_id, "No cached threshold yet, skipping chain this round");
                return None;
            }
            Err(e) => {
                warn!(chain_id = %chain_id, error = %e, "Threshold read failed, skipping chain this round");
                return None;
            }
        };

        // The on-chain feed contract enforces its own signature count at
        // update time; dispatching below it would revert, so the gate takes
        // the stricter of the two layers.
        let required = match self.thresholds.get(ConsensusLayer::OnChain, chain_id).await {
            Ok(Some(on_chain)) => required.max(on_chain),
            Ok(None) => required,
            Err(e) => {
                debug!(chain_id = %chain_id, error = %e, "On-chain threshold unavailable, gating on layer-2 only");
                required
            }
        };

        let authorized = match self.validator_sets.authorized_set(chain_id).await {
            Ok(authorized) => authorized,
            Err(e) => {
                warn!(chain_id = %chain_id, error = %e, "No validator set available, skipping chain this round");
                return None;
            }
        };

        // De-registered validators must not shape the outcome: their power
        // and discrepancies are dropped before resolution, not just their
        // signatures afterwards.
        let eligible: Vec<ValidatorResponse> = responses
            .iter()
            .filter(|r| authorized.contains(&r.validator))
            .cloned()
            .collect();

        let result = self.resolve(&eligible, required);
        let signatures = ValidatorSetFilter::<InMemoryCache>::apply(&result.signatures, &authorized);
        if signatures.len() < required as usize {
            debug!(
                chain_id = %chain_id,
                signatures = signatures.len(),
                required,
                "Below signature threshold, nothing to dispatch"
            );
            return None;
        }

        let trimmed = proposal.without_keys(result.discrepant_keys.iter());
        if trimmed.keys.is_empty() {
            debug!(chain_id = %chain_id, "All keys discrepant, nothing to dispatch");
            return None;
        }

        Some(DeviationConsensus {
            chain_id: chain_id.clone(),
            data_timestamp,
            keys: trimmed.keys,
            price_data: trimmed.price_data,
            signatures,
            created_at: Self::unix_now(),
        })
    }

    async fn run_round(&self) -> Result<(), String> {
        let data_timestamp = self.round_timestamp();

        let validators = self
            .validator_sets
            .validators(&self.settings.registry_chain)
            .await
            .map_err(|e| e.to_string())?;
        let addresses: Vec<_> = validators.iter().map(|v| v.id.clone()).collect();

        let leading = self
            .selector
            .is_leader(
                data_timestamp,
                &addresses,
                self.settings.round_length_secs,
                &self.signer.address(),
            )
            .map_err(|e| e.to_string())?;
        if !leading {
            debug!(data_timestamp, "Not the leader for this round");
            return Ok(());
        }

        let proposal = self.proposal_source.propose(data_timestamp).await?;
        if proposal.keys.is_empty() {
            debug!(data_timestamp, "Empty proposal, nothing to do");
            return Ok(());
        }

        let responses = self.response_source.collect(&proposal, data_timestamp).await?;
        info!(
            data_timestamp,
            keys = proposal.keys.len(),
            responses = responses.len(),
            "Leading round"
        );

        let mut payloads = HashMap::new();
        for chain_id in &self.settings.chains {
            if let Some(payload) = self
                .payload_for_chain(chain_id, &proposal, &responses, data_timestamp)
                .await
            {
                payloads.insert(chain_id.clone(), payload);
            }
        }
        if payloads.is_empty() {
            debug!(data_timestamp, "No chain cleared its threshold this round");
            return Ok(());
        }

        let outcomes = self.coordinator.dispatch_round(payloads).await;
        let confirmed = outcomes.iter().filter(|o| o.result.is_ok()).count();
        info!(
            data_timestamp,
            confirmed,
            failed = outcomes.len() - confirmed,
            "Round dispatch complete"
        );
        Ok(())
    }
}

#[async_trait]
impl PeriodicJob for RoundJob {
    fn name(&self) -> &str {
        "consensus-round"
    }

    fn interval(&self) -> Duration {
        self.settings.interval
    }

    fn lock_ttl(&self) -> Duration {
        self.settings.lock_ttl
    }

    async fn run(&self) -> Result<(), String> {
        self.run_round().await
    }
}
