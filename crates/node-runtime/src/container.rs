//! Subsystem wiring.
//!
//! Builds the full object graph from configuration plus the per-chain port
//! implementations supplied by the deployment, and registers the periodic
//! jobs with the scheduler. Active chains with no ports configured are
//! skipped with a warning rather than failing startup.

use crate::adapters::devnet::{
    DevnetChainAdapter, DevnetFeedsContract, DevnetPriceSource, DevnetRegistry,
    DevnetResponseSource, DevnetSigner,
};
use crate::adapters::InMemoryCache;
use crate::config::{LeaderSelectorKind, NodeConfig};
use crate::jobs::{RefreshJob, RoundJob, RoundSettings};
use anyhow::{Context, Result};
use ov_01_consensus::{
    LeaderSelector, LeaderSelectorV1, LeaderSelectorV2, ProposalSource, RequiredSignaturesResolver,
    ResponseSource, Signer, ThresholdContract, ThresholdContracts, ValidatorRegistry,
    ValidatorSetFilter,
};
use ov_02_dispatch::ports::{ChainAdapter, FeedsContract};
use ov_02_dispatch::{DispatchCoordinator, DispatchEngine};
use ov_03_scheduler::JobScheduler;
use shared_types::{Address, ChainId, Validator};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// The port implementations of one chain.
pub struct ChainPorts {
    pub adapter: Arc<dyn ChainAdapter>,
    pub feeds: Arc<dyn FeedsContract>,
    pub layer2_threshold: Arc<dyn ThresholdContract>,
    pub on_chain_threshold: Arc<dyn ThresholdContract>,
}

/// External collaborators that are not chain-specific.
pub struct NodePorts {
    pub registry: Arc<dyn ValidatorRegistry>,
    pub signer: Arc<dyn Signer>,
    pub proposal_source: Arc<dyn ProposalSource>,
    pub response_source: Arc<dyn ResponseSource>,
}

/// The wired node, ready to run.
pub struct NodeContainer {
    scheduler: JobScheduler<InMemoryCache>,
}

impl NodeContainer {
    /// Wire the node from configuration and port implementations.
    pub fn build(
        config: &NodeConfig,
        node_ports: NodePorts,
        chain_ports: HashMap<ChainId, ChainPorts>,
    ) -> Result<Self> {
        config.validate().context("Invalid node configuration")?;

        let cache = Arc::new(InMemoryCache::new());
        let validator_sets = Arc::new(ValidatorSetFilter::new(
            node_ports.registry,
            Arc::clone(&cache),
            Duration::from_secs(config.cache.validator_set_ttl_secs),
        ));

        let mut contracts = HashMap::new();
        let mut engines = Vec::new();
        let mut active = Vec::new();
        for chain in config.active_chains() {
            let Some(ports) = chain_ports.get(&chain.id) else {
                warn!(chain_id = %chain.id, "Active chain has no ports configured, skipping");
                continue;
            };
            contracts.insert(
                chain.id.clone(),
                ThresholdContracts {
                    layer2: Arc::clone(&ports.layer2_threshold),
                    on_chain: Arc::clone(&ports.on_chain_threshold),
                },
            );
            engines.push(Arc::new(DispatchEngine::new(
                chain.id.clone(),
                chain.policy,
                chain.sender.clone(),
                Arc::clone(&ports.adapter),
                Arc::clone(&ports.feeds),
            )));
            active.push(chain.id.clone());
        }
        info!(chains = active.len(), "Wired dispatch engines");

        let thresholds = Arc::new(RequiredSignaturesResolver::new(
            Arc::clone(&cache),
            contracts,
        ));
        let coordinator = Arc::new(DispatchCoordinator::new(engines));

        let selector: Box<dyn LeaderSelector> = match config.node.leader_selector {
            LeaderSelectorKind::V1 => Box::new(LeaderSelectorV1),
            LeaderSelectorKind::V2 => Box::new(LeaderSelectorV2),
        };

        let lock_ttl = Duration::from_secs(config.scheduler.lock_ttl_secs);
        let round_job = RoundJob::new(
            RoundSettings {
                registry_chain: config.node.registry_chain.clone(),
                round_length_secs: config.node.round_length_secs,
                strategy: config.consensus.strategy,
                discrepancy_cutoff: config.consensus.discrepancy_cutoff,
                minimum_required_power: config.consensus.minimum_required_power,
                version: config.node.version.clone(),
                chains: active.clone(),
                interval: Duration::from_secs(config.scheduler.round_interval_secs),
                lock_ttl,
            },
            selector,
            node_ports.signer,
            Arc::clone(&validator_sets),
            Arc::clone(&thresholds),
            node_ports.proposal_source,
            node_ports.response_source,
            coordinator,
        );
        let refresh_job = RefreshJob::new(
            thresholds,
            validator_sets,
            active,
            Duration::from_secs(config.scheduler.metrics_interval_secs),
            lock_ttl,
        );

        let mut scheduler = JobScheduler::new(cache);
        scheduler.register(Arc::new(refresh_job));
        scheduler.register(Arc::new(round_job));

        Ok(Self { scheduler })
    }

    /// Spawn the job loops.
    pub fn start(&self) -> Vec<JoinHandle<()>> {
        self.scheduler.spawn()
    }
}

/// Wire a fully simulated single-node deployment.
///
/// Every configured chain gets devnet ports; the fleet is this node alone.
pub fn build_devnet(config: &NodeConfig) -> Result<NodeContainer> {
    let address = Address::new("0xdevnode").context("devnet address")?;
    let signer = DevnetSigner::new(address.clone());
    let registry = DevnetRegistry::new(vec![Validator {
        id: address,
        power: 100,
        location: "http://localhost".to_string(),
    }]);

    let mut chain_ports = HashMap::new();
    for chain in config.active_chains() {
        let feeds = DevnetFeedsContract::new(1);
        chain_ports.insert(
            chain.id.clone(),
            ChainPorts {
                adapter: DevnetChainAdapter::new(chain.id.clone()),
                feeds: feeds.clone(),
                layer2_threshold: feeds.clone(),
                on_chain_threshold: feeds,
            },
        );
    }

    let node_ports = NodePorts {
        registry,
        signer: signer.clone(),
        proposal_source: DevnetPriceSource::new(vec![
            "BTC-USD".to_string(),
            "ETH-USD".to_string(),
        ]),
        response_source: DevnetResponseSource::new(signer, 100, config.node.version.clone()),
    };

    NodeContainer::build(config, node_ports, chain_ports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChainConfig;
    use ov_02_dispatch::domain::ChainPolicy;

    fn devnet_config() -> NodeConfig {
        let mut config = NodeConfig::default();
        config.chains = vec![ChainConfig {
            id: ChainId::new("devnet").unwrap(),
            active: true,
            sender: Address::new("0xdevnode").unwrap(),
            policy: ChainPolicy::default(),
        }];
        config
    }

    #[tokio::test]
    async fn test_devnet_container_builds_and_starts() {
        let container = build_devnet(&devnet_config()).unwrap();
        let handles = container.start();
        assert_eq!(handles.len(), 2);
        for handle in handles {
            handle.abort();
        }
    }

    #[tokio::test]
    async fn test_chain_without_ports_is_skipped() {
        let mut config = devnet_config();
        config.chains.push(ChainConfig {
            id: ChainId::new("no-ports").unwrap(),
            active: true,
            sender: Address::new("0xdevnode").unwrap(),
            policy: ChainPolicy::default(),
        });

        // Devnet wiring covers every configured chain, so drop one by hand.
        let address = Address::new("0xdevnode").unwrap();
        let signer = DevnetSigner::new(address.clone());
        let registry = DevnetRegistry::new(vec![Validator {
            id: address,
            power: 100,
            location: "http://localhost".to_string(),
        }]);
        let feeds = DevnetFeedsContract::new(1);
        let chain_ports = HashMap::from([(
            ChainId::new("devnet").unwrap(),
            ChainPorts {
                adapter: DevnetChainAdapter::new(ChainId::new("devnet").unwrap()),
                feeds: feeds.clone(),
                layer2_threshold: feeds.clone(),
                on_chain_threshold: feeds,
            },
        )]);
        let node_ports = NodePorts {
            registry,
            signer: signer.clone(),
            proposal_source: DevnetPriceSource::new(vec!["BTC-USD".to_string()]),
            response_source: DevnetResponseSource::new(signer, 100, "1.0.0".to_string()),
        };

        let container = NodeContainer::build(&config, node_ports, chain_ports).unwrap();
        let handles = container.start();
        for handle in handles {
            handle.abort();
        }
    }
}
