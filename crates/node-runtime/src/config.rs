//! # Node Configuration
//!
//! Unified configuration for the oracle validator node, loaded from a JSON
//! file. Chains are plain config entries; adding a chain to a deployment
//! means adding an entry here, not writing code.

use ov_02_dispatch::domain::ChainPolicy;
use serde::{Deserialize, Serialize};
use shared_types::ChainId;
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {reason}")]
    Io { path: String, reason: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Complete node configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Node identity and round parameters.
    pub node: NodeSettings,
    /// Consensus resolution parameters.
    pub consensus: ConsensusSettings,
    /// Scheduler intervals and lock TTLs.
    pub scheduler: SchedulerSettings,
    /// Cache TTLs.
    pub cache: CacheSettings,
    /// The chains this node serves.
    pub chains: Vec<ChainConfig>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            node: NodeSettings::default(),
            consensus: ConsensusSettings::default(),
            scheduler: SchedulerSettings::default(),
            cache: CacheSettings::default(),
            chains: Vec::new(),
        }
    }
}

impl NodeConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let payload = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let config: Self =
            serde_json::from_str(&payload).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the path in `ORACLE_NODE_CONFIG`, or defaults when unset.
    pub fn load() -> Result<Self, ConfigError> {
        match std::env::var("ORACLE_NODE_CONFIG") {
            Ok(path) => Self::from_file(path),
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.node.round_length_secs == 0 {
            return Err(ConfigError::Invalid(
                "node.round_length_secs must be positive".to_string(),
            ));
        }
        if self.scheduler.round_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "scheduler.round_interval_secs must be positive".to_string(),
            ));
        }
        for chain in &self.chains {
            if chain.policy.gas_limit_multiplier < 1.0 {
                return Err(ConfigError::Invalid(format!(
                    "chain '{}': gas_limit_multiplier below 1.0",
                    chain.id
                )));
            }
        }
        Ok(())
    }

    /// Chains marked active.
    pub fn active_chains(&self) -> impl Iterator<Item = &ChainConfig> {
        self.chains.iter().filter(|c| c.active)
    }
}

/// Node identity and round parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeSettings {
    /// Protocol version this node speaks. Peers on a different major
    /// version are ignored during resolution.
    pub version: String,
    /// Length of one consensus round in seconds.
    pub round_length_secs: u64,
    /// Chain whose registry is the source of the fleet-wide validator list
    /// used for leader selection.
    pub registry_chain: ChainId,
    /// Which leader-selection algorithm the fleet runs.
    pub leader_selector: LeaderSelectorKind,
}

impl Default for NodeSettings {
    fn default() -> Self {
        Self {
            version: "1.0.0".to_string(),
            round_length_secs: 30,
            registry_chain: ChainId::devnet(),
            leader_selector: LeaderSelectorKind::V2,
        }
    }
}

/// Leader-selection algorithm. Every node in a fleet must run the same one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaderSelectorKind {
    /// Round-index modulo over the list as configured.
    V1,
    /// Hash of the round index over the sorted, deduplicated list.
    V2,
}

/// Consensus resolution parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusSettings {
    pub strategy: ConsensusStrategy,
    /// A decliner reporting more discrepancies than this is treated as
    /// broken and ignored rather than recorded.
    pub discrepancy_cutoff: usize,
    /// Power floor an agreeing subset must clear (optimized strategy).
    pub minimum_required_power: u128,
}

impl Default for ConsensusSettings {
    fn default() -> Self {
        Self {
            strategy: ConsensusStrategy::Optimized,
            discrepancy_cutoff: 5,
            minimum_required_power: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsensusStrategy {
    Simple,
    Optimized,
}

/// Scheduler intervals and lock TTLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSettings {
    /// How often the round job ticks.
    pub round_interval_secs: u64,
    /// How often thresholds and validator sets are refreshed.
    pub metrics_interval_secs: u64,
    /// Distributed lock TTL for scheduler jobs.
    pub lock_ttl_secs: u64,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            round_interval_secs: 30,
            metrics_interval_secs: 60,
            lock_ttl_secs: 90,
        }
    }
}

/// Cache TTLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// How long a cached validator set stays usable as a registry fallback.
    pub validator_set_ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            validator_set_ttl_secs: 600,
        }
    }
}

/// One chain this node serves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    pub id: ChainId,
    /// Inactive chains keep their configuration but receive no dispatches.
    #[serde(default = "default_active")]
    pub active: bool,
    /// Sender account on this chain.
    pub sender: shared_types::Address,
    #[serde(default)]
    pub policy: ChainPolicy,
}

fn default_active() -> bool {
    true
}
