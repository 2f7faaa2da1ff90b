//! Signature-threshold types.

use serde::{Deserialize, Serialize};
use shared_types::ChainId;
use std::fmt;

/// Which contract layer a threshold applies to.
///
/// The authorized validator set and the required signature count can differ
/// between a chain's layer-2 contract and its on-chain feed contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsensusLayer {
    Layer2,
    OnChain,
}

impl fmt::Display for ConsensusLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Layer2 => f.write_str("layer2"),
            Self::OnChain => f.write_str("on_chain"),
        }
    }
}

/// Cached signature thresholds for one chain.
///
/// `None` for a layer means that layer has never been read successfully
/// (cold start); a refresh failure keeps the previous value rather than
/// writing `None` back.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredSignatures {
    pub layer2: Option<u32>,
    pub on_chain: Option<u32>,
}

impl RequiredSignatures {
    pub fn for_layer(&self, layer: ConsensusLayer) -> Option<u32> {
        match layer {
            ConsensusLayer::Layer2 => self.layer2,
            ConsensusLayer::OnChain => self.on_chain,
        }
    }

    pub fn set_layer(&mut self, layer: ConsensusLayer, value: u32) {
        match layer {
            ConsensusLayer::Layer2 => self.layer2 = Some(value),
            ConsensusLayer::OnChain => self.on_chain = Some(value),
        }
    }
}

/// Cache key for one chain's thresholds.
pub fn cache_key(chain_id: &ChainId) -> String {
    format!("required_signatures::{chain_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_layer() {
        let thresholds = RequiredSignatures {
            layer2: Some(3),
            on_chain: Some(5),
        };
        assert_eq!(thresholds.for_layer(ConsensusLayer::Layer2), Some(3));
        assert_eq!(thresholds.for_layer(ConsensusLayer::OnChain), Some(5));
    }

    #[test]
    fn test_set_layer_preserves_other() {
        let mut thresholds = RequiredSignatures {
            layer2: Some(3),
            on_chain: None,
        };
        thresholds.set_layer(ConsensusLayer::OnChain, 5);
        assert_eq!(thresholds.layer2, Some(3));
        assert_eq!(thresholds.on_chain, Some(5));
    }

    #[test]
    fn test_cache_key_normalized() {
        let chain = ChainId::new("Ethereum").unwrap();
        assert_eq!(cache_key(&chain), "required_signatures::ethereum");
    }
}
