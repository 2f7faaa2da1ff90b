//! Core entities of the oracle round.

use crate::identity::{Address, ChainId};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// A registered validator.
///
/// Refreshed wholesale from the on-chain registry; never mutated in place.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    /// Validator identity (case-insensitive address).
    pub id: Address,
    /// Consensus weight.
    pub power: u128,
    /// Validator API location.
    pub location: String,
}

/// A single price observation for one feed key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceData {
    /// Feed key ("BTC-USD", ...).
    pub key: String,
    /// Fixed-point price value (8 decimals).
    pub value: u128,
    /// Observation timestamp (unix seconds).
    pub timestamp: u64,
    /// Feed heartbeat interval carried through from feed configuration.
    pub heartbeat: u64,
}

/// An opaque validator signature over a round proposal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signature(pub Vec<u8>);

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0))
    }
}

/// A signature paired with the validator that produced it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureWithSigner {
    pub signer: Address,
    pub signature: Signature,
}

/// A data key one validator disagreed on.
///
/// The observed/proposed values are carried for logging only; consensus
/// decisions look at the key alone.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discrepancy {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed: Option<u128>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proposed: Option<u128>,
}

impl Discrepancy {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            observed: None,
            proposed: None,
        }
    }
}

/// What one validator answered for one round.
///
/// Exactly one of three shapes; exhaustive matching replaces optional-field
/// null checks everywhere this is consumed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResponseOutcome {
    /// The validator agreed and signed the proposal.
    Signed { signature: Signature },
    /// The validator refused to sign, listing the keys it disagrees on.
    Declined { discrepancies: Vec<Discrepancy> },
    /// The validator failed to answer usefully (timeout, internal error).
    Errored { reason: String },
}

/// One validator's response to a round proposal.
///
/// Produced once per validator per round, immutable, discarded after
/// resolution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorResponse {
    pub validator: Address,
    pub power: u128,
    pub version: String,
    pub outcome: ResponseOutcome,
}

/// The data a round leader proposes to the fleet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundProposal {
    pub keys: Vec<String>,
    pub price_data: Vec<PriceData>,
}

impl RoundProposal {
    /// Digest signed by each validator: SHA-256 over the round timestamp and
    /// the canonical serialization of the proposal.
    pub fn signing_digest(&self, data_timestamp: u64) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(data_timestamp.to_be_bytes());
        for key in &self.keys {
            hasher.update(key.as_bytes());
        }
        for price in &self.price_data {
            hasher.update(price.key.as_bytes());
            hasher.update(price.value.to_be_bytes());
            hasher.update(price.timestamp.to_be_bytes());
        }
        hasher.finalize().into()
    }

    /// Proposal with the given keys (and their price data) removed.
    ///
    /// Used when a round retries after consensus reported discrepant keys.
    pub fn without_keys<'a, I>(&self, excluded: I) -> Self
    where
        I: IntoIterator<Item = &'a String>,
    {
        let excluded: std::collections::HashSet<&String> = excluded.into_iter().collect();
        Self {
            keys: self
                .keys
                .iter()
                .filter(|k| !excluded.contains(k))
                .cloned()
                .collect(),
            price_data: self
                .price_data
                .iter()
                .filter(|p| !excluded.contains(&p.key))
                .cloned()
                .collect(),
        }
    }
}

/// The agreed, signed payload for one chain in one round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviationConsensus {
    pub chain_id: ChainId,
    pub data_timestamp: u64,
    pub keys: Vec<String>,
    pub price_data: Vec<PriceData>,
    pub signatures: Vec<SignatureWithSigner>,
    pub created_at: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_proposal() -> RoundProposal {
        RoundProposal {
            keys: vec!["BTC-USD".to_string(), "ETH-USD".to_string()],
            price_data: vec![
                PriceData {
                    key: "BTC-USD".to_string(),
                    value: 64_000_00000000,
                    timestamp: 1_700_000_000,
                    heartbeat: 3600,
                },
                PriceData {
                    key: "ETH-USD".to_string(),
                    value: 3_100_00000000,
                    timestamp: 1_700_000_000,
                    heartbeat: 3600,
                },
            ],
        }
    }

    #[test]
    fn test_signing_digest_deterministic() {
        let proposal = create_test_proposal();
        assert_eq!(
            proposal.signing_digest(1_700_000_000),
            proposal.signing_digest(1_700_000_000)
        );
    }

    #[test]
    fn test_signing_digest_depends_on_timestamp() {
        let proposal = create_test_proposal();
        assert_ne!(
            proposal.signing_digest(1_700_000_000),
            proposal.signing_digest(1_700_000_030)
        );
    }

    #[test]
    fn test_without_keys_drops_prices_too() {
        let proposal = create_test_proposal();
        let excluded = vec!["BTC-USD".to_string()];
        let trimmed = proposal.without_keys(excluded.iter());
        assert_eq!(trimmed.keys, vec!["ETH-USD".to_string()]);
        assert_eq!(trimmed.price_data.len(), 1);
        assert_eq!(trimmed.price_data[0].key, "ETH-USD");
    }

    #[test]
    fn test_response_outcome_serde_tagged() {
        let outcome = ResponseOutcome::Errored {
            reason: "timeout".to_string(),
        };
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains("\"kind\":\"errored\""));
    }

    #[test]
    fn test_signature_display_hex() {
        let sig = Signature(vec![0xde, 0xad]);
        assert_eq!(sig.to_string(), "0xdead");
    }
}
