//! Deterministic round leadership.
//!
//! The leader for a round is a pure function of the round timestamp and the
//! validator list: every honest node computes the same answer with no
//! coordinator and no election traffic. The selection policy is swappable
//! (v1 vs v2) so the protocol can evolve without breaking old rounds.

use super::error::ConsensusError;
use sha2::{Digest, Sha256};
use shared_types::Address;

/// Round leader selection policy.
pub trait LeaderSelector: Send + Sync {
    /// Pick the leader for the round identified by `data_timestamp`.
    ///
    /// Pure computation; fails only on degenerate inputs.
    fn leader_for(
        &self,
        data_timestamp: u64,
        validators: &[Address],
        round_length_secs: u64,
    ) -> Result<Address, ConsensusError>;

    /// Whether `own` is the leader for this round.
    ///
    /// Address comparison is case-insensitive by construction.
    fn is_leader(
        &self,
        data_timestamp: u64,
        validators: &[Address],
        round_length_secs: u64,
        own: &Address,
    ) -> Result<bool, ConsensusError> {
        Ok(&self.leader_for(data_timestamp, validators, round_length_secs)? == own)
    }
}

fn round_index(
    data_timestamp: u64,
    round_length_secs: u64,
) -> Result<u64, ConsensusError> {
    if round_length_secs == 0 {
        return Err(ConsensusError::InvalidRoundLength);
    }
    Ok(data_timestamp / round_length_secs)
}

/// Legacy policy: round index modulo list length, list order as given.
///
/// Sensitive to the caller's ordering; kept for rounds produced under the
/// original protocol.
#[derive(Clone, Copy, Debug, Default)]
pub struct LeaderSelectorV1;

impl LeaderSelector for LeaderSelectorV1 {
    fn leader_for(
        &self,
        data_timestamp: u64,
        validators: &[Address],
        round_length_secs: u64,
    ) -> Result<Address, ConsensusError> {
        if validators.is_empty() {
            return Err(ConsensusError::EmptyValidatorList);
        }
        let index = round_index(data_timestamp, round_length_secs)? as usize % validators.len();
        Ok(validators[index].clone())
    }
}

/// Current policy: SHA-256 of the round index over a sorted copy of the
/// list, so the result is independent of the caller's ordering.
#[derive(Clone, Copy, Debug, Default)]
pub struct LeaderSelectorV2;

impl LeaderSelector for LeaderSelectorV2 {
    fn leader_for(
        &self,
        data_timestamp: u64,
        validators: &[Address],
        round_length_secs: u64,
    ) -> Result<Address, ConsensusError> {
        if validators.is_empty() {
            return Err(ConsensusError::EmptyValidatorList);
        }
        let round = round_index(data_timestamp, round_length_secs)?;

        let mut ordered: Vec<&Address> = validators.iter().collect();
        ordered.sort();
        ordered.dedup();

        let digest = Sha256::digest(round.to_be_bytes());
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest[..8]);
        let index = u64::from_be_bytes(prefix) as usize % ordered.len();
        Ok(ordered[index].clone())
    }
}
