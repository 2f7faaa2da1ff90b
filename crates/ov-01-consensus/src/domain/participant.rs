//! Consensus participants and resolution constraints.

use shared_types::Address;
use std::collections::BTreeSet;

/// A transient view of one validator's response inside a single resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsensusParticipant {
    pub address: Address,
    pub power: u128,
    /// Keys this participant disagrees on. Empty means it signed.
    pub discrepancy_keys: BTreeSet<String>,
}

impl ConsensusParticipant {
    pub fn new(address: Address, power: u128) -> Self {
        Self {
            address,
            power,
            discrepancy_keys: BTreeSet::new(),
        }
    }

    pub fn with_discrepancies<I, S>(address: Address, power: u128, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            address,
            power,
            discrepancy_keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether this participant agrees once `dropped` keys are off the table.
    pub fn agrees_given(&self, dropped: &BTreeSet<String>) -> bool {
        self.discrepancy_keys.is_subset(dropped)
    }
}

/// Minimums a resolved participant subset must satisfy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConsensusConstraints {
    pub minimum_required_signatures: usize,
    pub minimum_required_power: u128,
}

impl ConsensusConstraints {
    pub fn satisfied_by(&self, signatures: usize, power: u128) -> bool {
        signatures >= self.minimum_required_signatures && power >= self.minimum_required_power
    }
}
