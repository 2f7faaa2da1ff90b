//! Consensus resolution strategies.
//!
//! Two strategies coexist. The simple strategy counts every signed,
//! version-compatible response and only uses discrepancies to decide which
//! dissenting validators are reliable enough to listen to. The optimized
//! strategy weighs participants by power and asks the
//! [`ConsensusOptimizer`] which disputed keys the round has to give up.
//!
//! Neither strategy enforces the chain's threshold itself: the caller
//! compares the result against the thresholds from
//! `RequiredSignaturesResolver` and only then builds a payload for dispatch.

use super::optimizer::ConsensusOptimizer;
use super::participant::{ConsensusConstraints, ConsensusParticipant};
use super::version::VersionChecker;
use shared_types::{Address, ResponseOutcome, SignatureWithSigner, ValidatorResponse};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// The agreement produced by one resolution call.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct ConsensusResult {
    pub signatures: Vec<SignatureWithSigner>,
    pub discrepant_keys: BTreeSet<String>,
    pub total_power: u128,
}

impl ConsensusResult {
    /// Whether this result clears a simple signature-count threshold.
    pub fn meets_signature_threshold(&self, required: u32) -> bool {
        self.signatures.len() >= required as usize
    }

    /// Whether this result clears a power-weighted threshold.
    pub fn meets_power_threshold(&self, required: u128) -> bool {
        self.total_power >= required
    }
}

/// Count-based resolution.
///
/// Validators reporting more than `discrepancy_cutoff` disagreements are
/// considered unreliable and ignored entirely.
#[derive(Clone, Copy, Debug)]
pub struct SimpleResolver {
    pub discrepancy_cutoff: usize,
}

impl SimpleResolver {
    pub fn new(discrepancy_cutoff: usize) -> Self {
        Self { discrepancy_cutoff }
    }

    pub fn resolve(
        &self,
        responses: &[ValidatorResponse],
        version_checker: &VersionChecker,
    ) -> ConsensusResult {
        let mut result = ConsensusResult::default();

        for response in responses {
            if !version_checker.is_compatible(&response.version) {
                continue;
            }
            match &response.outcome {
                ResponseOutcome::Signed { signature } => {
                    result.signatures.push(SignatureWithSigner {
                        signer: response.validator.clone(),
                        signature: signature.clone(),
                    });
                    result.total_power += response.power;
                }
                ResponseOutcome::Declined { discrepancies } => {
                    if discrepancies.len() > self.discrepancy_cutoff {
                        debug!(
                            validator = %response.validator,
                            discrepancies = discrepancies.len(),
                            cutoff = self.discrepancy_cutoff,
                            "Ignoring over-discrepant validator"
                        );
                        continue;
                    }
                    result
                        .discrepant_keys
                        .extend(discrepancies.iter().map(|d| d.key.clone()));
                }
                ResponseOutcome::Errored { reason } => {
                    debug!(
                        validator = %response.validator,
                        reason = %reason,
                        "Skipping errored response"
                    );
                }
            }
        }

        result
    }
}

/// Power-weighted resolution via the [`ConsensusOptimizer`].
#[derive(Clone, Copy, Debug, Default)]
pub struct OptimizedResolver {
    optimizer: ConsensusOptimizer,
}

impl OptimizedResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(
        &self,
        responses: &[ValidatorResponse],
        version_checker: &VersionChecker,
        constraints: &ConsensusConstraints,
    ) -> ConsensusResult {
        let mut participants = Vec::new();
        let mut signatures_by_signer: HashMap<Address, SignatureWithSigner> = HashMap::new();

        for response in responses {
            if !version_checker.is_compatible(&response.version) {
                continue;
            }
            match &response.outcome {
                ResponseOutcome::Signed { signature } => {
                    signatures_by_signer.insert(
                        response.validator.clone(),
                        SignatureWithSigner {
                            signer: response.validator.clone(),
                            signature: signature.clone(),
                        },
                    );
                    participants.push(ConsensusParticipant::new(
                        response.validator.clone(),
                        response.power,
                    ));
                }
                ResponseOutcome::Declined { discrepancies } => {
                    participants.push(ConsensusParticipant::with_discrepancies(
                        response.validator.clone(),
                        response.power,
                        discrepancies.iter().map(|d| d.key.clone()),
                    ));
                }
                ResponseOutcome::Errored { reason } => {
                    debug!(
                        validator = %response.validator,
                        reason = %reason,
                        "Skipping errored response"
                    );
                }
            }
        }

        let solution = self.optimizer.find(&participants, constraints);
        if !solution.dropped_keys.is_empty() {
            debug!(
                dropped = ?solution.dropped_keys,
                solved = solution.solved,
                "Optimizer excluded disputed keys from the round"
            );
        }

        // Only participants that actually signed contribute signatures and
        // power this round; dissenters on dropped keys sign once the round
        // retries without those keys.
        let mut result = ConsensusResult {
            discrepant_keys: solution.dropped_keys,
            ..ConsensusResult::default()
        };
        for response in responses {
            if let Some(signature) = signatures_by_signer.get(&response.validator) {
                if solution.included.contains(&response.validator) {
                    result.signatures.push(signature.clone());
                    result.total_power += response.power;
                }
            }
        }

        result
    }
}
