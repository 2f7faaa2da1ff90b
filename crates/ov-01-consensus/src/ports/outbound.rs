//! Driven ports (outbound dependencies).
//!
//! Each trait has chain-specific concrete implementations that live with the
//! deployment, not in this crate. Errors are adapter-specific strings mapped
//! into [`crate::domain::ConsensusError`] by the consuming service.

use async_trait::async_trait;
use shared_types::{Address, ChainId, RoundProposal, Signature, Validator, ValidatorResponse};

/// On-chain validator registry.
#[async_trait]
pub trait ValidatorRegistry: Send + Sync {
    /// Validators currently authorized to sign for a chain.
    ///
    /// The set can differ between chains; callers must not assume one
    /// chain's answer holds for another.
    async fn list(&self, chain_id: &ChainId) -> Result<Vec<Validator>, String>;
}

/// A contract exposing the current signature threshold.
///
/// One handle per (chain, layer); the layer-2 contract and the on-chain feed
/// contract are separate handles over the same trait.
#[async_trait]
pub trait ThresholdContract: Send + Sync {
    async fn required_signatures(&self) -> Result<u32, String>;
}

/// Opaque signing capability for this node's identity.
///
/// EVM and non-EVM signer implementations differ in signature encoding but
/// expose the same two operations.
#[async_trait]
pub trait Signer: Send + Sync {
    async fn sign(&self, digest: &[u8; 32]) -> Result<Signature, String>;

    fn address(&self) -> Address;
}

/// Produces the data a leader proposes for a round.
///
/// Price fetching itself is outside this subsystem; this port hands over an
/// already-assembled proposal.
#[async_trait]
pub trait ProposalSource: Send + Sync {
    async fn propose(&self, data_timestamp: u64) -> Result<RoundProposal, String>;
}

/// Collects signed responses from the validator fleet for a proposal.
#[async_trait]
pub trait ResponseSource: Send + Sync {
    async fn collect(
        &self,
        proposal: &RoundProposal,
        data_timestamp: u64,
    ) -> Result<Vec<ValidatorResponse>, String>;
}
