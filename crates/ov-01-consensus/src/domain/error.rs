//! Error types for the consensus subsystem.

use shared_types::ChainId;

/// Consensus error types.
#[derive(Debug, thiserror::Error)]
pub enum ConsensusError {
    #[error("Cannot select a leader from an empty validator list")]
    EmptyValidatorList,

    #[error("Round length must be non-zero")]
    InvalidRoundLength,

    #[error("Validator registry error for chain {chain_id}: {reason}")]
    RegistryError { chain_id: ChainId, reason: String },

    #[error("Threshold read error for chain {chain_id}: {reason}")]
    ThresholdReadError { chain_id: ChainId, reason: String },

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Signer error: {0}")]
    SignerError(String),

    #[error("Proposal source error: {0}")]
    ProposalError(String),

    #[error("Response collection error: {0}")]
    ResponseError(String),
}

/// Result type for consensus operations.
pub type ConsensusResultT<T> = Result<T, ConsensusError>;
