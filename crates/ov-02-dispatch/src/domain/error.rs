//! Error types for the dispatch subsystem.

use super::job::DispatchState;
use shared_types::ChainId;

/// Dispatch error types.
///
/// Every variant is terminal for one chain in one round; the next round's
/// dispatch attempt is independent.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Invalid dispatch transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: DispatchState,
        to: DispatchState,
    },

    #[error("Gas resolution failed on {chain_id}: {reason}")]
    GasResolution { chain_id: ChainId, reason: String },

    #[error("Nonce fetch failed on {chain_id}: {reason}")]
    NonceFetch { chain_id: ChainId, reason: String },

    #[error("Transaction build failed on {chain_id}: {reason}")]
    BuildFailed { chain_id: ChainId, reason: String },

    #[error("Submission failed on {chain_id}: {reason}")]
    SubmissionFailed { chain_id: ChainId, reason: String },

    #[error("Transaction {hash} not confirmed on {chain_id} within {timeout_secs}s")]
    ConfirmationTimeout {
        chain_id: ChainId,
        hash: String,
        timeout_secs: u64,
    },

    #[error("Transaction {hash} reverted on {chain_id}")]
    Reverted { chain_id: ChainId, hash: String },

    #[error("Payload for {chain_id} is stale: {age_secs}s old, limit {limit_secs}s")]
    StalePayload {
        chain_id: ChainId,
        age_secs: u64,
        limit_secs: u64,
    },
}

/// Result type for dispatch operations.
pub type DispatchResult<T> = Result<T, DispatchError>;
