//! Driven ports (outbound dependencies).
//!
//! One concrete adapter pair per chain, implemented with the deployment.
//! The dispatch engine never touches an RPC client directly.

use crate::domain::{GasMetrics, PayableOverrides, UpdateArgs};
use async_trait::async_trait;
use shared_types::Address;
use std::time::Duration;

/// An assembled, ready-to-send transaction. Opaque to the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainTransaction {
    pub payload: Vec<u8>,
    pub overrides: PayableOverrides,
}

/// Result of handing a transaction to the chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxSubmission {
    pub hash: String,
    pub block: Option<u64>,
}

/// Low-level access to one chain.
#[async_trait]
pub trait ChainAdapter: Send + Sync {
    async fn get_block_number(&self) -> Result<u64, String>;

    async fn get_block_timestamp(&self) -> Result<u64, String>;

    /// Next nonce for an account.
    async fn get_transaction_count(&self, address: &Address) -> Result<u64, String>;

    /// Provider-suggested fee parameters.
    async fn estimate_fees(&self) -> Result<GasMetrics, String>;

    async fn send_transaction(&self, tx: &ChainTransaction) -> Result<TxSubmission, String>;

    /// Wait for inclusion. `Ok(true)` means included with success status,
    /// `Ok(false)` means included but reverted; a timeout is an `Err`.
    async fn wait_for_transaction(&self, hash: &str, timeout: Duration) -> Result<bool, String>;

    /// Replace a pending transaction with a bumped-fee no-op.
    async fn cancel_transaction(&self, nonce: u64, fees: &GasMetrics) -> Result<String, String>;

    /// Whether an error message is a nonce-already-used class of failure.
    fn is_nonce_error(&self, error: &str) -> bool;
}

/// The feeds contract of one chain.
#[async_trait]
pub trait FeedsContract: Send + Sync {
    async fn required_signatures(&self) -> Result<u32, String>;

    /// Contract's own gas estimate for an update call.
    async fn estimate_gas_for_update(&self, args: &UpdateArgs) -> Result<u64, String>;

    /// Assemble the update call with the resolved overrides.
    async fn prepare_update(
        &self,
        args: &UpdateArgs,
        overrides: &PayableOverrides,
    ) -> Result<ChainTransaction, String>;
}
