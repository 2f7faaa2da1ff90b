//! Per-chain dispatch engine.
//!
//! Turns an agreed payload into a submitted, confirmed (or failed)
//! transaction on one chain. Strictly sequential within the chain: gas →
//! build → submit → confirm. A nonce conflict triggers exactly one nonce
//! refetch and rebuild; every other submission error is terminal for this
//! round. The next round's dispatch attempt is independent.

use crate::domain::error::DispatchResult;
use crate::domain::{
    scale_ceil, ChainPolicy, DispatchError, DispatchJob, DispatchState, GasMetrics, GasPolicy,
    PayableOverrides, UpdateArgs,
};
use crate::ports::{ChainAdapter, FeedsContract, TxSubmission};
use shared_types::{Address, ChainId, DeviationConsensus};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Fee bump applied to cancellation replacements so they outbid the
/// original transaction.
const CANCELLATION_FEE_BUMP: f64 = 1.2;

/// A confirmed submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatchConfirmation {
    pub job_id: Uuid,
    pub hash: String,
    pub block: Option<u64>,
}

/// Dispatches agreed payloads onto one chain.
pub struct DispatchEngine {
    chain_id: ChainId,
    policy: ChainPolicy,
    sender: Address,
    adapter: Arc<dyn ChainAdapter>,
    feeds: Arc<dyn FeedsContract>,
}

impl DispatchEngine {
    pub fn new(
        chain_id: ChainId,
        policy: ChainPolicy,
        sender: Address,
        adapter: Arc<dyn ChainAdapter>,
        feeds: Arc<dyn FeedsContract>,
    ) -> Self {
        Self {
            chain_id,
            policy,
            sender,
            adapter,
            feeds,
        }
    }

    pub fn chain_id(&self) -> &ChainId {
        &self.chain_id
    }

    /// Resolve fee parameters per this chain's policy.
    ///
    /// `None` means the chain prices execution itself and the transaction
    /// carries no explicit fee parameters.
    pub async fn resolve_gas_metrics(&self) -> DispatchResult<Option<GasMetrics>> {
        match self.policy.gas_policy {
            GasPolicy::ProviderDefault => {
                let fees = self.adapter.estimate_fees().await.map_err(|reason| {
                    DispatchError::GasResolution {
                        chain_id: self.chain_id.clone(),
                        reason,
                    }
                })?;
                Ok(Some(fees))
            }
            GasPolicy::ManualEstimate { multiplier } => {
                let fees = self.adapter.estimate_fees().await.map_err(|reason| {
                    DispatchError::GasResolution {
                        chain_id: self.chain_id.clone(),
                        reason,
                    }
                })?;
                Ok(Some(fees.scaled(multiplier)))
            }
            GasPolicy::PriorityFee {
                max_priority_fee_gwei,
                max_fee_gwei,
            } => {
                let (priority, max) =
                    GasPolicy::priority_fee_wei(max_priority_fee_gwei, max_fee_gwei);
                Ok(Some(GasMetrics::eip1559(max, priority)))
            }
            GasPolicy::Skip => Ok(None),
        }
    }

    /// Resolve the transaction overrides for an update call.
    ///
    /// The gas limit always comes from the contract's own estimate scaled
    /// by the policy multiplier, even on chains that skip fee resolution.
    pub async fn calculate_payable_overrides(
        &self,
        args: &UpdateArgs,
        nonce: u64,
        gas: Option<GasMetrics>,
    ) -> DispatchResult<PayableOverrides> {
        let estimate = self
            .feeds
            .estimate_gas_for_update(args)
            .await
            .map_err(|reason| DispatchError::BuildFailed {
                chain_id: self.chain_id.clone(),
                reason,
            })?;
        let gas_limit = scale_ceil(estimate as u128, self.policy.gas_limit_multiplier) as u64;
        Ok(PayableOverrides {
            gas_limit: Some(gas_limit),
            nonce: Some(nonce),
            gas,
        })
    }

    /// Run the full dispatch state machine for one payload.
    pub async fn dispatch(
        &self,
        consensus: &DeviationConsensus,
    ) -> DispatchResult<DispatchConfirmation> {
        let mut job = DispatchJob::new(self.chain_id.clone());
        let result = self.run(&mut job, consensus).await;
        match &result {
            Ok(confirmation) => info!(
                chain_id = %self.chain_id,
                job_id = %job.id,
                hash = %confirmation.hash,
                attempts = job.attempt,
                "Update confirmed"
            ),
            Err(e) => {
                if !job.state.is_terminal() {
                    let _ = job.transition_to(DispatchState::Failed);
                }
                error!(
                    chain_id = %self.chain_id,
                    job_id = %job.id,
                    error = %e,
                    "Dispatch failed for this round"
                );
            }
        }
        result
    }

    async fn run(
        &self,
        job: &mut DispatchJob,
        consensus: &DeviationConsensus,
    ) -> DispatchResult<DispatchConfirmation> {
        self.check_payload_age(consensus).await?;
        let args = UpdateArgs::from(consensus);

        job.transition_to(DispatchState::GasResolution)?;
        let gas = self.resolve_gas_metrics().await?;
        job.gas = gas;

        job.transition_to(DispatchState::Building)?;
        let mut nonce = self.fetch_nonce().await?;
        job.nonce = Some(nonce);
        let mut tx = self.build(&args, nonce, gas).await?;

        job.transition_to(DispatchState::Submitting)?;
        job.attempt += 1;
        if let Ok(block) = self.adapter.get_block_number().await {
            debug!(chain_id = %self.chain_id, block, nonce, "Submitting update");
        }

        let submission = match self.adapter.send_transaction(&tx).await {
            Ok(submission) => submission,
            Err(reason) if self.adapter.is_nonce_error(&reason) => {
                warn!(
                    chain_id = %self.chain_id,
                    nonce,
                    reason = %reason,
                    "Nonce conflict, refetching and retrying once"
                );
                job.transition_to(DispatchState::Building)?;
                nonce = self.fetch_nonce().await?;
                job.nonce = Some(nonce);
                tx = self.build(&args, nonce, gas).await?;

                job.transition_to(DispatchState::Submitting)?;
                job.attempt += 1;
                self.adapter.send_transaction(&tx).await.map_err(|reason| {
                    DispatchError::SubmissionFailed {
                        chain_id: self.chain_id.clone(),
                        reason,
                    }
                })?
            }
            Err(reason) => {
                return Err(DispatchError::SubmissionFailed {
                    chain_id: self.chain_id.clone(),
                    reason,
                })
            }
        };

        job.transition_to(DispatchState::AwaitingConfirmation)?;
        self.confirm(job, nonce, submission).await
    }

    async fn confirm(
        &self,
        job: &mut DispatchJob,
        nonce: u64,
        submission: TxSubmission,
    ) -> DispatchResult<DispatchConfirmation> {
        let timeout = Duration::from_secs(self.policy.confirmation_timeout_secs);
        match self
            .adapter
            .wait_for_transaction(&submission.hash, timeout)
            .await
        {
            Ok(true) => {
                job.transition_to(DispatchState::Confirmed)?;
                Ok(DispatchConfirmation {
                    job_id: job.id,
                    hash: submission.hash,
                    block: submission.block,
                })
            }
            Ok(false) => Err(DispatchError::Reverted {
                chain_id: self.chain_id.clone(),
                hash: submission.hash,
            }),
            Err(reason) => {
                debug!(
                    chain_id = %self.chain_id,
                    hash = %submission.hash,
                    reason = %reason,
                    "Confirmation wait expired"
                );
                if self.policy.supports_cancellation {
                    job.transition_to(DispatchState::Cancelling)?;
                    self.cancel(job, nonce).await;
                }
                Err(DispatchError::ConfirmationTimeout {
                    chain_id: self.chain_id.clone(),
                    hash: submission.hash,
                    timeout_secs: self.policy.confirmation_timeout_secs,
                })
            }
        }
    }

    async fn cancel(&self, job: &DispatchJob, nonce: u64) {
        let fees = job.gas.unwrap_or_default().scaled(CANCELLATION_FEE_BUMP);
        match self.adapter.cancel_transaction(nonce, &fees).await {
            Ok(hash) => warn!(
                chain_id = %self.chain_id,
                nonce,
                cancel_hash = %hash,
                "Submitted replacement cancellation"
            ),
            Err(reason) => warn!(
                chain_id = %self.chain_id,
                nonce,
                reason = %reason,
                "Cancellation attempt failed"
            ),
        }
    }

    async fn build(
        &self,
        args: &UpdateArgs,
        nonce: u64,
        gas: Option<GasMetrics>,
    ) -> DispatchResult<crate::ports::ChainTransaction> {
        let overrides = self.calculate_payable_overrides(args, nonce, gas).await?;
        self.feeds
            .prepare_update(args, &overrides)
            .await
            .map_err(|reason| DispatchError::BuildFailed {
                chain_id: self.chain_id.clone(),
                reason,
            })
    }

    async fn fetch_nonce(&self) -> DispatchResult<u64> {
        self.adapter
            .get_transaction_count(&self.sender)
            .await
            .map_err(|reason| DispatchError::NonceFetch {
                chain_id: self.chain_id.clone(),
                reason,
            })
    }

    /// Skip payloads that have gone stale relative to chain time. A failed
    /// timestamp read skips the check, not the dispatch.
    async fn check_payload_age(&self, consensus: &DeviationConsensus) -> DispatchResult<()> {
        let chain_time = match self.adapter.get_block_timestamp().await {
            Ok(ts) => ts,
            Err(reason) => {
                debug!(
                    chain_id = %self.chain_id,
                    reason = %reason,
                    "Block timestamp unavailable, skipping payload age check"
                );
                return Ok(());
            }
        };
        let age_secs = chain_time.saturating_sub(consensus.data_timestamp);
        if age_secs > self.policy.max_payload_age_secs {
            return Err(DispatchError::StalePayload {
                chain_id: self.chain_id.clone(),
                age_secs,
                limit_secs: self.policy.max_payload_age_secs,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::ChainTransaction;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    struct MockAdapter {
        nonces: Mutex<Vec<u64>>,
        send_results: Mutex<Vec<Result<TxSubmission, String>>>,
        sends: Mutex<u64>,
        wait_result: Mutex<Result<bool, String>>,
        cancels: Mutex<Vec<u64>>,
        block_timestamp: u64,
    }

    impl MockAdapter {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                nonces: Mutex::new(vec![7]),
                send_results: Mutex::new(vec![Ok(submission("0xhash1"))]),
                sends: Mutex::new(0),
                wait_result: Mutex::new(Ok(true)),
                cancels: Mutex::new(Vec::new()),
                block_timestamp: 1_700_000_000,
            })
        }
    }

    fn submission(hash: &str) -> TxSubmission {
        TxSubmission {
            hash: hash.to_string(),
            block: Some(100),
        }
    }

    #[async_trait]
    impl ChainAdapter for MockAdapter {
        async fn get_block_number(&self) -> Result<u64, String> {
            Ok(100)
        }

        async fn get_block_timestamp(&self) -> Result<u64, String> {
            Ok(self.block_timestamp)
        }

        async fn get_transaction_count(&self, _address: &Address) -> Result<u64, String> {
            let mut nonces = self.nonces.lock();
            if nonces.len() > 1 {
                Ok(nonces.remove(0))
            } else {
                Ok(nonces[0])
            }
        }

        async fn estimate_fees(&self) -> Result<GasMetrics, String> {
            Ok(GasMetrics::legacy(10_000_000_000))
        }

        async fn send_transaction(&self, _tx: &ChainTransaction) -> Result<TxSubmission, String> {
            *self.sends.lock() += 1;
            let mut results = self.send_results.lock();
            if results.len() > 1 {
                results.remove(0)
            } else {
                results[0].clone()
            }
        }

        async fn wait_for_transaction(
            &self,
            _hash: &str,
            _timeout: Duration,
        ) -> Result<bool, String> {
            self.wait_result.lock().clone()
        }

        async fn cancel_transaction(
            &self,
            nonce: u64,
            _fees: &GasMetrics,
        ) -> Result<String, String> {
            self.cancels.lock().push(nonce);
            Ok("0xcancel".to_string())
        }

        fn is_nonce_error(&self, error: &str) -> bool {
            error.contains("nonce")
        }
    }

    struct MockFeeds {
        gas_estimate: u64,
    }

    #[async_trait]
    impl FeedsContract for MockFeeds {
        async fn required_signatures(&self) -> Result<u32, String> {
            Ok(2)
        }

        async fn estimate_gas_for_update(&self, _args: &UpdateArgs) -> Result<u64, String> {
            Ok(self.gas_estimate)
        }

        async fn prepare_update(
            &self,
            args: &UpdateArgs,
            overrides: &PayableOverrides,
        ) -> Result<ChainTransaction, String> {
            let payload = serde_json::to_vec(args).map_err(|e| e.to_string())?;
            Ok(ChainTransaction {
                payload,
                overrides: *overrides,
            })
        }
    }

    fn create_test_consensus() -> DeviationConsensus {
        DeviationConsensus {
            chain_id: ChainId::new("ethereum").unwrap(),
            data_timestamp: 1_700_000_000,
            keys: vec!["BTC-USD".to_string()],
            price_data: vec![],
            signatures: vec![],
            created_at: 1_700_000_000,
        }
    }

    fn engine_with(policy: ChainPolicy, adapter: Arc<MockAdapter>) -> DispatchEngine {
        DispatchEngine::new(
            ChainId::new("ethereum").unwrap(),
            policy,
            Address::new("0xsender").unwrap(),
            adapter,
            Arc::new(MockFeeds {
                gas_estimate: 100_000,
            }),
        )
    }

    #[tokio::test]
    async fn test_happy_path_confirms() {
        let adapter = MockAdapter::new();
        let engine = engine_with(ChainPolicy::default(), adapter.clone());
        let confirmation = engine.dispatch(&create_test_consensus()).await.unwrap();
        assert_eq!(confirmation.hash, "0xhash1");
        assert_eq!(*adapter.sends.lock(), 1);
    }

    #[tokio::test]
    async fn test_skip_policy_no_metrics_but_gas_limit_from_estimate() {
        // Estimation-skipping chains still derive a gas limit from the
        // contract estimate times the policy multiplier.
        let policy = ChainPolicy {
            gas_policy: GasPolicy::Skip,
            gas_limit_multiplier: 1.5,
            ..ChainPolicy::default()
        };
        let engine = engine_with(policy, MockAdapter::new());

        let metrics = engine.resolve_gas_metrics().await.unwrap();
        assert_eq!(metrics, None);

        let args = UpdateArgs::from(&create_test_consensus());
        let overrides = engine
            .calculate_payable_overrides(&args, 7, metrics)
            .await
            .unwrap();
        assert_eq!(overrides.gas_limit, Some(150_000));
        assert_eq!(overrides.nonce, Some(7));
        assert_eq!(overrides.gas, None);
    }

    #[tokio::test]
    async fn test_manual_estimate_scales_fees() {
        let policy = ChainPolicy {
            gas_policy: GasPolicy::ManualEstimate { multiplier: 1.1 },
            ..ChainPolicy::default()
        };
        let engine = engine_with(policy, MockAdapter::new());
        let metrics = engine.resolve_gas_metrics().await.unwrap().unwrap();
        assert_eq!(metrics.gas_price, Some(11_000_000_000));
    }

    #[tokio::test]
    async fn test_priority_fee_policy_skips_adapter() {
        let policy = ChainPolicy {
            gas_policy: GasPolicy::PriorityFee {
                max_priority_fee_gwei: 2,
                max_fee_gwei: 30,
            },
            ..ChainPolicy::default()
        };
        let engine = engine_with(policy, MockAdapter::new());
        let metrics = engine.resolve_gas_metrics().await.unwrap().unwrap();
        assert_eq!(metrics.max_priority_fee_per_gas, Some(2_000_000_000));
        assert_eq!(metrics.max_fee_per_gas, Some(30_000_000_000));
        assert_eq!(metrics.gas_price, None);
    }

    #[tokio::test]
    async fn test_nonce_conflict_retries_exactly_once() {
        let adapter = MockAdapter::new();
        *adapter.nonces.lock() = vec![7, 8];
        *adapter.send_results.lock() = vec![
            Err("nonce has already been used".to_string()),
            Ok(submission("0xhash2")),
        ];
        let engine = engine_with(ChainPolicy::default(), adapter.clone());

        let confirmation = engine.dispatch(&create_test_consensus()).await.unwrap();
        assert_eq!(confirmation.hash, "0xhash2");
        assert_eq!(*adapter.sends.lock(), 2);
    }

    #[tokio::test]
    async fn test_second_nonce_conflict_is_terminal() {
        let adapter = MockAdapter::new();
        *adapter.send_results.lock() = vec![
            Err("nonce has already been used".to_string()),
            Err("nonce has already been used".to_string()),
        ];
        let engine = engine_with(ChainPolicy::default(), adapter.clone());

        let err = engine.dispatch(&create_test_consensus()).await.unwrap_err();
        assert!(matches!(err, DispatchError::SubmissionFailed { .. }));
        assert_eq!(*adapter.sends.lock(), 2);
    }

    #[tokio::test]
    async fn test_non_nonce_submission_error_no_retry() {
        let adapter = MockAdapter::new();
        *adapter.send_results.lock() = vec![Err("insufficient funds".to_string())];
        let engine = engine_with(ChainPolicy::default(), adapter.clone());

        let err = engine.dispatch(&create_test_consensus()).await.unwrap_err();
        assert!(matches!(err, DispatchError::SubmissionFailed { .. }));
        assert_eq!(*adapter.sends.lock(), 1);
    }

    #[tokio::test]
    async fn test_timeout_with_cancellation_support() {
        let adapter = MockAdapter::new();
        *adapter.wait_result.lock() = Err("timed out".to_string());
        let engine = engine_with(ChainPolicy::default(), adapter.clone());

        let err = engine.dispatch(&create_test_consensus()).await.unwrap_err();
        assert!(matches!(err, DispatchError::ConfirmationTimeout { .. }));
        assert_eq!(adapter.cancels.lock().as_slice(), &[7]);
    }

    #[tokio::test]
    async fn test_timeout_without_cancellation_goes_straight_to_failed() {
        let adapter = MockAdapter::new();
        *adapter.wait_result.lock() = Err("timed out".to_string());
        let policy = ChainPolicy {
            supports_cancellation: false,
            ..ChainPolicy::default()
        };
        let engine = engine_with(policy, adapter.clone());

        let err = engine.dispatch(&create_test_consensus()).await.unwrap_err();
        assert!(matches!(err, DispatchError::ConfirmationTimeout { .. }));
        assert!(adapter.cancels.lock().is_empty());
    }

    #[tokio::test]
    async fn test_reverted_transaction_fails() {
        let adapter = MockAdapter::new();
        *adapter.wait_result.lock() = Ok(false);
        let engine = engine_with(ChainPolicy::default(), adapter);
        let err = engine.dispatch(&create_test_consensus()).await.unwrap_err();
        assert!(matches!(err, DispatchError::Reverted { .. }));
    }

    #[tokio::test]
    async fn test_stale_payload_skipped() {
        let adapter = MockAdapter::new();
        let engine = engine_with(ChainPolicy::default(), adapter.clone());
        let mut consensus = create_test_consensus();
        consensus.data_timestamp = adapter.block_timestamp - 10_000;

        let err = engine.dispatch(&consensus).await.unwrap_err();
        assert!(matches!(err, DispatchError::StalePayload { .. }));
        assert_eq!(*adapter.sends.lock(), 0);
    }
}
