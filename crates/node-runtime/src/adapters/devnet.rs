//! Devnet simulation adapters.
//!
//! A complete in-process stand-in for the external world: a simulated
//! chain, feeds contract, registry, signer and price source. Lets a single
//! node run the full round loop (lead, propose, sign, resolve, dispatch)
//! with no RPC endpoints. Not used in production wiring.

use async_trait::async_trait;
use ov_01_consensus::ports::{
    ProposalSource, ResponseSource, Signer, ThresholdContract, ValidatorRegistry,
};
use ov_02_dispatch::domain::{GasMetrics, PayableOverrides, UpdateArgs};
use ov_02_dispatch::ports::{ChainAdapter, ChainTransaction, FeedsContract, TxSubmission};
use parking_lot::Mutex;
use rand::Rng;
use sha2::{Digest, Sha256};
use shared_types::{
    Address, ChainId, PriceData, ResponseOutcome, RoundProposal, Signature, Validator,
    ValidatorResponse,
};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Shared state of one simulated chain.
#[derive(Default)]
struct ChainState {
    nonce: u64,
    submitted: Vec<String>,
}

/// Simulated chain: blocks advance with wall time, every submission lands
/// in the next block and confirms immediately.
pub struct DevnetChainAdapter {
    chain_id: ChainId,
    state: Mutex<ChainState>,
}

impl DevnetChainAdapter {
    pub fn new(chain_id: ChainId) -> Arc<Self> {
        Arc::new(Self {
            chain_id,
            state: Mutex::new(ChainState::default()),
        })
    }
}

#[async_trait]
impl ChainAdapter for DevnetChainAdapter {
    async fn get_block_number(&self) -> Result<u64, String> {
        // One block per second since the epoch, good enough for a devnet.
        Ok(unix_now())
    }

    async fn get_block_timestamp(&self) -> Result<u64, String> {
        Ok(unix_now())
    }

    async fn get_transaction_count(&self, _address: &Address) -> Result<u64, String> {
        Ok(self.state.lock().nonce)
    }

    async fn estimate_fees(&self) -> Result<GasMetrics, String> {
        Ok(GasMetrics::eip1559(30_000_000_000, 1_500_000_000))
    }

    async fn send_transaction(&self, tx: &ChainTransaction) -> Result<TxSubmission, String> {
        let mut state = self.state.lock();
        let hash = format!("0x{}", hex::encode(Sha256::digest(&tx.payload)));
        state.nonce += 1;
        state.submitted.push(hash.clone());
        debug!(chain_id = %self.chain_id, hash = %hash, "Devnet transaction accepted");
        Ok(TxSubmission {
            hash,
            block: Some(unix_now()),
        })
    }

    async fn wait_for_transaction(&self, _hash: &str, _timeout: Duration) -> Result<bool, String> {
        Ok(true)
    }

    async fn cancel_transaction(&self, nonce: u64, _fees: &GasMetrics) -> Result<String, String> {
        Ok(format!("0xdevnet-cancel-{nonce}"))
    }

    fn is_nonce_error(&self, error: &str) -> bool {
        error.contains("nonce")
    }
}

/// Simulated feeds contract with a fixed signature threshold.
pub struct DevnetFeedsContract {
    required_signatures: u32,
}

impl DevnetFeedsContract {
    pub fn new(required_signatures: u32) -> Arc<Self> {
        Arc::new(Self {
            required_signatures,
        })
    }
}

#[async_trait]
impl FeedsContract for DevnetFeedsContract {
    async fn required_signatures(&self) -> Result<u32, String> {
        Ok(self.required_signatures)
    }

    async fn estimate_gas_for_update(&self, args: &UpdateArgs) -> Result<u64, String> {
        Ok(60_000 + 40_000 * args.keys.len() as u64)
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

#[async_trait]
impl ThresholdContract for DevnetFeedsContract {
    async fn required_signatures(&self) -> Result<u32, String> {
        Ok(self.required_signatures)
    }
}

/// Static registry answering every chain with the same configured fleet.
pub struct DevnetRegistry {
    validators: Vec<Validator>,
}

impl DevnetRegistry {
    pub fn new(validators: Vec<Validator>) -> Arc<Self> {
        Arc::new(Self { validators })
    }
}

#[async_trait]
impl ValidatorRegistry for DevnetRegistry {
    async fn list(&self, _chain_id: &ChainId) -> Result<Vec<Validator>, String> {
        Ok(self.validators.clone())
    }
}

/// Deterministic mock signer: SHA-256 over a per-node seed and the digest.
///
/// Produces stable, distinguishable signatures without real key material.
pub struct DevnetSigner {
    address: Address,
    seed: [u8; 32],
}

impl DevnetSigner {
    pub fn new(address: Address) -> Arc<Self> {
        let seed = Sha256::digest(address.as_str().as_bytes()).into();
        Arc::new(Self { address, seed })
    }
}

#[async_trait]
impl Signer for DevnetSigner {
    async fn sign(&self, digest: &[u8; 32]) -> Result<Signature, String> {
        let mut hasher = Sha256::new();
        hasher.update(self.seed);
        hasher.update(digest);
        Ok(Signature(hasher.finalize().to_vec()))
    }

    fn address(&self) -> Address {
        self.address.clone()
    }
}

/// Random-walk price source over a configured set of feed keys.
pub struct DevnetPriceSource {
    keys: Vec<String>,
    prices: Mutex<Vec<u128>>,
}

impl DevnetPriceSource {
    pub fn new(keys: Vec<String>) -> Arc<Self> {
        let prices = keys.iter().map(|_| 100_00000000u128).collect();
        Arc::new(Self {
            keys,
            prices: Mutex::new(prices),
        })
    }
}

#[async_trait]
impl ProposalSource for DevnetPriceSource {
    async fn propose(&self, data_timestamp: u64) -> Result<RoundProposal, String> {
        let mut rng = rand::thread_rng();
        let mut prices = self.prices.lock();
        let mut price_data = Vec::with_capacity(self.keys.len());
        for (key, price) in self.keys.iter().zip(prices.iter_mut()) {
            // Walk within +-1% per round.
            let basis_points: i64 = rng.gen_range(-100..=100);
            let delta = (*price / 10_000) * basis_points.unsigned_abs() as u128;
            *price = if basis_points < 0 {
                price.saturating_sub(delta).max(1)
            } else {
                *price + delta
            };
            price_data.push(PriceData {
                key: key.clone(),
                value: *price,
                timestamp: data_timestamp,
                heartbeat: 3600,
            });
        }
        Ok(RoundProposal {
            keys: self.keys.clone(),
            price_data,
        })
    }
}

/// Single-node response collection: the only fleet member is this node, and
/// it always agrees with its own proposal.
pub struct DevnetResponseSource {
    signer: Arc<dyn Signer>,
    power: u128,
    version: String,
}

impl DevnetResponseSource {
    pub fn new(signer: Arc<dyn Signer>, power: u128, version: String) -> Arc<Self> {
        Arc::new(Self {
            signer,
            power,
            version,
        })
    }
}

#[async_trait]
impl ResponseSource for DevnetResponseSource {
    async fn collect(
        &self,
        proposal: &RoundProposal,
        data_timestamp: u64,
    ) -> Result<Vec<ValidatorResponse>, String> {
        let digest = proposal.signing_digest(data_timestamp);
        let signature = self.signer.sign(&digest).await?;
        Ok(vec![ValidatorResponse {
            validator: self.signer.address(),
            power: self.power,
            version: self.version.clone(),
            outcome: ResponseOutcome::Signed { signature },
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_devnet_submission_bumps_nonce() {
        let adapter = DevnetChainAdapter::new(ChainId::new("devnet").unwrap());
        let sender = Address::new("0xnode").unwrap();
        assert_eq!(adapter.get_transaction_count(&sender).await.unwrap(), 0);

        let tx = ChainTransaction {
            payload: vec![1, 2, 3],
            overrides: PayableOverrides::default(),
        };
        adapter.send_transaction(&tx).await.unwrap();
        assert_eq!(adapter.get_transaction_count(&sender).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_signer_is_deterministic_per_digest() {
        let signer = DevnetSigner::new(Address::new("0xnode").unwrap());
        let a = signer.sign(&[1u8; 32]).await.unwrap();
        let b = signer.sign(&[1u8; 32]).await.unwrap();
        let c = signer.sign(&[2u8; 32]).await.unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[tokio::test]
    async fn test_price_source_covers_all_keys() {
        let source =
            DevnetPriceSource::new(vec!["BTC-USD".to_string(), "ETH-USD".to_string()]);
        let proposal = source.propose(1_700_000_000).await.unwrap();
        assert_eq!(proposal.keys.len(), 2);
        assert_eq!(proposal.price_data.len(), 2);
        assert!(proposal.price_data.iter().all(|p| p.value > 0));
    }

    #[tokio::test]
    async fn test_response_source_signs_proposal_digest() {
        let signer = DevnetSigner::new(Address::new("0xnode").unwrap());
        let source = DevnetResponseSource::new(signer.clone(), 100, "1.0.0".to_string());
        let proposal = RoundProposal {
            keys: vec!["BTC-USD".to_string()],
            price_data: vec![],
        };
        let responses = source.collect(&proposal, 1_700_000_000).await.unwrap();
        assert_eq!(responses.len(), 1);

        let expected = signer
            .sign(&proposal.signing_digest(1_700_000_000))
            .await
            .unwrap();
        match &responses[0].outcome {
            ResponseOutcome::Signed { signature } => assert_eq!(signature, &expected),
            other => panic!("expected signed outcome, got {other:?}"),
        }
    }
}
