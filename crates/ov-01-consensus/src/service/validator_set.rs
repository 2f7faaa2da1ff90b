//! Validator-set filtering.
//!
//! Maps a chain id to the set of addresses currently authorized to sign for
//! that chain and filters incoming signature lists down to that set. A
//! signature from a de-registered key is silently dropped, not reported as a
//! discrepancy: an unauthorized signer is not a data disagreement.

use crate::domain::ConsensusError;
use crate::ports::ValidatorRegistry;
use shared_types::{Address, ChainId, KeyValueCache, SignatureWithSigner, Validator};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

fn cache_key(chain_id: &ChainId) -> String {
    format!("validator_set::{chain_id}")
}

/// Per-chain authorized validator sets, cached over the registry.
pub struct ValidatorSetFilter<C: KeyValueCache> {
    registry: Arc<dyn ValidatorRegistry>,
    cache: Arc<C>,
    cache_ttl: Duration,
}

impl<C: KeyValueCache> ValidatorSetFilter<C> {
    pub fn new(registry: Arc<dyn ValidatorRegistry>, cache: Arc<C>, cache_ttl: Duration) -> Self {
        Self {
            registry,
            cache,
            cache_ttl,
        }
    }

    /// Current validators for a chain, falling back to the cached set when
    /// the registry read fails.
    pub async fn validators(&self, chain_id: &ChainId) -> Result<Vec<Validator>, ConsensusError> {
        match self.registry.list(chain_id).await {
            Ok(validators) => {
                self.write_cache(chain_id, &validators).await;
                Ok(validators)
            }
            Err(reason) => {
                debug!(
                    chain_id = %chain_id,
                    reason = %reason,
                    "Registry read failed, falling back to cached validator set"
                );
                self.read_cache(chain_id).await.ok_or(ConsensusError::RegistryError {
                    chain_id: chain_id.clone(),
                    reason,
                })
            }
        }
    }

    /// Addresses currently authorized to sign for a chain.
    pub async fn authorized_set(
        &self,
        chain_id: &ChainId,
    ) -> Result<HashSet<Address>, ConsensusError> {
        Ok(self
            .validators(chain_id)
            .await?
            .into_iter()
            .map(|v| v.id)
            .collect())
    }

    /// Keep only signatures whose signer is in the authorized set.
    ///
    /// Pure and idempotent; preserves input order and never introduces
    /// duplicates.
    pub fn apply(
        signatures: &[SignatureWithSigner],
        authorized: &HashSet<Address>,
    ) -> Vec<SignatureWithSigner> {
        signatures
            .iter()
            .filter(|s| authorized.contains(&s.signer))
            .cloned()
            .collect()
    }

    async fn write_cache(&self, chain_id: &ChainId, validators: &[Validator]) {
        match serde_json::to_string(validators) {
            Ok(payload) => {
                if let Err(reason) = self
                    .cache
                    .set(&cache_key(chain_id), payload, Some(self.cache_ttl))
                    .await
                {
                    warn!(chain_id = %chain_id, reason = %reason, "Failed to write validator-set cache");
                }
            }
            Err(e) => warn!(chain_id = %chain_id, error = %e, "Failed to serialize validator set"),
        }
    }

    async fn read_cache(&self, chain_id: &ChainId) -> Option<Vec<Validator>> {
        let payload = self.cache.get(&cache_key(chain_id)).await.ok().flatten()?;
        serde_json::from_str(&payload).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use shared_types::Signature;
    use std::collections::HashMap;

    struct MemoryCache {
        entries: Mutex<HashMap<String, String>>,
    }

    impl MemoryCache {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                entries: Mutex::new(HashMap::new()),
            })
        }
    }

    #[async_trait]
    impl KeyValueCache for MemoryCache {
        async fn get(&self, key: &str) -> Result<Option<String>, String> {
            Ok(self.entries.lock().get(key).cloned())
        }

        async fn set(
            &self,
            key: &str,
            value: String,
            _ttl: Option<Duration>,
        ) -> Result<(), String> {
            self.entries.lock().insert(key.to_string(), value);
            Ok(())
        }

        async fn set_if_absent(
            &self,
            key: &str,
            value: String,
            _ttl: Duration,
        ) -> Result<bool, String> {
            let mut entries = self.entries.lock();
            if entries.contains_key(key) {
                return Ok(false);
            }
            entries.insert(key.to_string(), value);
            Ok(true)
        }

        async fn delete(&self, key: &str) -> Result<(), String> {
            self.entries.lock().remove(key);
            Ok(())
        }
    }

    struct StubRegistry {
        validators: Vec<Validator>,
        fail: Mutex<bool>,
    }

    impl StubRegistry {
        fn new(validators: Vec<Validator>) -> Arc<Self> {
            Arc::new(Self {
                validators,
                fail: Mutex::new(false),
            })
        }
    }

    #[async_trait]
    impl ValidatorRegistry for StubRegistry {
        async fn list(&self, _chain_id: &ChainId) -> Result<Vec<Validator>, String> {
            if *self.fail.lock() {
                return Err("rpc timeout".to_string());
            }
            Ok(self.validators.clone())
        }
    }

    fn validator(id: &str, power: u128) -> Validator {
        Validator {
            id: Address::new(id).unwrap(),
            power,
            location: format!("https://{id}.example"),
        }
    }

    fn signature(signer: &str) -> SignatureWithSigner {
        SignatureWithSigner {
            signer: Address::new(signer).unwrap(),
            signature: Signature(signer.as_bytes().to_vec()),
        }
    }

    #[test]
    fn test_apply_drops_unauthorized() {
        let authorized: HashSet<Address> =
            [Address::new("0xa").unwrap(), Address::new("0xb").unwrap()]
                .into_iter()
                .collect();
        let signatures = vec![signature("0xa"), signature("0xdead"), signature("0xb")];
        let filtered = ValidatorSetFilter::<MemoryCache>::apply(&signatures, &authorized);
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].signer, Address::new("0xa").unwrap());
        assert_eq!(filtered[1].signer, Address::new("0xb").unwrap());
    }

    #[test]
    fn test_apply_case_insensitive() {
        let authorized: HashSet<Address> = [Address::new("0xABCD").unwrap()].into_iter().collect();
        let signatures = vec![signature("0xabcd")];
        let filtered = ValidatorSetFilter::<MemoryCache>::apply(&signatures, &authorized);
        assert_eq!(filtered.len(), 1);
    }

    #[test]
    fn test_apply_idempotent() {
        let authorized: HashSet<Address> =
            [Address::new("0xa").unwrap()].into_iter().collect();
        let signatures = vec![signature("0xa"), signature("0xdead")];
        let once = ValidatorSetFilter::<MemoryCache>::apply(&signatures, &authorized);
        let twice = ValidatorSetFilter::<MemoryCache>::apply(&once, &authorized);
        assert_eq!(once, twice);
    }

    #[tokio::test]
    async fn test_registry_failure_falls_back_to_cache() {
        let registry = StubRegistry::new(vec![validator("0xa", 10), validator("0xb", 20)]);
        let filter = ValidatorSetFilter::new(
            registry.clone(),
            MemoryCache::new(),
            Duration::from_secs(60),
        );

        // Prime the cache with a successful read.
        let fresh = filter.validators(&ChainId::new("ethereum").unwrap()).await.unwrap();
        assert_eq!(fresh.len(), 2);

        *registry.fail.lock() = true;
        let cached = filter.validators(&ChainId::new("ethereum").unwrap()).await.unwrap();
        assert_eq!(cached, fresh);
    }

    #[tokio::test]
    async fn test_registry_failure_without_cache_errors() {
        let registry = StubRegistry::new(vec![validator("0xa", 10)]);
        *registry.fail.lock() = true;
        let filter =
            ValidatorSetFilter::new(registry, MemoryCache::new(), Duration::from_secs(60));
        let err = filter
            .validators(&ChainId::new("ethereum").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, ConsensusError::RegistryError { .. }));
    }

    #[tokio::test]
    async fn test_authorized_set_contains_registry_ids() {
        let registry = StubRegistry::new(vec![validator("0xAAA", 10)]);
        let filter =
            ValidatorSetFilter::new(registry, MemoryCache::new(), Duration::from_secs(60));
        let set = filter
            .authorized_set(&ChainId::new("ethereum").unwrap())
            .await
            .unwrap();
        assert!(set.contains(&Address::new("0xaaa").unwrap()));
    }
}
