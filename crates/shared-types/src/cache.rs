//! Key-value cache port.
//!
//! Backs the signature-threshold cache, the validator-set cache and the
//! scheduler's distributed locks. Concrete adapters (in-memory, Redis) live
//! with the runtime; everything here is deployment-agnostic.

use async_trait::async_trait;
use std::time::Duration;

/// A shared key-value store with optional per-key TTL.
///
/// Values are strings; callers serialize structured payloads with
/// `serde_json`. Errors are adapter-specific strings, mapped into domain
/// errors by the consuming service.
#[async_trait]
pub trait KeyValueCache: Send + Sync {
    /// Read a key. `Ok(None)` means the key is absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>, String>;

    /// Write a key, replacing any existing value.
    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), String>;

    /// Write a key only if it is absent. Returns `true` when the write won.
    ///
    /// This is the primitive behind distributed mutual-exclusion locks: the
    /// TTL bounds how long a crashed holder can wedge the lock.
    async fn set_if_absent(&self, key: &str, value: String, ttl: Duration) -> Result<bool, String>;

    /// Delete a key. Deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), String>;
}
