//! In-process key-value cache.
//!
//! Single-node deployments use this; fleets point the same port at Redis so
//! the scheduler locks and threshold caches are actually shared.

use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::KeyValueCache;
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Default)]
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
}

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn live(&self) -> bool {
        self.expires_at.map_or(true, |at| Instant::now() < at)
    }
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueCache for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, String> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.live() => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), String> {
        self.entries.lock().insert(
            key.to_string(),
            Entry {
                value,
                expires_at: ttl.map(|t| Instant::now() + t),
            },
        );
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: String, ttl: Duration) -> Result<bool, String> {
        let mut entries = self.entries.lock();
        if entries.get(key).is_some_and(Entry::live) {
            return Ok(false);
        }
        entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Some(Instant::now() + ttl),
            },
        );
        Ok(true)
    }

    async fn delete(&self, key: &str) -> Result<(), String> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_delete() {
        let cache = InMemoryCache::new();
        cache.set("k", "v".to_string(), None).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some("v".to_string()));
        cache.delete("k").await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expired_entry_absent() {
        let cache = InMemoryCache::new();
        cache
            .set("k", "v".to_string(), Some(Duration::from_millis(0)))
            .await
            .unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_if_absent_respects_live_entry() {
        let cache = InMemoryCache::new();
        assert!(cache
            .set_if_absent("k", "first".to_string(), Duration::from_secs(60))
            .await
            .unwrap());
        assert!(!cache
            .set_if_absent("k", "second".to_string(), Duration::from_secs(60))
            .await
            .unwrap());
        assert_eq!(cache.get("k").await.unwrap(), Some("first".to_string()));
    }

    #[tokio::test]
    async fn test_set_if_absent_wins_over_expired_entry() {
        let cache = InMemoryCache::new();
        cache
            .set("k", "old".to_string(), Some(Duration::from_millis(0)))
            .await
            .unwrap();
        assert!(cache
            .set_if_absent("k", "new".to_string(), Duration::from_secs(60))
            .await
            .unwrap());
    }
}
