//! Distributed job locks over the shared key-value cache.
//!
//! One key per job, `set_if_absent` with a TTL as the acquisition
//! primitive. The TTL bounds how long a crashed holder can wedge the job;
//! release only deletes the key when this node still holds it, so an
//! expired-and-reacquired lock is never stolen back.

use crate::error::{SchedulerError, SchedulerResult};
use shared_types::KeyValueCache;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use uuid::Uuid;

pub struct JobLock<C: KeyValueCache> {
    cache: Arc<C>,
    /// This node's identity as a lock holder, fresh per process.
    holder: String,
}

impl<C: KeyValueCache> JobLock<C> {
    pub fn new(cache: Arc<C>) -> Self {
        Self {
            cache,
            holder: Uuid::new_v4().to_string(),
        }
    }

    fn key(job: &str) -> String {
        format!("lock::{job}")
    }

    /// Try to take the lock for one run. `Ok(true)` means this node won.
    pub async fn acquire(&self, job: &str, ttl: Duration) -> SchedulerResult<bool> {
        self.cache
            .set_if_absent(&Self::key(job), self.holder.clone(), ttl)
            .await
            .map_err(|reason| SchedulerError::LockError {
                job: job.to_string(),
                reason,
            })
    }

    /// Release the lock if this node still holds it. Best effort; a failed
    /// release only delays the next run by at most the TTL.
    pub async fn release(&self, job: &str) {
        let key = Self::key(job);
        match self.cache.get(&key).await {
            Ok(Some(holder)) if holder == self.holder => {
                if let Err(reason) = self.cache.delete(&key).await {
                    warn!(job, %reason, "Failed to release job lock");
                }
            }
            Ok(_) => {}
            Err(reason) => warn!(job, %reason, "Failed to read job lock during release"),
        }
    }
}
