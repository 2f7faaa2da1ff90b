use async_trait::async_trait;
use std::time::Duration;

/// A unit of recurring background work.
///
/// Implementations must be idempotent per tick: a job can be skipped on any
/// tick (lock held elsewhere, stale tick) and must catch up on the next one.
#[async_trait]
pub trait PeriodicJob: Send + Sync {
    /// Stable name, also the distributed lock key suffix.
    fn name(&self) -> &str;

    /// Time between runs.
    fn interval(&self) -> Duration;

    /// How long the lock protects a run. Must exceed the worst-case run
    /// duration or two nodes can overlap.
    fn lock_ttl(&self) -> Duration;

    async fn run(&self) -> Result<(), String>;
}
