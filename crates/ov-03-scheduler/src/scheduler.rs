//! Interval loops driving the registered jobs.

use crate::job::PeriodicJob;
use crate::lock::JobLock;
use shared_types::KeyValueCache;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

pub struct JobScheduler<C: KeyValueCache + 'static> {
    lock: Arc<JobLock<C>>,
    jobs: Vec<Arc<dyn PeriodicJob>>,
}

impl<C: KeyValueCache + 'static> JobScheduler<C> {
    pub fn new(cache: Arc<C>) -> Self {
        Self {
            lock: Arc::new(JobLock::new(cache)),
            jobs: Vec::new(),
        }
    }

    pub fn register(&mut self, job: Arc<dyn PeriodicJob>) {
        self.jobs.push(job);
    }

    /// Spawn one interval loop per registered job. The loops run until the
    /// returned handles are aborted or the runtime shuts down.
    pub fn spawn(&self) -> Vec<JoinHandle<()>> {
        self.jobs
            .iter()
            .map(|job| {
                let job = Arc::clone(job);
                let lock = Arc::clone(&self.lock);
                info!(job = job.name(), interval_secs = job.interval().as_secs(), "Starting periodic job");
                tokio::spawn(async move {
                    let mut ticker = tokio::time::interval(job.interval());
                    // Burst keeps each tick's original deadline, so a tick
                    // delivered long after its schedule is detectably stale.
                    ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);
                    loop {
                        let deadline = ticker.tick().await;
                        // A tick whose deadline lies more than a full
                        // interval in the past describes a round that already
                        // happened. Drop it instead of running late work.
                        if deadline.elapsed() > job.interval() {
                            debug!(job = job.name(), "Dropping stale tick");
                            continue;
                        }
                        run_once(job.as_ref(), &lock).await;
                    }
                })
            })
            .collect()
    }
}

async fn run_once<C: KeyValueCache>(job: &dyn PeriodicJob, lock: &JobLock<C>) {
    match lock.acquire(job.name(), job.lock_ttl()).await {
        Ok(true) => {}
        Ok(false) => {
            debug!(job = job.name(), "Lock held by another node, skipping tick");
            return;
        }
        Err(e) => {
            warn!(job = job.name(), error = %e, "Lock acquisition failed, skipping tick");
            return;
        }
    }

    let started = Instant::now();
    match job.run().await {
        Ok(()) => debug!(
            job = job.name(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Job run complete"
        ),
        Err(reason) => warn!(job = job.name(), %reason, "Job run failed"),
    }
    lock.release(job.name()).await;
}
