//! # Subsystem 03: Periodic Jobs
//!
//! Interval-driven background work for the validator node. Every job runs
//! under a distributed TTL lock held in the shared key-value cache, so a
//! fleet of nodes with identical configuration executes each job once per
//! tick rather than once per node.
//!
//! ```text
//!   interval tick ──> stale? ──yes──> skip
//!        │ no
//!        v
//!   acquire lock::<job> ──held elsewhere──> skip
//!        │ won
//!        v
//!   job.run() ──> release lock
//! ```

pub mod error;
pub mod job;
pub mod lock;
pub mod scheduler;

pub use error::SchedulerError;
pub use job::PeriodicJob;
pub use lock::JobLock;
pub use scheduler::JobScheduler;
