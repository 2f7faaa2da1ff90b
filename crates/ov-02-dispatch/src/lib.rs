//! # ov-02-dispatch
//!
//! Multi-chain transaction dispatch.
//!
//! ## Architecture
//!
//! One agreed payload per chain flows through a strictly sequential state
//! machine, because nonce ordering matters within a chain:
//!
//! ```text
//! Idle → GasResolution → Building → Submitting → AwaitingConfirmation
//!                                       │                │
//!                                 (nonce conflict:       ├─→ Confirmed
//!                                  rebuild once)         ├─→ Cancelling → Failed
//!                                                        └─→ Failed
//! ```
//!
//! Chain-specific behavior (gas estimation, priority fees, cancellation
//! support) is a [`ChainPolicy`] value object selected from configuration,
//! not a dispatcher subclass per chain. Across chains everything runs
//! concurrently: the [`DispatchCoordinator`] joins every chain's dispatch
//! and isolates failures, so one chain's outage never blocks another's
//! submission.

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::{
    ChainPolicy, DispatchError, DispatchJob, DispatchState, GasMetrics, GasPolicy,
    PayableOverrides, UpdateArgs,
};
pub use ports::{ChainAdapter, ChainTransaction, FeedsContract, TxSubmission};
pub use service::{ChainDispatchOutcome, DispatchConfirmation, DispatchCoordinator, DispatchEngine};
