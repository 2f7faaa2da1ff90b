//! # ov-01-consensus
//!
//! Signature consensus for the oracle validator.
//!
//! ## Architecture
//!
//! One round of the protocol flows through this crate as follows:
//!
//! ```text
//! peer responses ──→ VersionChecker ──→ ValidatorSetFilter ──→ resolver
//!                         │                     │                  │
//!                    (ignore old           (drop unknown     Simple or
//!                     protocols)            signers)         Optimized
//!                                                                │
//!                thresholds from RequiredSignaturesResolver ─────┤
//!                                                                ↓
//!                                              ConsensusResult (or nothing)
//! ```
//!
//! Leadership is a pure function of the round timestamp and the validator
//! list ([`LeaderSelector`]); there is no coordinator and no election
//! traffic. Quorum thresholds are read from each chain's contracts and
//! cached with last-known-good semantics, so a transient RPC failure never
//! zeroes out a previously known threshold.
//!
//! Nothing in this crate submits transactions; a [`ConsensusResult`] that
//! meets its chain's threshold is handed to the dispatch subsystem.

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::{
    ConsensusConstraints, ConsensusError, ConsensusLayer, ConsensusOptimizer, ConsensusParticipant,
    ConsensusResult, LeaderSelector, LeaderSelectorV1, LeaderSelectorV2, OptimizedResolver,
    OptimizerSolution, RequiredSignatures, SimpleResolver, VersionChecker,
};
pub use ports::{ProposalSource, ResponseSource, Signer, ThresholdContract, ValidatorRegistry};
pub use service::{RequiredSignaturesResolver, ThresholdContracts, ValidatorSetFilter};
