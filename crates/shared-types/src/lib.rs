//! # shared-types
//!
//! Entities shared across the oracle validator subsystems.
//!
//! Identity is address-based and case-insensitive: [`Address`] and
//! [`ChainId`] normalize to lowercase at construction, so every comparison,
//! hash lookup and cache key downstream is case-insensitive by construction
//! rather than by convention.
//!
//! The [`KeyValueCache`] port lives here because it is a cross-subsystem
//! capability: it backs the signature-threshold cache, the validator-set
//! cache and the scheduler's distributed locks.

pub mod cache;
pub mod entities;
pub mod identity;

pub use cache::KeyValueCache;
pub use entities::{
    DeviationConsensus, Discrepancy, PriceData, ResponseOutcome, RoundProposal, Signature,
    SignatureWithSigner, Validator, ValidatorResponse,
};
pub use identity::{Address, ChainId, IdentityError};
