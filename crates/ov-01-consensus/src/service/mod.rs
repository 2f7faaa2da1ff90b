//! Consensus services: stateful components over the ports.

pub mod thresholds;
pub mod validator_set;

pub use thresholds::{RequiredSignaturesResolver, ThresholdContracts};
pub use validator_set::ValidatorSetFilter;
