//! Consensus domain: pure types and algorithms, no I/O.

pub mod error;
pub mod leader;
pub mod optimizer;
pub mod participant;
pub mod resolver;
pub mod thresholds;
pub mod version;

pub use error::ConsensusError;
pub use leader::{LeaderSelector, LeaderSelectorV1, LeaderSelectorV2};
pub use optimizer::{ConsensusOptimizer, OptimizerSolution};
pub use participant::{ConsensusConstraints, ConsensusParticipant};
pub use resolver::{ConsensusResult, OptimizedResolver, SimpleResolver};
pub use thresholds::{ConsensusLayer, RequiredSignatures};
pub use version::VersionChecker;
