//! Ports (external collaborator interfaces).

pub mod outbound;

pub use outbound::{ProposalSource, ResponseSource, Signer, ThresholdContract, ValidatorRegistry};
