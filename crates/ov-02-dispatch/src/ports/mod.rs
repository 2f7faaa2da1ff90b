//! Ports (external collaborator interfaces).

pub mod outbound;

pub use outbound::{ChainAdapter, ChainTransaction, FeedsContract, TxSubmission};
