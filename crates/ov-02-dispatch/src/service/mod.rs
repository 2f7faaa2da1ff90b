//! Dispatch services.

pub mod coordinator;
pub mod engine;

pub use coordinator::{ChainDispatchOutcome, DispatchCoordinator};
pub use engine::{DispatchConfirmation, DispatchEngine};
