//! Dispatch job state machine.
//!
//! One job tracks one submission attempt for one chain. Transitions are
//! strictly sequential within a chain because nonce ordering matters; the
//! only loop is the single Submitting → Building retry after a nonce
//! conflict.

use super::error::DispatchError;
use super::gas::GasMetrics;
use serde::{Deserialize, Serialize};
use shared_types::ChainId;
use uuid::Uuid;

/// Dispatch state machine states.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispatchState {
    #[default]
    Idle,
    GasResolution,
    Building,
    Submitting,
    AwaitingConfirmation,
    Cancelling,
    Confirmed,
    Failed,
}

impl DispatchState {
    /// Check if a transition is valid.
    pub fn can_transition_to(&self, next: DispatchState) -> bool {
        match (self, next) {
            (Self::Idle, Self::GasResolution) => true,
            (Self::GasResolution, Self::Building) => true,
            (Self::Building, Self::Submitting) => true,
            (Self::Submitting, Self::AwaitingConfirmation) => true,
            // Nonce conflict: refetch and rebuild once.
            (Self::Submitting, Self::Building) => true,
            (Self::AwaitingConfirmation, Self::Confirmed) => true,
            (Self::AwaitingConfirmation, Self::Cancelling) => true,
            (Self::Cancelling, Self::Failed) => true,
            // Any non-terminal state can fail.
            (
                Self::GasResolution | Self::Building | Self::Submitting | Self::AwaitingConfirmation,
                Self::Failed,
            ) => true,
            _ => false,
        }
    }

    /// Check if terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Failed)
    }
}

/// One submission attempt for one chain.
///
/// Destroyed once the transaction is confirmed; a retried round gets a
/// fresh job.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DispatchJob {
    pub id: Uuid,
    pub chain_id: ChainId,
    pub nonce: Option<u64>,
    pub gas: Option<GasMetrics>,
    pub attempt: u32,
    pub state: DispatchState,
}

impl DispatchJob {
    pub fn new(chain_id: ChainId) -> Self {
        Self {
            id: Uuid::new_v4(),
            chain_id,
            nonce: None,
            gas: None,
            attempt: 0,
            state: DispatchState::Idle,
        }
    }

    /// Transition to a new state, rejecting illegal jumps.
    pub fn transition_to(&mut self, next: DispatchState) -> Result<(), DispatchError> {
        if !self.state.can_transition_to(next) {
            return Err(DispatchError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }
}
