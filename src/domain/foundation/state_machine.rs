//! State machine trait for lifecycle enums.
//!
//! Gives lifecycle enums (currently the per-request [`RequestStage`]) a single
//! way to validate transitions.
//!
//! [`RequestStage`]: crate::domain::writing::RequestStage

use thiserror::Error;

/// Raised when a lifecycle attempts a transition its rules forbid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot transition from {from} to {to}")]
pub struct InvalidTransition {
    pub from: String,
    pub to: String,
}

/// Trait for enums that represent state machines.
///
/// # Example
///
/// ```ignore
/// let stage = RequestStage::Received.transition_to(RequestStage::Validated)?;
/// assert!(!stage.is_terminal());
/// ```
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Returns true if transition from self to target is valid.
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Returns all valid target states from current state.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Performs transition with validation, returning error if invalid.
    fn transition_to(&self, target: Self) -> Result<Self, InvalidTransition> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(InvalidTransition {
                from: format!("{:?}", self),
                to: format!("{:?}", target),
            })
        }
    }

    /// Checks if current state is terminal (no valid outgoing transitions).
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}
