//! Transitions between discrete states

use serde::{Deserialize, Serialize};

use crate::{DiscreteState, PetAction};

/// A single (state, action, reward, next_state, done) tuple
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    /// State the action was taken in
    pub state: DiscreteState,
    /// Action taken
    pub action: PetAction,
    /// Reward received
    pub reward: f64,
    /// Resulting state
    pub next_state: DiscreteState,
    /// Whether the episode ended
    pub done: bool,
}

impl Transition {
    /// Create a new transition
    #[must_use]
    pub fn new(
        state: DiscreteState,
        action: PetAction,
        reward: f64,
        next_state: DiscreteState,
        done: bool,
    ) -> Self {
        Self {
            state,
            action,
            reward,
            next_state,
            done,
        }
    }
}
