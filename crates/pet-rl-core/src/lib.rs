//! Core reinforcement learning types for the virtual pet agent
//!
//! This crate provides the actions, need attributes, discrete states,
//! rewards and the trait seams shared by the learning and pet crates.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod action;
pub mod attributes;
pub mod error;
pub mod persist;
pub mod policy;
pub mod reward;
pub mod state;
pub mod trajectory;

// Re-export core traits and types
pub use action::{ActionSpace, PetAction, PetActionSpace};
pub use attributes::{clamp_need, Need, PetAttributes, NEED_MAX, NEED_MIN};
pub use error::{RLError, Result};
pub use persist::Persist;
pub use policy::Policy;
pub use reward::{NeedShapedReward, Reward, RewardFunction, RewardWeights};
pub use state::{DiscreteState, StateBins, StateDiscretizer, StateFlags, STATE_NEED_ORDER};
pub use trajectory::Transition;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        ActionSpace, DiscreteState, Need, PetAction, PetAttributes, Persist, Policy, Result,
        Reward, RewardFunction, StateDiscretizer, StateFlags, Transition,
    };
}
