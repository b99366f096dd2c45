//! Learning machinery for the virtual pet agent
//!
//! This crate provides:
//! - Q-tables keyed by discrete pet states
//! - A prioritized replay buffer
//! - A double Q-learning engine
//! - A random baseline policy

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod buffer;
pub mod q_table;
pub mod qlearning;
pub mod random;
pub mod utils;

pub use buffer::{PrioritizedReplayBuffer, SampledBatch, StoredTransition};
pub use q_table::{QTable, QTableRow};
pub use qlearning::{LearningSnapshot, LearningStats, QLearningConfig, QLearningEngine};
pub use random::RandomPolicy;
pub use utils::{ExponentialDecay, LinearRamp, RunningReward, Schedule};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{QLearningConfig, QLearningEngine, QTable, RandomPolicy};
    pub use pet_rl_core::prelude::*;
}
