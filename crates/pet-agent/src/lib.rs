//! Virtual pets that look after themselves
//!
//! This crate provides:
//! - The pet entity and its action methods
//! - A behavior tree and a rule-based decision system
//! - A behavior journal
//! - The intelligent-pet loop tying a pet to the learning engine
//! - Pet save files

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod agent;
pub mod behavior;
pub mod config;
pub mod decision;
pub mod journal;
pub mod pet;
pub mod store;

pub use agent::{
    learning_path, AutonomousStep, IntelligentPet, IntelligentStatus, LearningProgress,
    TickReport, UserInteraction,
};
pub use behavior::{BehaviorTree, Condition, Node, Status, TreeContext};
pub use config::PetConfig;
pub use decision::{ActionPrediction, DecisionSystem, NeedForecast, NeedPriorities, Severity};
pub use journal::{ActionSource, BehaviorJournal, JournalRecord};
pub use pet::{ActionOutcome, CleanKind, FoodKind, GameKind, LifeStage, Mood, Pet, Skill, Skills, Trait};
pub use store::{load_pet, save_pet};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{BehaviorTree, IntelligentPet, Pet, PetConfig, UserInteraction};
    pub use pet_rl_agent::prelude::*;
}
