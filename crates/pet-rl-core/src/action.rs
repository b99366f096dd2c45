//! Pet actions and the fixed action space

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::RLError;

/// Actions the learning agent may choose from.
///
/// The declaration order is the canonical order used for tie-breaking and
/// for iterating Q-table rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PetAction {
    /// Give the pet food
    Feed,
    /// Play a game
    Play,
    /// Go to sleep
    Sleep,
    /// Clean the pet
    Clean,
    /// Train a skill
    Train,
    /// Wander around
    Explore,
    /// Short rest, always possible
    Rest,
}

impl PetAction {
    /// Every action, in canonical order
    pub const ALL: [PetAction; 7] = [
        PetAction::Feed,
        PetAction::Play,
        PetAction::Sleep,
        PetAction::Clean,
        PetAction::Train,
        PetAction::Explore,
        PetAction::Rest,
    ];

    /// Stable lowercase name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Feed => "feed",
            Self::Play => "play",
            Self::Sleep => "sleep",
            Self::Clean => "clean",
            Self::Train => "train",
            Self::Explore => "explore",
            Self::Rest => "rest",
        }
    }

    /// Position in [`PetAction::ALL`]
    #[must_use]
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for PetAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PetAction {
    type Err = RLError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        PetAction::ALL
            .iter()
            .copied()
            .find(|action| action.as_str() == name)
            .ok_or_else(|| RLError::InvalidAction(s.to_string()))
    }
}

/// Trait for defining action spaces
pub trait ActionSpace: Send + Sync {
    /// Sample a random action from the space, `None` if the space is empty
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<PetAction>;

    /// Check if an action is valid within this space
    fn contains(&self, action: PetAction) -> bool;

    /// Number of actions in the space
    fn len(&self) -> usize;

    /// Whether the space has no actions at all
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Discrete set of pet actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetActionSpace {
    actions: Vec<PetAction>,
}

impl PetActionSpace {
    /// Create a space from an explicit list; duplicates are dropped, order is kept
    #[must_use]
    pub fn new(actions: impl IntoIterator<Item = PetAction>) -> Self {
        let mut unique = Vec::new();
        for action in actions {
            if !unique.contains(&action) {
                unique.push(action);
            }
        }
        Self { actions: unique }
    }

    /// Actions in this space, in insertion order
    #[must_use]
    pub fn actions(&self) -> &[PetAction] {
        &self.actions
    }
}

impl Default for PetActionSpace {
    fn default() -> Self {
        Self::new(PetAction::ALL)
    }
}

impl ActionSpace for PetActionSpace {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<PetAction> {
        self.actions.choose(rng).copied()
    }

    fn contains(&self, action: PetAction) -> bool {
        self.actions.contains(&action)
    }

    fn len(&self) -> usize {
        self.actions.len()
    }
}
