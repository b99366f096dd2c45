//! Continuous need attributes read by the learning core

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lower bound of every need
pub const NEED_MIN: f64 = 0.0;
/// Upper bound of every need
pub const NEED_MAX: f64 = 100.0;

/// One tracked need dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Need {
    /// Overall health, higher is better
    Health,
    /// Hunger, higher is worse
    Hunger,
    /// Energy, higher is better
    Energy,
    /// Cleanliness, higher is better
    Hygiene,
    /// Happiness, higher is better
    Happiness,
}

impl Need {
    /// Every need, in the fixed priority order used for tie-breaking
    pub const ALL: [Need; 5] = [
        Need::Health,
        Need::Hunger,
        Need::Energy,
        Need::Hygiene,
        Need::Happiness,
    ];

    /// Stable lowercase name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Health => "health",
            Self::Hunger => "hunger",
            Self::Energy => "energy",
            Self::Hygiene => "hygiene",
            Self::Happiness => "happiness",
        }
    }
}

impl fmt::Display for Need {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of the five needs of a pet.
///
/// Values are conceptually in `[0, 100]`, but nothing here enforces it; use
/// [`PetAttributes::clamped`] when a bounded copy is required.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PetAttributes {
    /// Health
    pub health: f64,
    /// Hunger
    pub hunger: f64,
    /// Energy
    pub energy: f64,
    /// Hygiene
    pub hygiene: f64,
    /// Happiness
    pub happiness: f64,
}

impl Default for PetAttributes {
    fn default() -> Self {
        Self {
            health: 100.0,
            hunger: 0.0,
            energy: 100.0,
            hygiene: 100.0,
            happiness: 100.0,
        }
    }
}

impl PetAttributes {
    /// Create a snapshot from explicit values
    #[must_use]
    pub fn new(health: f64, hunger: f64, energy: f64, hygiene: f64, happiness: f64) -> Self {
        Self {
            health,
            hunger,
            energy,
            hygiene,
            happiness,
        }
    }

    /// Read one need
    #[must_use]
    pub fn get(&self, need: Need) -> f64 {
        match need {
            Need::Health => self.health,
            Need::Hunger => self.hunger,
            Need::Energy => self.energy,
            Need::Hygiene => self.hygiene,
            Need::Happiness => self.happiness,
        }
    }

    /// Overwrite one need without clamping
    pub fn set(&mut self, need: Need, value: f64) {
        match need {
            Need::Health => self.health = value,
            Need::Hunger => self.hunger = value,
            Need::Energy => self.energy = value,
            Need::Hygiene => self.hygiene = value,
            Need::Happiness => self.happiness = value,
        }
    }

    /// Copy with every need clamped into `[0, 100]`; NaN becomes 0
    #[must_use]
    pub fn clamped(&self) -> Self {
        let mut out = *self;
        for need in Need::ALL {
            out.set(need, clamp_need(self.get(need)));
        }
        out
    }
}

/// Clamp a single need value into `[0, 100]`
#[must_use]
pub fn clamp_need(value: f64) -> f64 {
    if value.is_nan() {
        NEED_MIN
    } else {
        value.clamp(NEED_MIN, NEED_MAX)
    }
}
