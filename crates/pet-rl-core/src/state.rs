//! Discrete states and the bucketing discretizer

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Need, PetAttributes, RLError, Result};

/// Order in which needs appear in a [`DiscreteState`]
pub const STATE_NEED_ORDER: [Need; 5] = [
    Need::Hunger,
    Need::Energy,
    Need::Hygiene,
    Need::Happiness,
    Need::Health,
];

/// Binary conditions appended to the bucketed needs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateFlags {
    /// Pet is asleep
    pub sleeping: bool,
    /// Pet is sick
    pub sick: bool,
}

/// Bucketed pet state used as the Q-table key.
///
/// Equality and hashing cover the five bucket indices and, when present, both
/// flags. States built with and without flags never compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "Vec<u8>", try_from = "Vec<u8>")]
pub struct DiscreteState {
    levels: [u8; 5],
    flags: Option<(bool, bool)>,
}

impl DiscreteState {
    /// Build a state from raw bucket indices
    #[must_use]
    pub fn new(levels: [u8; 5], flags: Option<StateFlags>) -> Self {
        Self {
            levels,
            flags: flags.map(|f| (f.sleeping, f.sick)),
        }
    }

    /// Bucket indices in [`STATE_NEED_ORDER`]
    #[must_use]
    pub fn levels(&self) -> [u8; 5] {
        self.levels
    }

    /// Bucket index of one need
    #[must_use]
    pub fn level(&self, need: Need) -> u8 {
        let pos = STATE_NEED_ORDER
            .iter()
            .position(|n| *n == need)
            .unwrap_or_default();
        self.levels[pos]
    }

    /// Appended flags, if the discretizer included them
    #[must_use]
    pub fn flags(&self) -> Option<StateFlags> {
        self.flags.map(|(sleeping, sick)| StateFlags { sleeping, sick })
    }

    /// Flat tuple form: five levels followed by the 0/1 flags
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = self.levels.to_vec();
        if let Some((sleeping, sick)) = self.flags {
            out.push(u8::from(sleeping));
            out.push(u8::from(sick));
        }
        out
    }
}

impl From<DiscreteState> for Vec<u8> {
    fn from(state: DiscreteState) -> Self {
        state.to_vec()
    }
}

impl TryFrom<Vec<u8>> for DiscreteState {
    type Error = RLError;

    fn try_from(raw: Vec<u8>) -> Result<Self> {
        let flag = |v: u8| match v {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(RLError::InvalidState(format!("flag must be 0 or 1, got {other}"))),
        };

        match raw.len() {
            5 | 7 => {
                let mut levels = [0u8; 5];
                levels.copy_from_slice(&raw[..5]);
                let flags = if raw.len() == 7 {
                    Some((flag(raw[5])?, flag(raw[6])?))
                } else {
                    None
                };
                Ok(Self { levels, flags })
            }
            actual => Err(RLError::DimensionMismatch { expected: 7, actual }),
        }
    }
}

impl fmt::Display for DiscreteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.to_vec().iter().map(u8::to_string).collect();
        write!(f, "({})", parts.join(", "))
    }
}

/// Ascending bucket thresholds for every need
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateBins {
    /// Hunger thresholds
    pub hunger: Vec<f64>,
    /// Energy thresholds
    pub energy: Vec<f64>,
    /// Hygiene thresholds
    pub hygiene: Vec<f64>,
    /// Happiness thresholds
    pub happiness: Vec<f64>,
    /// Health thresholds
    pub health: Vec<f64>,
    /// Append the sleeping and sick flags to each state
    pub include_flags: bool,
}

impl Default for StateBins {
    fn default() -> Self {
        let bins = vec![0.0, 30.0, 60.0, 100.0];
        Self {
            hunger: bins.clone(),
            energy: bins.clone(),
            hygiene: bins.clone(),
            happiness: bins.clone(),
            health: bins,
            include_flags: true,
        }
    }
}

impl StateBins {
    /// Thresholds for one need
    #[must_use]
    pub fn for_need(&self, need: Need) -> &[f64] {
        match need {
            Need::Hunger => &self.hunger,
            Need::Energy => &self.energy,
            Need::Hygiene => &self.hygiene,
            Need::Happiness => &self.happiness,
            Need::Health => &self.health,
        }
    }

    /// Check that every list is non-empty, ascending and fits a `u8` index
    pub fn validate(&self) -> Result<()> {
        for need in STATE_NEED_ORDER {
            let bins = self.for_need(need);
            if bins.is_empty() || bins.len() > usize::from(u8::MAX) + 1 {
                return Err(RLError::InvalidState(format!(
                    "{need} needs between 1 and 256 thresholds, got {}",
                    bins.len()
                )));
            }
            if bins.windows(2).any(|w| w[0] > w[1]) || bins.iter().any(|b| b.is_nan()) {
                return Err(RLError::InvalidState(format!(
                    "{need} thresholds must be ascending"
                )));
            }
        }
        Ok(())
    }
}

/// Maps continuous attributes to a [`DiscreteState`]
#[derive(Debug, Clone, Default)]
pub struct StateDiscretizer {
    bins: StateBins,
}

impl StateDiscretizer {
    /// Create a discretizer from validated thresholds
    pub fn new(bins: StateBins) -> Result<Self> {
        bins.validate()?;
        Ok(Self { bins })
    }

    /// Thresholds in use
    #[must_use]
    pub fn bins(&self) -> &StateBins {
        &self.bins
    }

    /// Number of buckets for a need
    #[must_use]
    pub fn bucket_count(&self, need: Need) -> usize {
        self.bins.for_need(need).len()
    }

    /// Bucket every need. Pure; values above the last threshold, and NaN,
    /// land in the top bucket.
    #[must_use]
    pub fn discretize(&self, attributes: &PetAttributes, flags: StateFlags) -> DiscreteState {
        let mut levels = [0u8; 5];
        for (slot, need) in levels.iter_mut().zip(STATE_NEED_ORDER) {
            *slot = bucket(attributes.get(need), self.bins.for_need(need));
        }
        DiscreteState::new(levels, self.bins.include_flags.then_some(flags))
    }
}

/// Index of the first threshold `>= value`, saturating at the last index
#[must_use]
pub fn bucket(value: f64, bins: &[f64]) -> u8 {
    let last = bins.len().saturating_sub(1);
    let idx = bins.iter().position(|b| value <= *b).unwrap_or(last);
    u8::try_from(idx).unwrap_or(u8::MAX)
}
