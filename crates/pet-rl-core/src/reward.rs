//! Reward signals and the need-shaped reward function

use serde::{Deserialize, Serialize};

use crate::{PetAction, PetAttributes};

/// Scalar reward. Unbounded in both directions.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Reward(pub f64);

impl Reward {
    /// Create a new reward
    #[must_use]
    pub fn new(value: f64) -> Self {
        Self(value)
    }

    /// Get the reward value
    #[must_use]
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl From<f64> for Reward {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl From<Reward> for f64 {
    fn from(reward: Reward) -> Self {
        reward.0
    }
}

impl std::ops::Add for Reward {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self(self.0 + other.0)
    }
}

impl std::ops::AddAssign for Reward {
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

/// Trait for reward functions over raw (not discretized) attributes
pub trait RewardFunction: Send + Sync {
    /// Compute reward for a before/action/after transition
    fn reward(&self, before: &PetAttributes, action: PetAction, after: &PetAttributes) -> Reward;
}

/// Weights and bonuses used by [`NeedShapedReward`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardWeights {
    /// Per point of hunger removed
    pub hunger: f64,
    /// Per point of energy gained
    pub energy: f64,
    /// Per point of hygiene gained
    pub hygiene: f64,
    /// Per point of happiness gained
    pub happiness: f64,
    /// Per point of health gained
    pub health: f64,
    /// Feed actually reduced hunger
    pub feed_bonus: f64,
    /// Sleep actually restored energy
    pub sleep_bonus: f64,
    /// Clean actually raised hygiene
    pub clean_bonus: f64,
    /// Play actually raised happiness
    pub play_bonus: f64,
    /// Flat bonus for any training attempt
    pub train_bonus: f64,
    /// Bonus when the resulting state is broadly healthy
    pub holistic_bonus: f64,
    /// Hunger must be below this for the holistic bonus
    pub holistic_hunger_below: f64,
    /// Energy must be above this for the holistic bonus
    pub holistic_energy_above: f64,
    /// Hygiene must be above this for the holistic bonus
    pub holistic_hygiene_above: f64,
}

impl Default for RewardWeights {
    fn default() -> Self {
        Self {
            hunger: 0.1,
            energy: 0.1,
            hygiene: 0.05,
            happiness: 0.15,
            health: 0.2,
            feed_bonus: 1.0,
            sleep_bonus: 1.5,
            clean_bonus: 0.8,
            play_bonus: 1.2,
            train_bonus: 0.5,
            holistic_bonus: 2.0,
            holistic_hunger_below: 30.0,
            holistic_energy_above: 70.0,
            holistic_hygiene_above: 70.0,
        }
    }
}

/// Additive shaping on need deltas, plus outcome bonuses
#[derive(Debug, Clone, Default)]
pub struct NeedShapedReward {
    weights: RewardWeights,
}

impl NeedShapedReward {
    /// Create with explicit weights
    #[must_use]
    pub fn new(weights: RewardWeights) -> Self {
        Self { weights }
    }

    /// Weights in use
    #[must_use]
    pub fn weights(&self) -> &RewardWeights {
        &self.weights
    }

    fn shaping(&self, before: &PetAttributes, after: &PetAttributes) -> f64 {
        let w = &self.weights;
        (before.hunger - after.hunger) * w.hunger
            + (after.energy - before.energy) * w.energy
            + (after.hygiene - before.hygiene) * w.hygiene
            + (after.happiness - before.happiness) * w.happiness
            + (after.health - before.health) * w.health
    }

    fn action_bonus(&self, before: &PetAttributes, action: PetAction, after: &PetAttributes) -> f64 {
        let w = &self.weights;
        match action {
            PetAction::Feed if after.hunger < before.hunger => w.feed_bonus,
            PetAction::Sleep if after.energy > before.energy => w.sleep_bonus,
            PetAction::Clean if after.hygiene > before.hygiene => w.clean_bonus,
            PetAction::Play if after.happiness > before.happiness => w.play_bonus,
            PetAction::Train => w.train_bonus,
            _ => 0.0,
        }
    }

    fn holistic(&self, after: &PetAttributes) -> f64 {
        let w = &self.weights;
        if after.hunger < w.holistic_hunger_below
            && after.energy > w.holistic_energy_above
            && after.hygiene > w.holistic_hygiene_above
        {
            w.holistic_bonus
        } else {
            0.0
        }
    }
}

impl RewardFunction for NeedShapedReward {
    fn reward(&self, before: &PetAttributes, action: PetAction, after: &PetAttributes) -> Reward {
        Reward(
            self.shaping(before, after)
                + self.action_bonus(before, action, after)
                + self.holistic(after),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn attrs(hunger: f64, energy: f64, hygiene: f64) -> PetAttributes {
        PetAttributes::new(100.0, hunger, energy, hygiene, 80.0)
    }

    #[test]
    fn test_shaping_directions() {
        let rf = NeedShapedReward::default();
        let before = attrs(50.0, 50.0, 50.0);

        let worse = PetAttributes { hunger: 60.0, ..before };
        assert_relative_eq!(rf.reward(&before, PetAction::Rest, &worse).value(), -1.0);

        let happier = PetAttributes { happiness: 90.0, ..before };
        assert_relative_eq!(rf.reward(&before, PetAction::Rest, &happier).value(), 1.5);
    }

    #[test]
    fn test_bonus_requires_effect() {
        let rf = NeedShapedReward::default();
        let before = attrs(50.0, 50.0, 50.0);
        assert_relative_eq!(rf.reward(&before, PetAction::Feed, &before).value(), 0.0);
        assert_relative_eq!(rf.reward(&before, PetAction::Train, &before).value(), 0.5);

        let rested = PetAttributes { energy: 60.0, ..before };
        assert_relative_eq!(rf.reward(&before, PetAction::Sleep, &rested).value(), 2.5);
    }

    #[test]
    fn test_holistic_bonus() {
        let rf = NeedShapedReward::default();
        let fine = attrs(10.0, 90.0, 90.0);
        assert_relative_eq!(rf.reward(&fine, PetAction::Rest, &fine).value(), 2.0);

        let edge = attrs(30.0, 90.0, 90.0);
        assert_relative_eq!(rf.reward(&edge, PetAction::Rest, &edge).value(), 0.0);
    }
}
