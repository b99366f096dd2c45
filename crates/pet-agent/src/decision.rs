//! Rule-based need evaluation
//!
//! Scores each need with threshold bands and maps the most urgent one to a
//! canonical action. Also forecasts needs and predicts the next action for
//! status reports.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

use pet_rl_core::{Need, PetAction, PetAttributes, StateFlags};

use crate::pet::Trait;

/// Highest need priority
pub const MAX_PRIORITY: u8 = 5;

/// Actions picked when nothing is urgent
pub const IDLE_ACTIONS: [PetAction; 2] = [PetAction::Play, PetAction::Explore];

/// Priority score per need, listed in tie-break order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeedPriorities(pub Vec<(Need, u8)>);

impl NeedPriorities {
    /// Score every need
    #[must_use]
    pub fn evaluate(attributes: &PetAttributes, flags: StateFlags) -> Self {
        let a = attributes;
        let mut health = band(a.health < 30.0, 5, a.health < 60.0, 3);
        let hunger = band(a.hunger > 70.0, 5, a.hunger > 40.0, 3);
        let mut energy = band(a.energy < 30.0, 4, a.energy < 60.0, 2);
        let hygiene = band(a.hygiene < 30.0, 3, a.hygiene < 60.0, 1);
        let happiness = band(a.happiness < 30.0, 2, a.happiness < 60.0, 1);

        if flags.sick {
            health = MAX_PRIORITY;
        }
        if flags.sleeping {
            energy = 0;
        }

        Self(vec![
            (Need::Health, health),
            (Need::Hunger, hunger),
            (Need::Energy, energy),
            (Need::Hygiene, hygiene),
            (Need::Happiness, happiness),
        ])
    }

    /// Priority of one need
    #[must_use]
    pub fn get(&self, need: Need) -> u8 {
        self.0
            .iter()
            .find(|(n, _)| *n == need)
            .map_or(0, |(_, p)| *p)
    }

    /// Highest-scoring need, first in order on ties; `None` if all are zero
    #[must_use]
    pub fn most_urgent(&self) -> Option<Need> {
        let mut best: Option<(Need, u8)> = None;
        for &(need, priority) in &self.0 {
            if priority > best.map_or(0, |(_, p)| p) {
                best = Some((need, priority));
            }
        }
        best.map(|(need, _)| need)
    }
}

fn band(urgent: bool, high: u8, moderate: bool, low: u8) -> u8 {
    if urgent {
        high
    } else if moderate {
        low
    } else {
        0
    }
}

/// Canonical action addressing a need
#[must_use]
pub fn action_for(need: Need) -> PetAction {
    match need {
        Need::Health => PetAction::Rest,
        Need::Hunger => PetAction::Feed,
        Need::Energy => PetAction::Sleep,
        Need::Hygiene => PetAction::Clean,
        Need::Happiness => PetAction::Play,
    }
}

/// How pressing a forecast need is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Level is high (bad for hunger)
    High,
    /// Level is getting there
    Medium,
    /// Level is low (bad for the others)
    Low,
}

/// One forecast need
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeedForecast {
    /// Need in question
    pub need: Need,
    /// Band it falls in
    pub severity: Severity,
    /// Urgency weight in `[0, 1]`
    pub weight: f64,
}

/// Predicted next action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionPrediction {
    /// Best-valued action
    pub action: PetAction,
    /// Share of the best value in the total
    pub confidence: f64,
    /// Human-readable reason
    pub reason: String,
}

/// Need evaluator with a short memory of its own confidence
pub struct DecisionSystem {
    history: VecDeque<f64>,
    capacity: usize,
}

impl DecisionSystem {
    /// Create a system remembering `capacity` predictions
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            history: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Action for the most urgent need, or a random idle action when
    /// nothing is urgent. Never returns nothing.
    pub fn decide<R: Rng + ?Sized>(
        &self,
        attributes: &PetAttributes,
        flags: StateFlags,
        rng: &mut R,
    ) -> PetAction {
        match NeedPriorities::evaluate(attributes, flags).most_urgent() {
            Some(need) => action_for(need),
            None => IDLE_ACTIONS
                .choose(rng)
                .copied()
                .unwrap_or(PetAction::Play),
        }
    }

    /// Needs that are becoming pressing, most urgent first
    #[must_use]
    pub fn predict_needs(&self, attributes: &PetAttributes) -> Vec<NeedForecast> {
        let a = attributes;
        let mut forecasts = Vec::new();
        let mut push = |need, severity, weight| {
            forecasts.push(NeedForecast {
                need,
                severity,
                weight,
            });
        };

        if a.hunger > 70.0 {
            push(Need::Hunger, Severity::High, 0.9);
        } else if a.hunger > 40.0 {
            push(Need::Hunger, Severity::Medium, 0.6);
        }
        if a.energy < 30.0 {
            push(Need::Energy, Severity::Low, 0.8);
        } else if a.energy < 60.0 {
            push(Need::Energy, Severity::Medium, 0.5);
        }
        if a.hygiene < 30.0 {
            push(Need::Hygiene, Severity::Low, 0.7);
        } else if a.hygiene < 60.0 {
            push(Need::Hygiene, Severity::Medium, 0.4);
        }
        if a.happiness < 30.0 {
            push(Need::Happiness, Severity::Low, 0.6);
        }

        forecasts.sort_by(|x, y| y.weight.total_cmp(&x.weight));
        forecasts
    }

    /// Value of each trait-sensitive action
    #[must_use]
    pub fn evaluate_actions(
        &self,
        attributes: &PetAttributes,
        traits: &BTreeMap<Trait, f64>,
    ) -> Vec<(PetAction, f64)> {
        let a = attributes;
        let mut values = vec![
            (PetAction::Feed, a.hunger * 0.8),
            (PetAction::Play, a.energy * 0.6),
            (PetAction::Sleep, (100.0 - a.energy) * 0.7),
            (PetAction::Clean, (100.0 - a.hygiene) * 0.5),
            (PetAction::Train, a.energy * 0.4),
        ];

        for (t, strength) in traits {
            let favored = match t {
                Trait::Playful => PetAction::Play,
                Trait::Lazy => PetAction::Sleep,
                Trait::Hungry => PetAction::Feed,
                Trait::Clean => PetAction::Clean,
                _ => continue,
            };
            if let Some(entry) = values.iter_mut().find(|(action, _)| *action == favored) {
                entry.1 += strength * 20.0;
            }
        }
        values
    }

    /// Predict the next action and remember the confidence
    pub fn predict_next_action(
        &mut self,
        attributes: &PetAttributes,
        traits: &BTreeMap<Trait, f64>,
    ) -> Option<ActionPrediction> {
        let values = self.evaluate_actions(attributes, traits);
        let total: f64 = values.iter().map(|(_, v)| v).sum();
        let (action, best) = values
            .into_iter()
            .fold(None, |acc: Option<(PetAction, f64)>, (action, value)| match acc {
                Some((_, v)) if v >= value => acc,
                _ => Some((action, value)),
            })?;

        let confidence = if total > 0.0 { best / total } else { 0.0 };
        self.history.push_back(confidence);
        while self.history.len() > self.capacity {
            self.history.pop_front();
        }

        Some(ActionPrediction {
            action,
            confidence,
            reason: format!("{action} scores {best:.1} given current needs"),
        })
    }

    /// Mean confidence of recent predictions, 0.5 before any
    #[must_use]
    pub fn confidence(&self) -> f64 {
        if self.history.is_empty() {
            return 0.5;
        }
        #[allow(clippy::cast_precision_loss)]
        let n = self.history.len() as f64;
        self.history.iter().sum::<f64>() / n
    }
}

impl Default for DecisionSystem {
    fn default() -> Self {
        Self::new(50)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn attrs(health: f64, hunger: f64, energy: f64, hygiene: f64, happiness: f64) -> PetAttributes {
        PetAttributes::new(health, hunger, energy, hygiene, happiness)
    }

    #[test]
    fn test_most_urgent_need_wins() {
        let system = DecisionSystem::default();
        let mut rng = StdRng::seed_from_u64(1);
        let a = attrs(100.0, 85.0, 50.0, 90.0, 90.0);
        assert_eq!(system.decide(&a, StateFlags::default(), &mut rng), PetAction::Feed);
    }

    #[test]
    fn test_ties_follow_fixed_order() {
        let p = NeedPriorities::evaluate(&attrs(20.0, 80.0, 100.0, 100.0, 100.0), StateFlags::default());
        assert_eq!(p.get(Need::Health), 5);
        assert_eq!(p.get(Need::Hunger), 5);
        assert_eq!(p.most_urgent(), Some(Need::Health));
    }

    #[test]
    fn test_overrides() {
        let a = attrs(100.0, 0.0, 10.0, 100.0, 100.0);
        let sick = StateFlags {
            sleeping: false,
            sick: true,
        };
        assert_eq!(NeedPriorities::evaluate(&a, sick).most_urgent(), Some(Need::Health));

        let sleeping = StateFlags {
            sleeping: true,
            sick: false,
        };
        let p = NeedPriorities::evaluate(&a, sleeping);
        assert_eq!(p.get(Need::Energy), 0);
        assert_eq!(p.most_urgent(), None);
    }

    #[test]
    fn test_satisfied_pet_idles() {
        let system = DecisionSystem::default();
        let mut rng = StdRng::seed_from_u64(9);
        let a = attrs(100.0, 0.0, 100.0, 100.0, 100.0);
        for _ in 0..20 {
            assert!(IDLE_ACTIONS.contains(&system.decide(&a, StateFlags::default(), &mut rng)));
        }
    }

    #[test]
    fn test_predict_needs_sorted() {
        let system = DecisionSystem::default();
        let forecasts = system.predict_needs(&attrs(100.0, 50.0, 20.0, 50.0, 10.0));
        let needs: Vec<Need> = forecasts.iter().map(|f| f.need).collect();
        assert_eq!(
            needs,
            vec![Need::Energy, Need::Hunger, Need::Happiness, Need::Hygiene]
        );
        assert_eq!(forecasts[0].severity, Severity::Low);
    }

    #[test]
    fn test_prediction_confidence() {
        let mut system = DecisionSystem::new(2);
        assert_relative_eq!(system.confidence(), 0.5);

        let mut traits = BTreeMap::new();
        traits.insert(Trait::Hungry, 1.0);
        let a = attrs(100.0, 100.0, 0.0, 100.0, 100.0);
        let prediction = system.predict_next_action(&a, &traits).unwrap();
        assert_eq!(prediction.action, PetAction::Feed);
        assert_relative_eq!(prediction.confidence, 100.0 / 170.0, epsilon = 1e-12);

        system.predict_next_action(&a, &traits);
        system.predict_next_action(&a, &BTreeMap::new());
        assert_relative_eq!(system.confidence(), (100.0 / 170.0 + 80.0 / 150.0) / 2.0, epsilon = 1e-12);
    }
}
