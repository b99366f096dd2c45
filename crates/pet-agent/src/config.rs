//! Pet tunables

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use pet_rl_agent::QLearningConfig;
use pet_rl_core::{RLError, Result, RewardWeights, StateBins};

/// Everything that shapes how a pet lives and learns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PetConfig {
    /// Hours that must accumulate before needs decay
    pub update_interval_hours: f64,
    /// Hunger gained per hour
    pub hunger_rate: f64,
    /// Energy lost per waking hour
    pub energy_rate_active: f64,
    /// Energy regained per sleeping hour
    pub energy_rate_sleep: f64,
    /// Hygiene lost per hour
    pub hygiene_rate: f64,

    /// Happiness lost per hour while very hungry
    pub happiness_hunger_penalty: f64,
    /// Happiness gained per hour while well fed
    pub happiness_hunger_bonus: f64,
    /// Happiness lost per hour while dirty
    pub happiness_hygiene_penalty: f64,
    /// Happiness lost per hour while exhausted
    pub happiness_energy_penalty: f64,

    /// Hunger above this counts as very hungry
    pub hunger_threshold: f64,
    /// Hunger below this counts as well fed
    pub well_fed_threshold: f64,
    /// Energy below this is too tired to play
    pub energy_threshold: f64,
    /// Hygiene below this counts as dirty
    pub hygiene_threshold: f64,
    /// A waking pet below this energy falls asleep after acting
    pub energy_sleep_threshold: f64,

    /// Energy restored by resting
    pub rest_energy_gain: f64,
    /// Health restored by resting
    pub rest_health_gain: f64,
    /// Energy spent exploring
    pub explore_energy_cost: f64,
    /// Intelligence gained exploring
    pub explore_intelligence_gain: f64,
    /// Base energy spent training
    pub train_energy_cost: f64,
    /// Minimum energy needed to train
    pub train_min_energy: f64,
    /// Skill gained per training
    pub train_skill_gain: f64,
    /// Experience gained per training
    pub train_experience_gain: f64,

    /// Memories kept per pet
    pub max_memories: usize,
    /// Journal records kept
    pub journal_capacity: usize,
    /// Decision confidences kept
    pub decision_history: usize,
    /// Minimum time between autonomous actions, in seconds
    pub autonomous_cooldown_secs: u64,

    /// Discretizer thresholds
    pub state_bins: StateBins,
    /// Reward shaping
    pub reward: RewardWeights,
    /// Learning engine
    pub learning: QLearningConfig,
}

impl Default for PetConfig {
    fn default() -> Self {
        Self {
            update_interval_hours: 1.0,
            hunger_rate: 3.0,
            energy_rate_active: 2.0,
            energy_rate_sleep: 15.0,
            hygiene_rate: 1.0,
            happiness_hunger_penalty: 0.5,
            happiness_hunger_bonus: 0.2,
            happiness_hygiene_penalty: 0.3,
            happiness_energy_penalty: 0.4,
            hunger_threshold: 70.0,
            well_fed_threshold: 30.0,
            energy_threshold: 20.0,
            hygiene_threshold: 30.0,
            energy_sleep_threshold: 50.0,
            rest_energy_gain: 20.0,
            rest_health_gain: 5.0,
            explore_energy_cost: 15.0,
            explore_intelligence_gain: 0.5,
            train_energy_cost: 20.0,
            train_min_energy: 30.0,
            train_skill_gain: 1.0,
            train_experience_gain: 15.0,
            max_memories: 50,
            journal_capacity: 200,
            decision_history: 50,
            autonomous_cooldown_secs: 30,
            state_bins: StateBins::default(),
            reward: RewardWeights::default(),
            learning: QLearningConfig::default(),
        }
    }
}

impl PetConfig {
    /// Load from a JSON file; omitted fields keep their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would break the simulation
    pub fn validate(&self) -> Result<()> {
        if !(self.update_interval_hours.is_finite() && self.update_interval_hours > 0.0) {
            return Err(RLError::Other(anyhow::anyhow!(
                "update_interval_hours must be positive, got {}",
                self.update_interval_hours
            )));
        }
        if !(0.0..=1.0).contains(&self.learning.discount) {
            return Err(RLError::Other(anyhow::anyhow!(
                "discount must be in [0, 1], got {}",
                self.learning.discount
            )));
        }
        if self.learning.batch_size > self.learning.buffer_capacity {
            return Err(RLError::Other(anyhow::anyhow!(
                "batch_size {} exceeds buffer_capacity {}",
                self.learning.batch_size,
                self.learning.buffer_capacity
            )));
        }
        self.state_bins.validate()
    }

    /// Autonomous action cooldown
    #[must_use]
    pub fn autonomous_cooldown(&self) -> Duration {
        Duration::from_secs(self.autonomous_cooldown_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "hunger_rate": 6.0, "learning": {{ "batch_size": 8 }}, "autonomous_cooldown_secs": 5 }}"#
        )
        .unwrap();

        let config = PetConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.hunger_rate, 6.0);
        assert_eq!(config.learning.batch_size, 8);
        assert_eq!(config.learning.buffer_capacity, 10_000);
        assert_eq!(config.autonomous_cooldown(), Duration::from_secs(5));
        assert_eq!(config.energy_rate_sleep, 15.0);
    }

    #[test]
    fn test_bad_files_are_errors() {
        assert!(matches!(
            PetConfig::from_json_file("/definitely/not/here.json"),
            Err(RLError::Io(_))
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ nope").unwrap();
        assert!(matches!(
            PetConfig::from_json_file(file.path()),
            Err(RLError::Serialization(_))
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "update_interval_hours": 0 }}"#).unwrap();
        assert!(PetConfig::from_json_file(file.path()).is_err());
    }

    #[test]
    fn test_batch_must_fit_buffer() {
        let mut config = PetConfig::default();
        config.learning.batch_size = 64;
        config.learning.buffer_capacity = 32;
        assert!(config.validate().is_err());

        config.learning.batch_size = 32;
        assert!(config.validate().is_ok());
    }
}
