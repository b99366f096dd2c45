//! Double Q-learning with prioritized experience replay

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

use pet_rl_core::{
    ActionSpace, DiscreteState, PetAction, PetActionSpace, Persist, Policy, RLError, Result,
    Transition,
};

use crate::buffer::{PrioritizedReplayBuffer, StoredTransition};
use crate::q_table::QTable;
use crate::utils::{ExponentialDecay, LinearRamp, RunningReward, Schedule};

/// Learning engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QLearningConfig {
    /// Step size
    pub learning_rate: f64,
    /// Discount factor (gamma)
    pub discount: f64,
    /// Initial exploration rate
    pub exploration_start: f64,
    /// Multiplicative decay per learning step
    pub exploration_decay: f64,
    /// Exploration floor
    pub exploration_min: f64,
    /// Replay batch size
    pub batch_size: usize,
    /// Replay buffer capacity
    pub buffer_capacity: usize,
    /// Priority exponent
    pub alpha: f64,
    /// Initial importance sampling exponent
    pub beta: f64,
    /// Beta increase per learning step
    pub beta_increment: f64,
    /// Added to |TD error| so no priority is zero
    pub priority_epsilon: f64,
    /// Learning steps between Q-table compressions, 0 disables
    pub cleanup_interval: u64,
    /// Entries with |Q| at or below this are pruned
    pub prune_threshold: f64,
    /// Actions the engine may choose
    pub actions: Vec<PetAction>,
    /// When false the engine declines every action and does not learn
    pub enabled: bool,
    /// Seed for reproducible runs
    pub seed: Option<u64>,
}

impl Default for QLearningConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            discount: 0.9,
            exploration_start: 1.0,
            exploration_decay: 0.995,
            exploration_min: 0.1,
            batch_size: 32,
            buffer_capacity: 10_000,
            alpha: 0.6,
            beta: 0.4,
            beta_increment: 0.001,
            priority_epsilon: 1e-6,
            cleanup_interval: 1000,
            prune_threshold: 0.1,
            actions: PetAction::ALL.to_vec(),
            enabled: true,
            seed: None,
        }
    }
}

/// Summary of the engine's learning state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningStats {
    /// Current exploration rate
    pub exploration_rate: f64,
    /// Current importance sampling exponent
    pub beta: f64,
    /// Learning steps taken
    pub learning_steps: u64,
    /// Sum of observed rewards
    pub total_reward: f64,
    /// Mean observed reward
    pub average_reward: f64,
    /// States in table A
    pub states_a: usize,
    /// States in table B
    pub states_b: usize,
    /// Entries across both tables
    pub entries: usize,
    /// Transitions held for replay
    pub buffer_len: usize,
}

/// Persisted form of the engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningSnapshot {
    /// Checkpoint id
    pub id: Uuid,
    /// When the checkpoint was written
    pub saved_at: DateTime<Utc>,
    /// Table A
    pub q_table_a: QTable,
    /// Table B
    pub q_table_b: QTable,
    /// Learning steps taken
    pub learning_steps: u64,
    /// Sum of observed rewards
    pub total_reward: f64,
    /// Mean observed reward
    pub average_reward: f64,
    /// Exploration rate at save time
    pub exploration_rate: f64,
    /// Importance sampling exponent at save time
    #[serde(default)]
    pub beta: Option<f64>,
    /// Replay contents
    #[serde(default)]
    pub replay: Vec<StoredTransition>,
}

impl LearningSnapshot {
    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.exploration_rate) {
            return Err(RLError::Persistence(format!(
                "exploration rate {} outside [0, 1]",
                self.exploration_rate
            )));
        }
        if !self.total_reward.is_finite() {
            return Err(RLError::Persistence("total reward is not finite".into()));
        }
        Ok(())
    }
}

/// Tabular double-Q learner
pub struct QLearningEngine {
    config: QLearningConfig,
    actions: PetActionSpace,
    table_a: QTable,
    table_b: QTable,
    buffer: PrioritizedReplayBuffer,
    exploration: ExponentialDecay,
    beta: LinearRamp,
    rewards: RunningReward,
    steps: u64,
    last_checkpoint: Option<Uuid>,
    rng: StdRng,
}

impl QLearningEngine {
    /// Create a fresh engine
    #[must_use]
    pub fn new(config: QLearningConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            actions: PetActionSpace::new(config.actions.iter().copied()),
            table_a: QTable::new(),
            table_b: QTable::new(),
            buffer: PrioritizedReplayBuffer::new(config.buffer_capacity),
            exploration: ExponentialDecay::new(
                config.exploration_start,
                config.exploration_decay,
                config.exploration_min,
            ),
            beta: LinearRamp::new(config.beta, config.beta_increment, 1.0),
            rewards: RunningReward::default(),
            steps: 0,
            last_checkpoint: None,
            rng,
            config,
        }
    }

    /// Configuration in use
    #[must_use]
    pub fn config(&self) -> &QLearningConfig {
        &self.config
    }

    /// Whether the engine will propose actions
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.config.enabled && !self.actions.is_empty()
    }

    /// Epsilon-greedy choice over table A. `None` when the engine is
    /// disabled or has no actions.
    pub fn choose_action(&mut self, state: &DiscreteState) -> Option<PetAction> {
        if !self.is_active() {
            return None;
        }
        if self.rng.gen::<f64>() < self.exploration.current() {
            return self.actions.sample(&mut self.rng);
        }
        self.table_a
            .best_action(state, self.actions.actions())
            .or_else(|| self.actions.sample(&mut self.rng))
    }

    /// Record a transition and, once a full batch is stored, replay a
    /// prioritized batch through both tables.
    pub fn learn(
        &mut self,
        state: DiscreteState,
        action: PetAction,
        reward: f64,
        next_state: DiscreteState,
        done: bool,
    ) {
        self.learn_transition(Transition::new(state, action, reward, next_state, done));
    }

    /// [`learn`](Self::learn) taking a whole transition
    pub fn learn_transition(&mut self, transition: Transition) {
        if !self.config.enabled {
            return;
        }

        let reward = transition.reward;
        let priority = self.priority(&transition);
        self.buffer.push(transition, priority);

        if self.config.batch_size > 0 && self.buffer.len() >= self.config.batch_size {
            self.replay_batch();
        }

        self.steps += 1;
        self.rewards.update(reward);
        self.exploration.advance();
        self.beta.advance();

        if self.config.cleanup_interval > 0 && self.steps % self.config.cleanup_interval == 0 {
            let removed = self.table_a.compress(self.config.prune_threshold)
                + self.table_b.compress(self.config.prune_threshold);
            debug!(
                steps = self.steps,
                removed,
                states = self.table_a.len(),
                "Compressed Q-tables"
            );
        }
    }

    /// `(|TD error| + epsilon)^alpha` against the current tables
    #[must_use]
    pub fn priority(&self, transition: &Transition) -> f64 {
        let actions = self.actions.actions();
        let bootstrap = if transition.done {
            0.0
        } else {
            self.table_b
                .max_value(&transition.next_state, actions)
                .unwrap_or(0.0)
        };
        let td_error = transition.reward + self.config.discount * bootstrap
            - self.table_a.get(&transition.state, transition.action);
        (td_error.abs() + self.config.priority_epsilon).powf(self.config.alpha)
    }

    fn replay_batch(&mut self) {
        let beta = self.beta.current();
        let Some(batch) = self
            .buffer
            .sample(self.config.batch_size, beta, &mut self.rng)
        else {
            return;
        };

        for ((transition, weight), index) in batch
            .transitions
            .iter()
            .zip(&batch.weights)
            .zip(&batch.indices)
        {
            self.double_q_update(transition, *weight);
            let priority = self.priority(transition);
            self.buffer.update_priority(*index, priority);
        }
    }

    /// Update both tables from one sample. Each table bootstraps from the
    /// other at its own greedy next action.
    fn double_q_update(&mut self, t: &Transition, weight: f64) {
        let actions = self.actions.actions();
        let gamma = self.config.discount;

        let (target_a, target_b) = if t.done {
            (t.reward, t.reward)
        } else {
            let a = self
                .table_a
                .greedy_action(&t.next_state, actions)
                .map_or(t.reward, |next| {
                    t.reward + gamma * self.table_b.get(&t.next_state, next)
                });
            let b = self
                .table_b
                .greedy_action(&t.next_state, actions)
                .map_or(t.reward, |next| {
                    t.reward + gamma * self.table_a.get(&t.next_state, next)
                });
            (a, b)
        };

        let step = self.config.learning_rate * weight;
        let current_a = self.table_a.get(&t.state, t.action);
        let current_b = self.table_b.get(&t.state, t.action);
        self.table_a
            .set(t.state, t.action, current_a + step * (target_a - current_a));
        self.table_b
            .set(t.state, t.action, current_b + step * (target_b - current_b));
    }

    /// Current exploration rate
    #[must_use]
    pub fn exploration_rate(&self) -> f64 {
        self.exploration.current()
    }

    /// Current importance sampling exponent
    #[must_use]
    pub fn beta(&self) -> f64 {
        self.beta.current()
    }

    /// Learning steps taken
    #[must_use]
    pub fn learning_steps(&self) -> u64 {
        self.steps
    }

    /// Mean observed reward
    #[must_use]
    pub fn average_reward(&self) -> f64 {
        self.rewards.mean()
    }

    /// Table A
    #[must_use]
    pub fn table_a(&self) -> &QTable {
        &self.table_a
    }

    /// Table B
    #[must_use]
    pub fn table_b(&self) -> &QTable {
        &self.table_b
    }

    /// Replay buffer
    #[must_use]
    pub fn buffer(&self) -> &PrioritizedReplayBuffer {
        &self.buffer
    }

    /// Mutable replay buffer access
    pub fn buffer_mut(&mut self) -> &mut PrioritizedReplayBuffer {
        &mut self.buffer
    }

    /// Id of the checkpoint last saved or loaded
    #[must_use]
    pub fn last_checkpoint(&self) -> Option<Uuid> {
        self.last_checkpoint
    }

    /// Summary of learning progress
    #[must_use]
    pub fn stats(&self) -> LearningStats {
        LearningStats {
            exploration_rate: self.exploration.current(),
            beta: self.beta.current(),
            learning_steps: self.steps,
            total_reward: self.rewards.total,
            average_reward: self.rewards.mean(),
            states_a: self.table_a.len(),
            states_b: self.table_b.len(),
            entries: self.table_a.entry_count() + self.table_b.entry_count(),
            buffer_len: self.buffer.len(),
        }
    }

    /// Capture the persisted state under a fresh checkpoint id
    #[must_use]
    pub fn snapshot(&self) -> LearningSnapshot {
        LearningSnapshot {
            id: Uuid::new_v4(),
            saved_at: Utc::now(),
            q_table_a: self.table_a.clone(),
            q_table_b: self.table_b.clone(),
            learning_steps: self.steps,
            total_reward: self.rewards.total,
            average_reward: self.rewards.mean(),
            exploration_rate: self.exploration.current(),
            beta: Some(self.beta.current()),
            replay: self.buffer.to_stored(),
        }
    }

    /// Replace the learning state with a validated snapshot
    pub fn restore(&mut self, snapshot: LearningSnapshot) -> Result<()> {
        snapshot.validate()?;
        self.table_a = snapshot.q_table_a;
        self.table_b = snapshot.q_table_b;
        self.steps = snapshot.learning_steps;
        self.rewards = RunningReward {
            total: snapshot.total_reward,
            count: snapshot.learning_steps,
        };
        self.exploration.reset_to(snapshot.exploration_rate);
        if let Some(beta) = snapshot.beta {
            self.beta.reset_to(beta);
        }
        self.buffer = PrioritizedReplayBuffer::from_stored(snapshot.replay, self.config.buffer_capacity);
        self.last_checkpoint = Some(snapshot.id);
        Ok(())
    }
}

#[async_trait]
impl Persist for QLearningEngine {
    async fn save(&self, path: &Path) -> Result<()> {
        let snapshot = self.snapshot();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let data = serde_json::to_vec_pretty(&snapshot)?;
        tokio::fs::write(path, data).await?;
        info!(
            path = %path.display(),
            checkpoint = %snapshot.id,
            steps = snapshot.learning_steps,
            "Saved learning data"
        );
        Ok(())
    }

    async fn load(&mut self, path: &Path) -> Result<()> {
        let data = tokio::fs::read(path).await?;
        let snapshot: LearningSnapshot = serde_json::from_slice(&data)?;
        let id = snapshot.id;
        self.restore(snapshot)?;
        info!(
            path = %path.display(),
            checkpoint = %id,
            steps = self.steps,
            "Loaded learning data"
        );
        Ok(())
    }
}

impl Policy for QLearningEngine {
    fn select(&mut self, state: &DiscreteState) -> Option<PetAction> {
        self.choose_action(state)
    }

    fn observe(&mut self, transition: &Transition) {
        self.learn_transition(transition.clone());
    }

    fn name(&self) -> &'static str {
        "double-q"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn s(level: u8) -> DiscreteState {
        DiscreteState::new([level, 0, 0, 0, 0], None)
    }

    fn seeded(config: QLearningConfig) -> QLearningEngine {
        QLearningEngine::new(QLearningConfig {
            seed: Some(7),
            ..config
        })
    }

    #[test]
    fn test_disabled_engine_declines() {
        let mut engine = seeded(QLearningConfig {
            enabled: false,
            ..QLearningConfig::default()
        });
        assert_eq!(engine.choose_action(&s(0)), None);
        engine.learn(s(0), PetAction::Feed, 1.0, s(1), false);
        assert_eq!(engine.learning_steps(), 0);
    }

    #[test]
    fn test_empty_action_set_declines() {
        let mut engine = seeded(QLearningConfig {
            actions: Vec::new(),
            ..QLearningConfig::default()
        });
        assert!(!engine.is_active());
        assert_eq!(engine.choose_action(&s(0)), None);
    }

    #[test]
    fn test_greedy_choice_without_exploration() {
        let mut engine = seeded(QLearningConfig {
            exploration_start: 0.0,
            exploration_min: 0.0,
            batch_size: 1,
            ..QLearningConfig::default()
        });
        engine.learn(s(0), PetAction::Clean, 5.0, s(0), true);
        for _ in 0..10 {
            assert_eq!(engine.choose_action(&s(0)), Some(PetAction::Clean));
        }
    }

    #[test]
    fn test_priority_uses_td_error() {
        let engine = seeded(QLearningConfig::default());
        let terminal = Transition::new(s(0), PetAction::Feed, 2.0, s(1), true);
        assert_relative_eq!(engine.priority(&terminal), (2.0f64 + 1e-6).powf(0.6));

        let zero = Transition::new(s(0), PetAction::Feed, 0.0, s(1), false);
        assert!(engine.priority(&zero) > 0.0);
    }

    #[test]
    fn test_replayed_priority_tracks_updated_tables() {
        let mut engine = seeded(QLearningConfig {
            batch_size: 1,
            ..QLearningConfig::default()
        });
        let transition = Transition::new(s(0), PetAction::Feed, 1.0, s(0), true);
        engine.learn_transition(transition.clone());

        assert_relative_eq!(engine.table_a().get(&s(0), PetAction::Feed), 0.1, epsilon = 1e-12);
        let stored: Vec<f64> = engine.buffer().priorities().collect();
        assert_eq!(stored.len(), 1);
        assert_relative_eq!(stored[0], engine.priority(&transition), epsilon = 1e-12);
        assert_relative_eq!(stored[0], (0.9f64 + 1e-6).powf(0.6), epsilon = 1e-9);
    }

    #[test]
    fn test_tables_bootstrap_from_each_other() {
        let mut engine = seeded(QLearningConfig {
            learning_rate: 1.0,
            batch_size: 1,
            ..QLearningConfig::default()
        });
        engine.table_a.set(s(1), PetAction::Feed, 5.0);
        engine.table_a.set(s(1), PetAction::Rest, 1.0);
        engine.table_b.set(s(1), PetAction::Feed, 2.0);
        engine.table_b.set(s(1), PetAction::Rest, 7.0);

        engine.learn(s(0), PetAction::Feed, 0.0, s(1), false);

        // A picks Feed and reads B; B picks Rest and reads A
        assert_relative_eq!(engine.table_a().get(&s(0), PetAction::Feed), 1.8, epsilon = 1e-12);
        assert_relative_eq!(engine.table_b().get(&s(0), PetAction::Feed), 0.9, epsilon = 1e-12);
    }

    #[test]
    fn test_no_replay_before_full_batch() {
        let mut engine = seeded(QLearningConfig {
            batch_size: 4,
            ..QLearningConfig::default()
        });
        for _ in 0..3 {
            engine.learn(s(0), PetAction::Feed, 1.0, s(0), false);
        }
        assert!(engine.table_a().is_empty());
        assert_eq!(engine.buffer().len(), 3);

        engine.learn(s(0), PetAction::Feed, 1.0, s(0), false);
        assert!(engine.table_a().get(&s(0), PetAction::Feed) > 0.0);
    }

    #[test]
    fn test_periodic_compression() {
        let mut engine = seeded(QLearningConfig {
            batch_size: 1,
            cleanup_interval: 2,
            prune_threshold: 0.5,
            ..QLearningConfig::default()
        });
        engine.learn(s(0), PetAction::Feed, 1.0, s(0), true);
        assert_eq!(engine.table_a().len(), 1);
        engine.learn(s(1), PetAction::Rest, 0.0, s(1), true);
        assert!(engine.table_a().is_empty());
        assert!(engine.table_b().is_empty());
    }

    #[test]
    fn test_stats_track_rewards() {
        let mut engine = seeded(QLearningConfig::default());
        engine.learn(s(0), PetAction::Feed, 1.0, s(1), false);
        engine.learn(s(1), PetAction::Rest, 3.0, s(0), false);
        let stats = engine.stats();
        assert_eq!(stats.learning_steps, 2);
        assert_relative_eq!(stats.total_reward, 4.0);
        assert_relative_eq!(stats.average_reward, 2.0);
        assert_relative_eq!(stats.exploration_rate, 0.995 * 0.995, epsilon = 1e-12);
        assert_relative_eq!(stats.beta, 0.402, epsilon = 1e-12);
    }

    #[test]
    fn test_restore_rejects_bad_snapshot_and_keeps_state() {
        let mut engine = seeded(QLearningConfig {
            batch_size: 1,
            ..QLearningConfig::default()
        });
        engine.learn(s(0), PetAction::Feed, 1.0, s(0), true);
        let mut snapshot = engine.snapshot();
        snapshot.exploration_rate = 3.0;
        snapshot.q_table_a = QTable::new();

        assert!(engine.restore(snapshot).is_err());
        assert_eq!(engine.table_a().len(), 1);
        assert_eq!(engine.learning_steps(), 1);
    }
}
