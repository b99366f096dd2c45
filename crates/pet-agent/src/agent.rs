//! The intelligent pet: a pet driven by a learning policy
//!
//! Each [`IntelligentPet::update`] decays needs by elapsed time and, once the
//! autonomous cooldown has passed, lets the policy pick an action, runs it,
//! scores the change and feeds the transition back. When the policy declines,
//! the behavior tree acts instead.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

use pet_rl_agent::{LearningStats, QLearningEngine};
use pet_rl_core::{
    Need, NeedShapedReward, Persist, PetAction, PetAttributes, Policy, Result, RewardFunction,
    StateDiscretizer, Transition,
};

use crate::behavior::{BehaviorTree, Status, TreeContext};
use crate::config::PetConfig;
use crate::decision::{ActionPrediction, DecisionSystem, NeedForecast};
use crate::journal::{ActionSource, BehaviorJournal};
use crate::pet::{ActionOutcome, CleanKind, FoodKind, GameKind, Mood, Pet, Skill};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TickPhase {
    Idle,
    Updating,
}

/// Commands an owner can give
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserInteraction {
    /// Regular meal
    Feed,
    /// Regular game
    Play,
    /// Put to bed
    Sleep,
    /// Wake up
    WakeUp,
    /// Brush
    Clean,
    /// Train intelligence
    Train,
}

impl UserInteraction {
    /// Learning action credited for this interaction
    #[must_use]
    pub fn learning_action(self) -> PetAction {
        match self {
            UserInteraction::Feed => PetAction::Feed,
            UserInteraction::Play => PetAction::Play,
            UserInteraction::Sleep => PetAction::Sleep,
            UserInteraction::WakeUp => PetAction::Explore,
            UserInteraction::Clean => PetAction::Clean,
            UserInteraction::Train => PetAction::Train,
        }
    }
}

/// One autonomous action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutonomousStep {
    /// Action taken
    pub action: PetAction,
    /// Policy or tree
    pub source: ActionSource,
    /// Whether the action took effect
    pub success: bool,
    /// Outcome text
    pub message: String,
    /// Reward fed to the learner, if any
    pub reward: Option<f64>,
}

/// What a call to [`IntelligentPet::update`] did
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    /// Hours of need decay applied, 0 if none
    pub hours_advanced: f64,
    /// Autonomous action, if the cooldown allowed one
    pub step: Option<AutonomousStep>,
}

/// Learning summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningProgress {
    /// Current exploration rate
    pub exploration_rate: f64,
    /// Mean reward per learning step
    pub average_reward: f64,
    /// Learning steps taken
    pub learning_steps: u64,
    /// State-action entries in the primary table
    pub q_table_size: usize,
}

/// Full status report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntelligentStatus {
    /// Pet name
    pub name: String,
    /// Species
    pub species: String,
    /// Needs
    pub attributes: PetAttributes,
    /// Mood
    pub mood: Mood,
    /// Asleep
    pub sleeping: bool,
    /// Sick
    pub sick: bool,
    /// Age in days
    pub age_days: f64,
    /// Active policy
    pub policy: String,
    /// Rule-based suggestion for the current needs
    pub suggested_action: PetAction,
    /// Pressing needs, most urgent first
    pub predicted_needs: Vec<NeedForecast>,
    /// Predicted next action
    pub next_action: Option<ActionPrediction>,
    /// Mean prediction confidence
    pub decision_confidence: f64,
    /// Learner statistics
    pub learning: LearningStats,
    /// Recent action frequencies
    pub action_rates: BTreeMap<String, f64>,
    /// Preference scores
    pub preferences: BTreeMap<String, f64>,
}

/// Tree context that runs actions on the pet and journals them
struct JournaledPet<'a> {
    pet: &'a mut Pet,
    journal: &'a mut BehaviorJournal,
    last: Option<(PetAction, ActionOutcome)>,
}

impl TreeContext for JournaledPet<'_> {
    fn need(&self, need: Need) -> f64 {
        self.pet.attributes().get(need)
    }

    fn is_sleeping(&self) -> bool {
        self.pet.is_sleeping()
    }

    fn perform(&mut self, action: PetAction) -> bool {
        let outcome = self.pet.perform(action);
        self.journal.record(
            action.as_str(),
            outcome.success,
            &outcome.message,
            ActionSource::Tree,
        );
        let success = outcome.success;
        self.last = Some((action, outcome));
        success
    }
}

/// Pet plus the machinery that lets it look after itself
pub struct IntelligentPet {
    pet: Pet,
    config: PetConfig,
    discretizer: StateDiscretizer,
    reward_fn: Box<dyn RewardFunction>,
    engine: QLearningEngine,
    baseline: Option<Box<dyn Policy>>,
    tree: BehaviorTree,
    decisions: DecisionSystem,
    journal: BehaviorJournal,
    rng: StdRng,
    phase: TickPhase,
    last_need_update: Instant,
    last_autonomous: Instant,
}

impl IntelligentPet {
    /// Wrap a pet. `now` starts both the decay and cooldown clocks.
    pub fn new(mut pet: Pet, config: PetConfig, now: Instant) -> Result<Self> {
        config.validate()?;
        let discretizer = StateDiscretizer::new(config.state_bins.clone())?;
        pet.set_config(config.clone());
        let rng = config
            .learning
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);

        Ok(Self {
            reward_fn: Box::new(NeedShapedReward::new(config.reward.clone())),
            engine: QLearningEngine::new(config.learning.clone()),
            baseline: None,
            tree: BehaviorTree::pet_default(),
            decisions: DecisionSystem::new(config.decision_history),
            journal: BehaviorJournal::new(config.journal_capacity),
            rng,
            phase: TickPhase::Idle,
            last_need_update: now,
            last_autonomous: now,
            discretizer,
            config,
            pet,
        })
    }

    /// [`new`](Self::new) with every random source seeded
    pub fn with_seed(pet: Pet, mut config: PetConfig, now: Instant, seed: u64) -> Result<Self> {
        config.learning.seed = Some(seed);
        Self::new(pet, config, now)
    }

    /// Drive autonomous actions with another policy instead of the engine
    #[must_use]
    pub fn with_policy(mut self, policy: Box<dyn Policy>) -> Self {
        self.baseline = Some(policy);
        self
    }

    /// The pet
    #[must_use]
    pub fn pet(&self) -> &Pet {
        &self.pet
    }

    /// Mutable access to the pet
    pub fn pet_mut(&mut self) -> &mut Pet {
        &mut self.pet
    }

    /// The learning engine
    #[must_use]
    pub fn engine(&self) -> &QLearningEngine {
        &self.engine
    }

    /// The journal
    #[must_use]
    pub fn journal(&self) -> &BehaviorJournal {
        &self.journal
    }

    /// Name of the policy choosing autonomous actions
    #[must_use]
    pub fn policy_name(&self) -> &'static str {
        match &self.baseline {
            Some(policy) => policy.name(),
            None => self.engine.name(),
        }
    }

    /// Advance to `now`: decay needs once a full update interval has
    /// accumulated, then act if the cooldown has strictly elapsed.
    pub fn update(&mut self, now: Instant) -> TickReport {
        debug_assert_eq!(self.phase, TickPhase::Idle, "update re-entered");
        if self.phase != TickPhase::Idle {
            return TickReport::default();
        }
        self.phase = TickPhase::Updating;

        let mut report = TickReport::default();

        let hours = now
            .saturating_duration_since(self.last_need_update)
            .as_secs_f64()
            / 3600.0;
        if hours >= self.config.update_interval_hours {
            self.pet.advance(hours);
            self.last_need_update = now;
            report.hours_advanced = hours;
        }

        if now.saturating_duration_since(self.last_autonomous) > self.config.autonomous_cooldown() {
            report.step = Some(self.execute_autonomous_action());
            self.last_autonomous = now;
        }

        self.phase = TickPhase::Idle;
        report
    }

    /// Let the policy act once, falling back to the behavior tree when it
    /// declines.
    pub fn execute_autonomous_action(&mut self) -> AutonomousStep {
        let before = self.pet.attributes();
        let state = self.discretizer.discretize(&before, self.pet.flags());

        let policy: &mut dyn Policy = match &mut self.baseline {
            Some(policy) => policy.as_mut(),
            None => &mut self.engine,
        };
        let policy_name = policy.name();

        let Some(action) = policy.select(&state) else {
            return self.fall_back_to_tree();
        };

        let outcome = self.pet.perform(action);
        let after = self.pet.attributes();
        let next_state = self.discretizer.discretize(&after, self.pet.flags());
        let reward = self.reward_fn.reward(&before, action, &after).value();
        policy.observe(&Transition::new(state, action, reward, next_state, false));

        self.journal.record(
            action.as_str(),
            outcome.success,
            &outcome.message,
            ActionSource::Autonomous,
        );
        debug!(
            %action,
            success = outcome.success,
            reward,
            exploration = self.engine.exploration_rate(),
            policy = policy_name,
            "Autonomous action"
        );

        AutonomousStep {
            action,
            source: ActionSource::Autonomous,
            success: outcome.success,
            message: outcome.message,
            reward: Some(reward),
        }
    }

    fn fall_back_to_tree(&mut self) -> AutonomousStep {
        let mut ctx = JournaledPet {
            pet: &mut self.pet,
            journal: &mut self.journal,
            last: None,
        };
        let status = self.tree.tick(&mut ctx);
        let last = ctx.last;
        debug!(?status, "Policy declined, behavior tree acted");

        match last {
            Some((action, outcome)) => AutonomousStep {
                action,
                source: ActionSource::Tree,
                success: status == Status::Success && outcome.success,
                message: outcome.message,
                reward: None,
            },
            // The default tree always ends in an action leaf
            None => AutonomousStep {
                action: PetAction::Rest,
                source: ActionSource::Tree,
                success: false,
                message: format!("{} did nothing", self.pet.name),
                reward: None,
            },
        }
    }

    /// Run an owner command and learn from its effect
    pub fn interact(&mut self, interaction: UserInteraction) -> ActionOutcome {
        let before = self.pet.attributes();
        let state = self.discretizer.discretize(&before, self.pet.flags());

        let outcome = match interaction {
            UserInteraction::Feed => self.pet.feed(FoodKind::Regular),
            UserInteraction::Play => self.pet.play(GameKind::Regular),
            UserInteraction::Sleep => self.pet.sleep(),
            UserInteraction::WakeUp => self.pet.wake_up(),
            UserInteraction::Clean => self.pet.clean(CleanKind::Brush),
            UserInteraction::Train => self.pet.train(Skill::Intelligence),
        };

        let action = interaction.learning_action();
        let after = self.pet.attributes();
        let next_state = self.discretizer.discretize(&after, self.pet.flags());
        let reward = self.reward_fn.reward(&before, action, &after).value();
        self.engine.learn(state, action, reward, next_state, false);

        self.journal.record(
            &outcome.action,
            outcome.success,
            &outcome.message,
            ActionSource::User,
        );
        outcome
    }

    /// Rule-based action for the current needs
    pub fn suggested_action(&mut self) -> PetAction {
        self.decisions
            .decide(&self.pet.attributes(), self.pet.flags(), &mut self.rng)
    }

    /// Learner summary
    #[must_use]
    pub fn learning_progress(&self) -> LearningProgress {
        let stats = self.engine.stats();
        LearningProgress {
            exploration_rate: stats.exploration_rate,
            average_reward: stats.average_reward,
            learning_steps: stats.learning_steps,
            q_table_size: self.engine.table_a().entry_count(),
        }
    }

    /// Full status. Records a next-action prediction as a side effect.
    pub fn status(&mut self) -> IntelligentStatus {
        let attributes = self.pet.attributes();
        let next_action = self
            .decisions
            .predict_next_action(&attributes, self.pet.personality());

        IntelligentStatus {
            name: self.pet.name.clone(),
            species: self.pet.species.clone(),
            attributes,
            mood: self.pet.mood(),
            sleeping: self.pet.is_sleeping(),
            sick: self.pet.is_sick(),
            age_days: self.pet.age_days(),
            policy: self.policy_name().to_string(),
            suggested_action: self.suggested_action(),
            predicted_needs: self.decisions.predict_needs(&attributes),
            next_action,
            decision_confidence: self.decisions.confidence(),
            learning: self.engine.stats(),
            action_rates: self.journal.action_rates(),
            preferences: self.journal.preferences().clone(),
        }
    }

    /// Save learning data next to the pet file
    pub async fn save_learning(&self, pet_path: &Path) -> Result<PathBuf> {
        let path = learning_path(pet_path);
        self.engine.save(&path).await?;
        Ok(path)
    }

    /// Load learning data saved next to the pet file. On any failure the
    /// current learning state is kept and `false` is returned.
    pub async fn load_learning(&mut self, pet_path: &Path) -> bool {
        let path = learning_path(pet_path);
        match self.engine.load(&path).await {
            Ok(()) => {
                info!(pet = %self.pet.name, path = %path.display(), "Resumed learning");
                true
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not load learning data, starting fresh");
                false
            }
        }
    }
}

/// `<stem>_learning.json` beside the pet file
#[must_use]
pub fn learning_path(pet_path: &Path) -> PathBuf {
    let stem = pet_path
        .file_stem()
        .map_or_else(|| "pet".into(), |s| s.to_string_lossy());
    pet_path.with_file_name(format!("{stem}_learning.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_learning_path() {
        assert_eq!(
            learning_path(Path::new("/tmp/saves/buddy.json")),
            PathBuf::from("/tmp/saves/buddy_learning.json")
        );
        assert_eq!(
            learning_path(Path::new("buddy")),
            PathBuf::from("buddy_learning.json")
        );
    }

    #[test]
    fn test_wake_up_credits_explore() {
        assert_eq!(UserInteraction::WakeUp.learning_action(), PetAction::Explore);
        assert_eq!(UserInteraction::Feed.learning_action(), PetAction::Feed);
    }
}
