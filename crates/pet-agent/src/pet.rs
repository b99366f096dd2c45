//! The pet entity and its action methods

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use pet_rl_core::{clamp_need, Need, PetAction, PetAttributes, StateFlags};

use crate::behavior::TreeContext;
use crate::config::PetConfig;

/// Personality trait
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trait {
    /// Loves to play
    Playful,
    /// Prefers resting
    Lazy,
    /// Gets hungry quickly
    Hungry,
    /// Hates being dirty
    Clean,
    /// Needs attention
    Affectionate,
    /// Likes being alone
    Independent,
    /// Likes to explore
    Curious,
}

impl Trait {
    /// Every trait
    pub const ALL: [Trait; 7] = [
        Trait::Playful,
        Trait::Lazy,
        Trait::Hungry,
        Trait::Clean,
        Trait::Affectionate,
        Trait::Independent,
        Trait::Curious,
    ];
}

/// Mood derived from happiness and health
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    /// Happiness above 90
    Ecstatic,
    /// Above 70
    Happy,
    /// Above 50
    Content,
    /// Above 30
    Neutral,
    /// Above 10, or poor health
    Sad,
    /// 10 or below
    Depressed,
}

impl Mood {
    /// Mood for the given happiness and health
    #[must_use]
    pub fn from_levels(happiness: f64, health: f64) -> Self {
        if health < 30.0 {
            return Mood::Sad;
        }
        match happiness {
            h if h > 90.0 => Mood::Ecstatic,
            h if h > 70.0 => Mood::Happy,
            h if h > 50.0 => Mood::Content,
            h if h > 30.0 => Mood::Neutral,
            h if h > 10.0 => Mood::Sad,
            _ => Mood::Depressed,
        }
    }
}

/// Stage of life by age
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifeStage {
    /// Under one day
    Baby,
    /// Under a week
    Child,
    /// Under two weeks
    Teen,
    /// Under thirty days
    Adult,
    /// Thirty days and over
    Elder,
}

impl LifeStage {
    fn from_age(days: f64) -> Self {
        match days {
            d if d < 1.0 => LifeStage::Baby,
            d if d < 7.0 => LifeStage::Child,
            d if d < 14.0 => LifeStage::Teen,
            d if d < 30.0 => LifeStage::Adult,
            _ => LifeStage::Elder,
        }
    }
}

/// Trainable skill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Skill {
    /// Intelligence
    Intelligence,
    /// Strength
    Strength,
    /// Speed
    Speed,
    /// Social
    Social,
}

impl Skill {
    /// Lowercase name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Skill::Intelligence => "intelligence",
            Skill::Strength => "strength",
            Skill::Speed => "speed",
            Skill::Social => "social",
        }
    }
}

/// Skill levels
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Skills {
    /// Intelligence
    pub intelligence: f64,
    /// Strength
    pub strength: f64,
    /// Speed
    pub speed: f64,
    /// Social
    pub social: f64,
}

impl Skills {
    fn add(&mut self, skill: Skill, amount: f64) {
        match skill {
            Skill::Intelligence => self.intelligence += amount,
            Skill::Strength => self.strength += amount,
            Skill::Speed => self.speed += amount,
            Skill::Social => self.social += amount,
        }
    }

    /// Level of one skill
    #[must_use]
    pub fn get(&self, skill: Skill) -> f64 {
        match skill {
            Skill::Intelligence => self.intelligence,
            Skill::Strength => self.strength,
            Skill::Speed => self.speed,
            Skill::Social => self.social,
        }
    }
}

/// Kinds of food
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoodKind {
    /// Ordinary meal
    #[default]
    Regular,
    /// Big meal
    Feast,
    /// Healthy food
    Healthy,
    /// Small snack
    Snack,
}

impl FoodKind {
    /// (hunger, happiness, health, weight) deltas
    fn effect(self) -> (f64, f64, f64, f64) {
        match self {
            FoodKind::Regular => (-30.0, 5.0, 0.0, 0.1),
            FoodKind::Feast => (-50.0, 15.0, 0.0, 0.2),
            FoodKind::Healthy => (-25.0, 0.0, 10.0, 0.05),
            FoodKind::Snack => (-10.0, 10.0, 0.0, 0.02),
        }
    }
}

/// Kinds of game
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameKind {
    /// Ordinary game
    #[default]
    Regular,
    /// Fetch
    Fetch,
    /// Puzzle
    Puzzle,
    /// Social game
    Social,
}

impl GameKind {
    /// (energy, happiness, experience, trained skills)
    fn effect(self) -> (f64, f64, f64, &'static [Skill]) {
        match self {
            GameKind::Regular => (-15.0, 20.0, 10.0, &[]),
            GameKind::Fetch => (-20.0, 25.0, 0.0, &[Skill::Strength, Skill::Speed]),
            GameKind::Puzzle => (-10.0, 15.0, 0.0, &[Skill::Intelligence]),
            GameKind::Social => (-5.0, 30.0, 0.0, &[Skill::Social]),
        }
    }
}

/// Kinds of grooming
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanKind {
    /// Brush the fur
    #[default]
    Brush,
    /// Brush teeth
    Teeth,
    /// Full bath
    Bath,
    /// Trim nails
    Nails,
}

impl CleanKind {
    /// (hygiene, happiness, health) gains
    fn effect(self) -> (f64, f64, f64) {
        match self {
            CleanKind::Brush => (40.0, 10.0, 5.0),
            CleanKind::Teeth => (20.0, 5.0, 15.0),
            CleanKind::Bath => (60.0, 15.0, 10.0),
            CleanKind::Nails => (15.0, 5.0, 3.0),
        }
    }
}

/// Result of an action method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOutcome {
    /// Action name
    pub action: String,
    /// Whether the action took effect
    pub success: bool,
    /// Human-readable description
    pub message: String,
}

impl ActionOutcome {
    fn ok(action: &str, message: impl Into<String>) -> Self {
        Self {
            action: action.to_string(),
            success: true,
            message: message.into(),
        }
    }

    fn failed(action: &str, message: impl Into<String>) -> Self {
        Self {
            action: action.to_string(),
            success: false,
            message: message.into(),
        }
    }
}

impl fmt::Display for ActionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// A virtual pet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pet {
    /// Name
    pub name: String,
    /// Species
    pub species: String,
    attributes: PetAttributes,
    weight: f64,
    experience: f64,
    skills: Skills,
    sleeping: bool,
    sick: bool,
    sleep_hours: f64,
    personality: BTreeMap<Trait, f64>,
    mood: Mood,
    age_days: f64,
    stage: LifeStage,
    memories: VecDeque<String>,
    #[serde(skip)]
    config: PetConfig,
}

impl Pet {
    /// Create a pet with randomly rolled personality traits
    pub fn new<R: Rng + ?Sized>(
        name: impl Into<String>,
        species: impl Into<String>,
        config: PetConfig,
        rng: &mut R,
    ) -> Self {
        let mut personality = BTreeMap::new();
        for t in Trait::ALL {
            if rng.gen::<f64>() > 0.7 {
                personality.insert(t, rng.gen_range(0.6..=1.0));
            }
        }
        Self::with_traits(name, species, config, personality)
    }

    /// Create a pet with explicit traits
    #[must_use]
    pub fn with_traits(
        name: impl Into<String>,
        species: impl Into<String>,
        config: PetConfig,
        personality: BTreeMap<Trait, f64>,
    ) -> Self {
        let attributes = PetAttributes {
            happiness: 50.0,
            ..PetAttributes::default()
        };
        Self {
            name: name.into(),
            species: species.into(),
            attributes,
            weight: 1.0,
            experience: 0.0,
            skills: Skills::default(),
            sleeping: false,
            sick: false,
            sleep_hours: 0.0,
            personality,
            mood: Mood::from_levels(attributes.happiness, attributes.health),
            age_days: 0.0,
            stage: LifeStage::Baby,
            memories: VecDeque::new(),
            config,
        }
    }

    /// Replace the configuration, e.g. after loading from disk
    pub fn set_config(&mut self, config: PetConfig) {
        self.config = config;
    }

    /// Configuration in use
    #[must_use]
    pub fn config(&self) -> &PetConfig {
        &self.config
    }

    /// Current needs
    #[must_use]
    pub fn attributes(&self) -> PetAttributes {
        self.attributes
    }

    /// Flags appended to discrete states
    #[must_use]
    pub fn flags(&self) -> StateFlags {
        StateFlags {
            sleeping: self.sleeping,
            sick: self.sick,
        }
    }

    /// Set one need directly, clamped. Never triggers sleep or wake.
    pub fn set_need(&mut self, need: Need, value: f64) {
        self.attributes.set(need, clamp_need(value));
    }

    /// Set the sick flag directly
    pub fn set_sick(&mut self, sick: bool) {
        self.sick = sick;
    }

    /// Whether the pet is asleep
    #[must_use]
    pub fn is_sleeping(&self) -> bool {
        self.sleeping
    }

    /// Whether the pet is sick
    #[must_use]
    pub fn is_sick(&self) -> bool {
        self.sick
    }

    /// Current mood
    #[must_use]
    pub fn mood(&self) -> Mood {
        self.mood
    }

    /// Life stage
    #[must_use]
    pub fn stage(&self) -> LifeStage {
        self.stage
    }

    /// Age in days
    #[must_use]
    pub fn age_days(&self) -> f64 {
        self.age_days
    }

    /// Weight in kg
    #[must_use]
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Experience points
    #[must_use]
    pub fn experience(&self) -> f64 {
        self.experience
    }

    /// Skill levels
    #[must_use]
    pub fn skills(&self) -> &Skills {
        &self.skills
    }

    /// Personality traits with strengths
    #[must_use]
    pub fn personality(&self) -> &BTreeMap<Trait, f64> {
        &self.personality
    }

    /// Whether the pet has a trait
    #[must_use]
    pub fn has_trait(&self, t: Trait) -> bool {
        self.personality.contains_key(&t)
    }

    /// Remembered events, oldest first
    pub fn memories(&self) -> impl Iterator<Item = &str> {
        self.memories.iter().map(String::as_str)
    }

    fn remember(&mut self, memory: impl Into<String>) {
        self.memories.push_back(memory.into());
        while self.memories.len() > self.config.max_memories {
            self.memories.pop_front();
        }
    }

    fn finish(&mut self, mut outcome: ActionOutcome) -> ActionOutcome {
        self.attributes = self.attributes.clamped();
        if !self.sleeping && self.attributes.energy < self.config.energy_sleep_threshold {
            let asleep = self.sleep();
            outcome.message = format!("{}\n{}", outcome.message, asleep.message);
        }
        self.mood = Mood::from_levels(self.attributes.happiness, self.attributes.health);
        outcome
    }

    /// Feed the pet. A sleeping pet is woken for the meal and goes back to sleep.
    pub fn feed(&mut self, food: FoodKind) -> ActionOutcome {
        let was_sleeping = self.sleeping;
        let mut prefix = String::new();
        if was_sleeping {
            prefix = format!("{}\n", self.wake_up().message);
        }

        let (hunger, happiness, health, weight) = food.effect();
        let a = &mut self.attributes;
        a.hunger = (a.hunger + hunger).max(0.0);
        a.happiness = (a.happiness + happiness).min(100.0);
        a.health = (a.health + health).min(100.0);
        self.weight += weight;
        if self.has_trait(Trait::Hungry) {
            self.attributes.happiness += 5.0;
        }
        self.remember(format!("ate a {food:?} meal").to_lowercase());

        let outcome = ActionOutcome::ok(
            "feed",
            format!("{prefix}Fed {}, who looks very happy", self.name),
        );
        if was_sleeping {
            let back = self.sleep();
            self.attributes = self.attributes.clamped();
            self.mood = Mood::from_levels(self.attributes.happiness, self.attributes.health);
            return ActionOutcome {
                message: format!("{}\n{}", outcome.message, back.message),
                ..outcome
            };
        }
        self.finish(outcome)
    }

    /// Play a game
    pub fn play(&mut self, game: GameKind) -> ActionOutcome {
        if self.sleeping {
            return ActionOutcome::failed("play", format!("{} is asleep and cannot play", self.name));
        }
        if self.attributes.energy < self.config.energy_threshold {
            return ActionOutcome::failed("play", format!("{} is too tired to play", self.name));
        }

        let (energy, happiness, experience, skills) = game.effect();
        let a = &mut self.attributes;
        a.energy = (a.energy + energy).max(0.0);
        a.happiness = (a.happiness + happiness).min(100.0);
        self.experience += experience;
        for skill in skills {
            self.skills.add(*skill, 0.5);
        }
        if self.has_trait(Trait::Playful) {
            self.attributes.happiness += 10.0;
        }
        if self.has_trait(Trait::Lazy) {
            self.attributes.energy -= 5.0;
        }
        self.remember(format!("played a {game:?} game").to_lowercase());

        let outcome = ActionOutcome::ok("play", format!("{} had a great time playing", self.name));
        self.finish(outcome)
    }

    /// Clean the pet
    pub fn clean(&mut self, kind: CleanKind) -> ActionOutcome {
        if self.sleeping {
            return ActionOutcome::failed("clean", format!("{} is asleep and cannot be cleaned", self.name));
        }

        let (mut hygiene, mut happiness, health) = kind.effect();
        let fussy = self.has_trait(Trait::Clean);
        if fussy {
            hygiene *= 1.3;
            happiness *= 1.5;
        }
        let a = &mut self.attributes;
        a.hygiene = (a.hygiene + hygiene).min(100.0);
        a.happiness = (a.happiness + happiness).min(100.0);
        a.health = (a.health + health).min(100.0);
        self.remember(format!("got a {kind:?} clean").to_lowercase());

        let message = if fussy {
            format!("{kind:?} done! {} enjoyed it and looks spotless", self.name)
        } else {
            format!("{kind:?} done! {} is much cleaner now", self.name)
        };
        self.finish(ActionOutcome::ok("clean", message))
    }

    /// Put the pet to sleep
    pub fn sleep(&mut self) -> ActionOutcome {
        if self.sleeping {
            return ActionOutcome::failed("sleep", format!("{} is already asleep", self.name));
        }
        self.sleeping = true;
        self.sleep_hours = 0.0;
        self.remember("went to sleep");

        let mut message = format!("{} fell asleep. Good night!", self.name);
        if self.has_trait(Trait::Lazy) {
            message.push_str(" (this could take a while)");
        }
        ActionOutcome::ok("sleep", message)
    }

    /// Wake the pet; restores up to 30 energy depending on hours slept
    pub fn wake_up(&mut self) -> ActionOutcome {
        if !self.sleeping {
            return ActionOutcome::failed("wake_up", format!("{} is already awake", self.name));
        }
        self.sleeping = false;
        let gained = (self.sleep_hours * 15.0).min(30.0);
        self.sleep_hours = 0.0;
        self.attributes.energy = (self.attributes.energy + gained).min(100.0);
        self.remember("woke up");

        let message = if gained > 20.0 {
            format!("{} woke up full of energy!", self.name)
        } else {
            format!("{} woke up, still a little drowsy", self.name)
        };
        ActionOutcome::ok("wake_up", message)
    }

    /// Train a skill
    pub fn train(&mut self, skill: Skill) -> ActionOutcome {
        if self.sleeping {
            return ActionOutcome::failed("train", format!("{} is asleep and cannot train", self.name));
        }
        if self.attributes.energy < self.config.train_min_energy {
            return ActionOutcome::failed("train", format!("{} is too tired to train", self.name));
        }

        let mut cost = self.config.train_energy_cost;
        if self.has_trait(Trait::Lazy) {
            cost *= 1.5;
            self.attributes.happiness -= 5.0;
        }
        self.attributes.energy = (self.attributes.energy - cost).max(0.0);
        self.skills.add(skill, self.config.train_skill_gain);
        self.experience += self.config.train_experience_gain;
        self.attributes.happiness += 5.0;
        self.remember(format!("trained {}", skill.as_str()));

        let outcome = ActionOutcome::ok(
            "train",
            format!("{}'s {} improved", self.name, skill.as_str()),
        );
        self.finish(outcome)
    }

    /// Wander around
    pub fn explore(&mut self) -> ActionOutcome {
        if self.sleeping {
            return ActionOutcome::failed("explore", format!("{} is asleep", self.name));
        }
        if self.attributes.energy < 15.0 {
            return ActionOutcome::failed("explore", format!("{} is too tired to move", self.name));
        }
        let a = &mut self.attributes;
        a.energy = (a.energy - self.config.explore_energy_cost).max(0.0);
        a.happiness = (a.happiness + 10.0).min(100.0);
        self.skills
            .add(Skill::Intelligence, self.config.explore_intelligence_gain);

        let outcome = ActionOutcome::ok(
            "explore",
            format!("{} is curiously exploring the surroundings", self.name),
        );
        self.finish(outcome)
    }

    /// Rest a little; always possible
    pub fn rest(&mut self) -> ActionOutcome {
        let a = &mut self.attributes;
        a.energy = (a.energy + self.config.rest_energy_gain).min(100.0);
        a.health = (a.health + self.config.rest_health_gain).min(100.0);

        let outcome = ActionOutcome::ok("rest", format!("{} is resting", self.name));
        self.finish(outcome)
    }

    /// Ask the owner for food
    pub fn beg_for_food(&mut self) -> ActionOutcome {
        self.attributes.happiness += 5.0;
        self.attributes = self.attributes.clamped();
        ActionOutcome::ok("beg_for_food", format!("{}: 'I'm hungry, feed me!'", self.name))
    }

    /// Self-grooming
    pub fn groom(&mut self) -> ActionOutcome {
        self.attributes.hygiene += 15.0;
        self.attributes.happiness += 5.0;
        self.attributes = self.attributes.clamped();
        ActionOutcome::ok("groom", format!("{} is licking its fur clean", self.name))
    }

    /// Run one of the learning actions with its default variant
    pub fn perform(&mut self, action: PetAction) -> ActionOutcome {
        match action {
            PetAction::Feed => self.feed(FoodKind::Regular),
            PetAction::Play => self.play(GameKind::Regular),
            PetAction::Sleep => self.sleep(),
            PetAction::Clean => self.clean(CleanKind::Brush),
            PetAction::Train => self.train(Skill::Intelligence),
            PetAction::Explore => self.explore(),
            PetAction::Rest => self.rest(),
        }
    }

    /// Dispatch by name. Unknown names yield a failed outcome, never an error.
    pub fn perform_named(&mut self, name: &str) -> ActionOutcome {
        match name.trim() {
            "wake_up" => self.wake_up(),
            "beg_for_food" => self.beg_for_food(),
            "groom" => self.groom(),
            other => match other.parse::<PetAction>() {
                Ok(action) => self.perform(action),
                Err(_) => ActionOutcome::failed(other, format!("unknown action: {other}")),
            },
        }
    }

    /// Let `hours` of time pass: needs decay, sleep restores energy, and a
    /// fully rested sleeper wakes up.
    pub fn advance(&mut self, hours: f64) {
        if !(hours.is_finite() && hours > 0.0) {
            return;
        }
        let c = &self.config;

        let mut hunger_rate = c.hunger_rate;
        if self.has_trait(Trait::Hungry) {
            hunger_rate *= 1.5;
        }
        self.attributes.hunger = (self.attributes.hunger + hunger_rate * hours).min(100.0);

        let mut woke = false;
        if self.sleeping {
            self.sleep_hours += hours;
            self.attributes.energy = (self.attributes.energy + c.energy_rate_sleep * hours).min(100.0);
            woke = self.attributes.energy >= 100.0;
        } else {
            self.attributes.energy = (self.attributes.energy - c.energy_rate_active * hours).max(0.0);
        }

        let mut hygiene_rate = c.hygiene_rate;
        if self.has_trait(Trait::Clean) {
            hygiene_rate *= 0.5;
        }
        self.attributes.hygiene = (self.attributes.hygiene - hygiene_rate * hours).max(0.0);

        let mut happiness = 0.0;
        if self.attributes.hunger > c.hunger_threshold {
            happiness -= c.happiness_hunger_penalty * hours;
        } else if self.attributes.hunger < c.well_fed_threshold {
            happiness += c.happiness_hunger_bonus * hours;
        }
        if self.attributes.hygiene < c.hygiene_threshold {
            happiness -= c.happiness_hygiene_penalty * hours;
        }
        if self.attributes.energy < c.energy_threshold {
            happiness -= c.happiness_energy_penalty * hours;
        }
        self.attributes.happiness = clamp_need(self.attributes.happiness + happiness);

        if woke {
            self.wake_up();
        }

        self.age_days += hours / 24.0;
        self.stage = LifeStage::from_age(self.age_days);
        self.attributes = self.attributes.clamped();
        self.mood = Mood::from_levels(self.attributes.happiness, self.attributes.health);
    }
}

impl TreeContext for Pet {
    fn need(&self, need: Need) -> f64 {
        self.attributes.get(need)
    }

    fn is_sleeping(&self) -> bool {
        self.sleeping
    }

    fn perform(&mut self, action: PetAction) -> bool {
        Pet::perform(self, action).success
    }
}
