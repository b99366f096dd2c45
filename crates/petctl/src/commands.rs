// Command implementations for petctl

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::info;

use pet_agent::{learning_path, load_pet, save_pet, BehaviorTree, IntelligentPet, Pet, PetConfig};
use pet_rl_agent::{QLearningConfig, QLearningEngine, RandomPolicy};
use pet_rl_core::{PetActionSpace, Persist};

pub struct SimulateOptions {
    pub name: String,
    pub species: String,
    pub ticks: u32,
    pub seed: Option<u64>,
    pub config: Option<PathBuf>,
    pub save: Option<PathBuf>,
    pub random_policy: bool,
    pub tick_seconds: u64,
}

pub async fn simulate(options: SimulateOptions) -> Result<()> {
    let config = match &options.config {
        Some(path) => PetConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => PetConfig::default(),
    };

    let existing = options.save.as_deref().filter(|p| p.exists());
    let pet = match existing {
        Some(path) => load_pet(path, config.clone())
            .await
            .with_context(|| format!("Failed to load pet from {}", path.display()))?,
        None => {
            let mut rng = options
                .seed
                .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
            Pet::new(&options.name, &options.species, config.clone(), &mut rng)
        }
    };

    let start = Instant::now();
    let mut agent = match options.seed {
        Some(seed) => IntelligentPet::with_seed(pet, config.clone(), start, seed),
        None => IntelligentPet::new(pet, config.clone(), start),
    }
    .context("Failed to set up the pet")?;

    if let Some(path) = existing {
        if !agent.load_learning(path).await {
            println!("⚠️  No usable learning data, starting fresh");
        }
    }
    if options.random_policy {
        let space = PetActionSpace::new(config.learning.actions.iter().copied());
        agent = agent.with_policy(Box::new(RandomPolicy::new(space, options.seed)));
    }

    println!("🐾 Simulating {} the {}", agent.pet().name, agent.pet().species);
    println!("   Policy: {}", agent.policy_name());
    println!("   Ticks: {} x {}s", options.ticks, options.tick_seconds);

    let tick = Duration::from_secs(options.tick_seconds);
    let mut now = start;
    let mut counts: BTreeMap<String, u32> = BTreeMap::new();
    let mut total_reward = 0.0;
    let mut steps = 0u32;
    let mut tree_steps = 0u32;

    for _ in 0..options.ticks {
        now += tick;
        let report = agent.update(now);
        if let Some(step) = report.step {
            steps += 1;
            *counts.entry(step.action.to_string()).or_default() += 1;
            match step.reward {
                Some(reward) => total_reward += reward,
                None => tree_steps += 1,
            }
        }
    }

    let attributes = agent.pet().attributes();
    println!("\n📊 Summary");
    println!("   Actions taken: {steps} ({tree_steps} from the behavior tree)");
    println!("   Total reward: {total_reward:.2}");
    for (action, count) in &counts {
        println!("   {action:<8} {count}");
    }
    println!(
        "   Needs: health {:.0}, hunger {:.0}, energy {:.0}, hygiene {:.0}, happiness {:.0}",
        attributes.health,
        attributes.hunger,
        attributes.energy,
        attributes.hygiene,
        attributes.happiness
    );

    let status = agent.status();
    println!("\n{}", serde_json::to_string_pretty(&status)?);

    if let Some(path) = &options.save {
        save_pet(agent.pet(), path)
            .await
            .with_context(|| format!("Failed to save pet to {}", path.display()))?;
        let learning = agent
            .save_learning(path)
            .await
            .context("Failed to save learning data")?;
        println!("\n✅ Saved {} and {}", path.display(), learning.display());
    }

    Ok(())
}

pub async fn inspect(save: &Path, states: usize) -> Result<()> {
    let path = learning_path(save);
    let mut engine = QLearningEngine::new(QLearningConfig::default());
    engine
        .load(&path)
        .await
        .with_context(|| format!("Failed to load learning data from {}", path.display()))?;
    info!(path = %path.display(), "Inspecting learning data");

    let actions = engine.config().actions.clone();
    let table = engine.table_a();
    let learned: Vec<_> = table
        .to_rows()
        .into_iter()
        .take(states)
        .map(|row| {
            json!({
                "state": row.state.to_vec(),
                "best": table.best_action(&row.state, &actions).map(|a| a.to_string()),
                "values": row.values,
            })
        })
        .collect();

    let report = json!({
        "file": path.display().to_string(),
        "checkpoint": engine.last_checkpoint().map(|id| id.to_string()),
        "stats": engine.stats(),
        "states": learned,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

pub fn print_tree() -> Result<()> {
    let tree = BehaviorTree::pet_default();
    println!("{}", serde_json::to_string_pretty(&tree)?);
    Ok(())
}
