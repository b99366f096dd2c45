//! Pet save files, kept separate from learning data

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use pet_rl_core::{RLError, Result};

use crate::config::PetConfig;
use crate::pet::Pet;

/// Save file format version
pub const FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct PetRecord {
    version: u32,
    saved_at: DateTime<Utc>,
    pet: Pet,
}

/// Write a pet to `path` as JSON
pub async fn save_pet(pet: &Pet, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let record = PetRecord {
        version: FORMAT_VERSION,
        saved_at: Utc::now(),
        pet: pet.clone(),
    };
    tokio::fs::write(path, serde_json::to_vec_pretty(&record)?).await?;
    info!(pet = %pet.name, path = %path.display(), "Saved pet");
    Ok(())
}

/// Read a pet from `path`, attaching `config`
pub async fn load_pet(path: &Path, config: PetConfig) -> Result<Pet> {
    let data = tokio::fs::read(path).await?;
    let record: PetRecord = serde_json::from_slice(&data)?;
    if record.version > FORMAT_VERSION {
        return Err(RLError::Persistence(format!(
            "unsupported pet file version {}",
            record.version
        )));
    }
    let mut pet = record.pet;
    pet.set_config(config);
    info!(pet = %pet.name, path = %path.display(), saved_at = %record.saved_at, "Loaded pet");
    Ok(pet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pet::{FoodKind, Trait};
    use pet_rl_core::Need;
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("mochi.json");

        let mut traits = BTreeMap::new();
        traits.insert(Trait::Curious, 0.75);
        let mut pet = Pet::with_traits("Mochi", "cat", PetConfig::default(), traits);
        pet.set_need(Need::Hunger, 60.0);
        pet.feed(FoodKind::Snack);

        save_pet(&pet, &path).await.unwrap();
        let loaded = load_pet(&path, PetConfig::default()).await.unwrap();

        assert_eq!(loaded.name, "Mochi");
        assert_eq!(loaded.attributes(), pet.attributes());
        assert_eq!(loaded.personality(), pet.personality());
        assert_eq!(loaded.memories().count(), 1);
    }

    #[tokio::test]
    async fn test_newer_version_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("future.json");
        let pet = Pet::with_traits("Rex", "dog", PetConfig::default(), BTreeMap::new());
        save_pet(&pet, &path).await.unwrap();

        let raw = tokio::fs::read_to_string(&path).await.unwrap();
        let bumped = raw.replacen("\"version\": 1", "\"version\": 99", 1);
        tokio::fs::write(&path, bumped).await.unwrap();

        assert!(matches!(
            load_pet(&path, PetConfig::default()).await,
            Err(RLError::Persistence(_))
        ));
    }
}
