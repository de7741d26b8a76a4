use bevy::log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::{Difficulty, GameState, SaveError};

/// Resumable match snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveGameData {
    pub version: u32,
    /// The scenario must be loaded separately; only its id is stored
    pub scenario_id: String,
    pub game_state: GameState,
    pub difficulty: Difficulty,
}

impl SaveGameData {
    pub const CURRENT_VERSION: u32 = 1;

    pub fn new(scenario_id: &str, game_state: GameState, difficulty: Difficulty) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            scenario_id: scenario_id.to_string(),
            game_state,
            difficulty,
        }
    }

    pub fn to_json(&self) -> Result<String, SaveError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SaveError> {
        let data: SaveGameData = serde_json::from_str(json)?;
        if data.version != Self::CURRENT_VERSION {
            return Err(SaveError::UnsupportedVersion {
                found: data.version,
                expected: Self::CURRENT_VERSION,
            });
        }
        Ok(data)
    }
}

// ============================================================================
// STORAGE
// ============================================================================

/// Numbered save slots stored as JSON files under one directory
#[derive(Debug, Clone)]
pub struct SaveStore {
    root: PathBuf,
}

impl Default for SaveStore {
    fn default() -> Self {
        Self::new("saves")
    }
}

impl SaveStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn slot_path(&self, slot: u32) -> PathBuf {
        self.root.join(format!("save_{}.json", slot))
    }

    pub fn save(&self, slot: u32, data: &SaveGameData) -> Result<(), SaveError> {
        fs::create_dir_all(&self.root)?;
        let path = self.slot_path(slot);
        fs::write(&path, data.to_json()?)?;
        info!("Game saved to {}", path.display());
        Ok(())
    }

    pub fn load(&self, slot: u32) -> Result<SaveGameData, SaveError> {
        let path = self.slot_path(slot);
        if !path.exists() {
            return Err(SaveError::MissingSlot(slot));
        }
        let data = SaveGameData::from_json(&fs::read_to_string(&path)?)?;
        info!("Game loaded from {}", path.display());
        Ok(data)
    }

    pub fn has_save(&self, slot: u32) -> bool {
        self.slot_path(slot).exists()
    }

    /// Removing an empty slot is not an error
    pub fn delete(&self, slot: u32) -> Result<(), SaveError> {
        let path = self.slot_path(slot);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{apply, GameAction, GridPosition, Scenario};

    fn midgame() -> GameState {
        let scenario = Scenario::tutorial();
        let state = GameState::new(&scenario);
        let state = apply(
            &state,
            &GameAction::Move { unit: 10, to: GridPosition::new(3, 7) },
            &scenario,
        )
        .unwrap();
        apply(&state, &GameAction::TurnEnd, &scenario).unwrap()
    }

    #[test]
    fn test_json_round_trip_keeps_everything() {
        let data = SaveGameData::new("tutorial", midgame(), Difficulty::Hard);
        let restored = SaveGameData::from_json(&data.to_json().unwrap()).unwrap();
        assert_eq!(restored, data);
        assert_eq!(restored.game_state.active_player, 2);
    }

    #[test]
    fn test_rejects_other_versions() {
        let mut data = SaveGameData::new("tutorial", midgame(), Difficulty::Easy);
        data.version = 7;
        let json = serde_json::to_string(&data).unwrap();

        assert!(matches!(
            SaveGameData::from_json(&json),
            Err(SaveError::UnsupportedVersion { found: 7, expected: 1 })
        ));
        assert!(matches!(SaveGameData::from_json("{not json"), Err(SaveError::Serde(_))));
    }

    #[test]
    fn test_slots_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = SaveStore::new(dir.path().join("saves"));
        let data = SaveGameData::new("tutorial", midgame(), Difficulty::Normal);

        assert!(!store.has_save(1));
        assert!(matches!(store.load(1), Err(SaveError::MissingSlot(1))));

        store.save(1, &data).unwrap();
        assert!(store.has_save(1));
        assert!(store.root().join("save_1.json").exists());
        assert_eq!(store.load(1).unwrap(), data);
        assert!(!store.has_save(2));

        store.delete(1).unwrap();
        assert!(!store.has_save(1));
        store.delete(1).unwrap();
    }
}
