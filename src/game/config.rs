//! Match configuration
//!
//! Which seat the computer plays, how well it plays, and how fast the host
//! dispatches its moves. Defaults are embedded at compile time; a RON file on
//! disk can override any subset of fields.

use bevy::log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{AiConfig, AiWeights, ConfigError, Difficulty, PlayerId};

const DEFAULT_MATCH_RON: &str = include_str!("../../assets/config/match.ron");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    pub ai_player: PlayerId,
    pub difficulty: Difficulty,
    pub weights: AiWeights,
    /// Seconds between dispatched AI actions. Zero dispatches every frame.
    pub action_delay_secs: f32,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            ai_player: 2,
            difficulty: Difficulty::default(),
            weights: AiWeights::default(),
            action_delay_secs: 0.5,
        }
    }
}

impl MatchConfig {
    /// Load the embedded defaults
    pub fn load_defaults() -> Self {
        ron::from_str(DEFAULT_MATCH_RON).expect("Failed to parse embedded match.ron")
    }

    pub fn from_ron(source: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(source)?)
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config = Self::from_ron(&std::fs::read_to_string(path)?)?;
        info!("Loaded match config from {}", path.display());
        Ok(config)
    }

    /// Use `path` if it exists and parses, the embedded defaults otherwise
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            info!("No match config at {}, using defaults", path.display());
            return Self::load_defaults();
        }
        match Self::load_from_file(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Failed to load {}: {}", path.display(), e);
                Self::load_defaults()
            }
        }
    }

    pub fn ai_config(&self) -> AiConfig {
        AiConfig {
            difficulty: self.difficulty,
            weights: self.weights.clone(),
        }
    }
}
