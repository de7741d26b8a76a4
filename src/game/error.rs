use thiserror::Error;

use super::{GridPosition, PlayerId, UnitId};

/// Roster corruption. These are programmer faults: the reducer never
/// produces them from legal play, so callers should treat them as fatal.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterError {
    #[error("Unit not found: {0}")]
    UnitNotFound(UnitId),

    #[error("Duplicate unit: {0}")]
    DuplicateUnit(UnitId),
}

#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("A scenario needs exactly two players, found {0}")]
    PlayerCount(usize),

    #[error("Duplicate player id: {0}")]
    DuplicatePlayer(PlayerId),

    #[error("Unit {unit} belongs to unknown player {player}")]
    UnknownPlayer { unit: UnitId, player: PlayerId },

    #[error("Unit {unit} has max hp {max_hp}; it must be between 1 and {}", i32::MAX)]
    InvalidMaxHp { unit: UnitId, max_hp: u32 },

    #[error("Unit {unit} placed off the grid at {at}")]
    OutOfBounds { unit: UnitId, at: GridPosition },

    #[error("Unit {unit} placed on impassable terrain at {at}")]
    Impassable { unit: UnitId, at: GridPosition },

    #[error("Units {first} and {second} share cell {at}")]
    Stacked {
        first: UnitId,
        second: UnitId,
        at: GridPosition,
    },

    #[error("Terrain grid is empty")]
    EmptyMap,

    #[error("Terrain row {row} has {found} cells, expected {expected}")]
    RaggedTerrain {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Unknown terrain symbol '{symbol}' at row {row}, column {col}")]
    UnknownTerrain { symbol: char, row: usize, col: usize },

    #[error("No armament loadout for {0:?} units")]
    MissingLoadout(super::UnitCategory),

    #[error(transparent)]
    Roster(#[from] RosterError),

    #[error("Scenario parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum SaveError {
    #[error("Unsupported save version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("No save found in slot {0}")]
    MissingSlot(u32),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
