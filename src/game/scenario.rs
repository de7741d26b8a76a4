//! Scenario definitions
//!
//! A scenario is everything a match starts from: the terrain grid, the two
//! players, and the opening roster. Scenarios are authored as RON documents;
//! the tutorial battle is embedded at compile time so a match can always be
//! started without touching the filesystem.

use bevy::log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use super::{
    Armament, GameMap, GridPosition, Player, PlayerId, Players, Roster, ScenarioError, Terrain,
    Unit, UnitCategory, UnitId, UnitSpec,
};

// ============================================================================
// EMBEDDED DATA
// ============================================================================

const TUTORIAL_RON: &str = include_str!("../../assets/scenarios/tutorial.ron");

// ============================================================================
// DOCUMENT FORMAT
// ============================================================================

/// On-disk scenario document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioData {
    pub id: String,
    pub name: String,
    /// One string per row, top to bottom, using `Terrain` symbols
    pub terrain: Vec<String>,
    pub players: Vec<Player>,
    /// Armament list handed to every unit of a category
    pub loadouts: Vec<LoadoutData>,
    pub units: Vec<PlacementData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadoutData {
    pub category: UnitCategory,
    pub armaments: Vec<Armament>,
}

/// A unit placed on the map at full hp and en
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacementData {
    pub id: UnitId,
    pub name: String,
    pub category: UnitCategory,
    pub movement_range: u32,
    pub max_hp: u32,
    pub max_en: u32,
    pub player: PlayerId,
    pub at: GridPosition,
}

impl ScenarioData {
    fn parse_terrain(&self) -> Result<GameMap, ScenarioError> {
        let expected = self.terrain.first().map(|row| row.chars().count()).unwrap_or(0);
        if expected == 0 {
            return Err(ScenarioError::EmptyMap);
        }

        let mut map = GameMap::new(expected as u32, self.terrain.len() as u32);
        for (row, line) in self.terrain.iter().enumerate() {
            let found = line.chars().count();
            if found != expected {
                return Err(ScenarioError::RaggedTerrain { row, expected, found });
            }
            for (col, symbol) in line.chars().enumerate() {
                let terrain = Terrain::from_symbol(symbol)
                    .ok_or(ScenarioError::UnknownTerrain { symbol, row, col })?;
                map.set(col as i32, row as i32, terrain);
            }
        }
        Ok(map)
    }

    fn spawn_units(&self) -> Result<Vec<Unit>, ScenarioError> {
        self.units
            .iter()
            .map(|placement| {
                let loadout = self
                    .loadouts
                    .iter()
                    .find(|l| l.category == placement.category)
                    .ok_or(ScenarioError::MissingLoadout(placement.category))?;

                let spec = UnitSpec {
                    id: placement.id,
                    name: placement.name.clone(),
                    category: placement.category,
                    movement_range: placement.movement_range,
                    max_hp: placement.max_hp,
                    max_en: placement.max_en,
                    armaments: loadout.armaments.clone(),
                };
                Ok(Unit::new(spec, placement.player, placement.at))
            })
            .collect()
    }
}

// ============================================================================
// SCENARIO
// ============================================================================

/// A validated battle setup. Immutable for the whole match.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub id: String,
    pub name: String,
    pub map: GameMap,
    pub players: Players,
    /// Opening roster
    pub units: Roster,
}

impl Scenario {
    /// Build a scenario, checking that every unit has a legal starting cell.
    pub fn new(
        id: &str,
        name: &str,
        map: GameMap,
        players: Vec<Player>,
        units: Vec<Unit>,
    ) -> Result<Self, ScenarioError> {
        let players = match <[Player; 2]>::try_from(players) {
            Ok([first, second]) => {
                if first.id == second.id {
                    return Err(ScenarioError::DuplicatePlayer(first.id));
                }
                Players::new(first, second)
            }
            Err(players) => return Err(ScenarioError::PlayerCount(players.len())),
        };

        let units = Roster::from_units(units)?;

        let mut cells: HashMap<GridPosition, UnitId> = HashMap::new();
        for unit in units.iter() {
            let at = unit.position();
            if unit.spec.max_hp == 0 || i32::try_from(unit.spec.max_hp).is_err() {
                return Err(ScenarioError::InvalidMaxHp {
                    unit: unit.id(),
                    max_hp: unit.spec.max_hp,
                });
            }
            if !players.contains(unit.player) {
                return Err(ScenarioError::UnknownPlayer {
                    unit: unit.id(),
                    player: unit.player,
                });
            }
            match map.terrain_at(at) {
                None => return Err(ScenarioError::OutOfBounds { unit: unit.id(), at }),
                Some(terrain) if !terrain.is_passable() => {
                    return Err(ScenarioError::Impassable { unit: unit.id(), at })
                }
                Some(_) => {}
            }
            if let Some(&first) = cells.get(&at) {
                return Err(ScenarioError::Stacked {
                    first,
                    second: unit.id(),
                    at,
                });
            }
            cells.insert(at, unit.id());
        }

        Ok(Self {
            id: id.to_string(),
            name: name.to_string(),
            map,
            players,
            units,
        })
    }

    pub fn from_data(data: &ScenarioData) -> Result<Self, ScenarioError> {
        let map = data.parse_terrain()?;
        let units = data.spawn_units()?;
        Self::new(&data.id, &data.name, map, data.players.clone(), units)
    }

    pub fn from_ron(source: &str) -> Result<Self, ScenarioError> {
        let data: ScenarioData = ron::from_str(source)?;
        Self::from_data(&data)
    }

    /// Load a scenario document from disk
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        let scenario = Self::from_ron(&source)?;
        info!(
            "Loaded scenario '{}' from {} ({}x{}, {} units)",
            scenario.id,
            path.display(),
            scenario.map.width,
            scenario.map.height,
            scenario.units.len()
        );
        Ok(scenario)
    }

    /// The built-in tutorial battle
    pub fn tutorial() -> Self {
        Self::from_ron(TUTORIAL_RON).expect("Failed to parse embedded tutorial.ron")
    }
}
