use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::{PlayerId, RosterError};

pub type UnitId = u32;

/// A cell on the battle grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct GridPosition {
    pub x: i32,
    pub y: i32,
}

impl GridPosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance
    pub fn distance_to(&self, other: &GridPosition) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// The four cardinal neighbours (may lie off-grid)
    pub fn neighbors(&self) -> [GridPosition; 4] {
        [
            GridPosition::new(self.x, self.y + 1),
            GridPosition::new(self.x, self.y - 1),
            GridPosition::new(self.x + 1, self.y),
            GridPosition::new(self.x - 1, self.y),
        ]
    }
}

impl fmt::Display for GridPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Facing, derived from the last step a unit took
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    Up,
    Down,
    Left,
    Right,
}

impl Orientation {
    /// Vertical displacement wins ties; a unit that never moved faces up.
    pub fn between(previous: GridPosition, current: GridPosition) -> Self {
        let dx = current.x - previous.x;
        let dy = current.y - previous.y;
        if dy.abs() >= dx.abs() {
            if dy > 0 {
                Orientation::Down
            } else {
                Orientation::Up
            }
        } else if dx > 0 {
            Orientation::Right
        } else {
            Orientation::Left
        }
    }
}

/// Unit categories. Each one carries a combat ability (see `calculate_damage`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnitCategory {
    /// Assault: +20% attack after moving
    Fighter,
    /// Fortified position: adjacent friendly units take 10% less damage
    Tank,
    /// Camouflage: takes 20% less damage in forest
    Soldier,
}

impl UnitCategory {
    pub fn name(&self) -> &'static str {
        match self {
            UnitCategory::Fighter => "Fighter",
            UnitCategory::Tank => "Tank",
            UnitCategory::Soldier => "Soldier",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Armament {
    pub name: String,
    /// Base damage
    pub value: u32,
    /// Manhattan reach
    pub range: u32,
    pub consumed_en: u32,
}

impl Armament {
    pub fn new(name: &str, value: u32, range: u32, consumed_en: u32) -> Self {
        Self {
            name: name.to_string(),
            value,
            range,
            consumed_en,
        }
    }
}

/// Immutable unit definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSpec {
    pub id: UnitId,
    pub name: String,
    pub category: UnitCategory,
    pub movement_range: u32,
    pub max_hp: u32,
    pub max_en: u32,
    /// Order matters: actions refer to armaments by index
    pub armaments: Vec<Armament>,
}

/// Mutable per-match unit state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitStatus {
    pub hp: i32,
    pub en: f64,
    pub position: GridPosition,
    pub previous_position: GridPosition,
    /// Where `UndoMove` sends the unit back to
    pub initial_position: GridPosition,
    pub moved: bool,
    /// Implies `moved`
    pub attacked: bool,
}

impl UnitStatus {
    pub fn fresh(hp: i32, en: f64, position: GridPosition) -> Self {
        Self {
            hp,
            en,
            position,
            previous_position: position,
            initial_position: position,
            moved: false,
            attacked: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub spec: UnitSpec,
    pub status: UnitStatus,
    pub player: PlayerId,
}

impl Unit {
    /// Spawn a unit at full hp and en. Hp saturates at `i32::MAX`;
    /// `Scenario::new` refuses such specs outright.
    pub fn new(spec: UnitSpec, player: PlayerId, position: GridPosition) -> Self {
        let hp = i32::try_from(spec.max_hp).unwrap_or(i32::MAX);
        let status = UnitStatus::fresh(hp, f64::from(spec.max_en), position);
        Self { spec, status, player }
    }

    pub fn id(&self) -> UnitId {
        self.spec.id
    }

    pub fn position(&self) -> GridPosition {
        self.status.position
    }

    pub fn hp_percentage(&self) -> f64 {
        if self.spec.max_hp == 0 {
            return 0.0;
        }
        f64::from(self.status.hp) / f64::from(self.spec.max_hp)
    }

    pub fn armament(&self, index: usize) -> Option<&Armament> {
        self.spec.armaments.get(index)
    }

    pub fn can_afford(&self, armament: &Armament) -> bool {
        f64::from(armament.consumed_en) <= self.status.en
    }

    /// Both moved and attacked: nothing left to do until the turn ends
    pub fn is_exhausted(&self) -> bool {
        self.status.moved && self.status.attacked
    }

    pub fn orientation(&self) -> Orientation {
        Orientation::between(self.status.previous_position, self.status.position)
    }

    /// Called at every turn end
    pub fn reset_turn(&mut self) {
        self.status.moved = false;
        self.status.attacked = false;
        self.status.initial_position = self.status.position;
    }
}

/// All units on the field, keyed by id.
///
/// Ids are unique by construction; iteration is in ascending id order, which
/// keeps everything built on top of the roster deterministic.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<Unit>", into = "Vec<Unit>")]
pub struct Roster {
    units: BTreeMap<UnitId, Unit>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_units(units: impl IntoIterator<Item = Unit>) -> Result<Self, RosterError> {
        let mut roster = Self::new();
        for unit in units {
            roster.insert(unit)?;
        }
        Ok(roster)
    }

    pub fn insert(&mut self, unit: Unit) -> Result<(), RosterError> {
        let id = unit.id();
        if self.units.contains_key(&id) {
            return Err(RosterError::DuplicateUnit(id));
        }
        self.units.insert(id, unit);
        Ok(())
    }

    pub fn get(&self, id: UnitId) -> Result<&Unit, RosterError> {
        self.units.get(&id).ok_or(RosterError::UnitNotFound(id))
    }

    pub fn get_mut(&mut self, id: UnitId) -> Result<&mut Unit, RosterError> {
        self.units.get_mut(&id).ok_or(RosterError::UnitNotFound(id))
    }

    pub fn find(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    pub fn contains(&self, id: UnitId) -> bool {
        self.units.contains_key(&id)
    }

    pub fn remove(&mut self, id: UnitId) -> Result<Unit, RosterError> {
        self.units.remove(&id).ok_or(RosterError::UnitNotFound(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Unit> {
        self.units.values_mut()
    }

    pub fn owned_by(&self, player: PlayerId) -> impl Iterator<Item = &Unit> {
        self.iter().filter(move |u| u.player == player)
    }

    pub fn count_for(&self, player: PlayerId) -> usize {
        self.owned_by(player).count()
    }

    pub fn occupant(&self, pos: GridPosition) -> Option<&Unit> {
        self.iter().find(|u| u.status.position == pos)
    }

    pub fn is_occupied(&self, pos: GridPosition) -> bool {
        self.occupant(pos).is_some()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl TryFrom<Vec<Unit>> for Roster {
    type Error = RosterError;

    fn try_from(units: Vec<Unit>) -> Result<Self, Self::Error> {
        Roster::from_units(units)
    }
}

impl From<Roster> for Vec<Unit> {
    fn from(roster: Roster) -> Self {
        roster.units.into_values().collect()
    }
}
