use serde::{Deserialize, Serialize};

use super::{Armament, GridPosition, Roster, Terrain, Unit, UnitCategory};

/// Modifiers can never absorb more than this share of a hit
pub const MAX_DEFENSE_REDUCTION: f64 = 0.9;

const ASSAULT_BONUS: f64 = 0.2;
const FORTIFIED_BONUS: f64 = 0.1;
const CAMOUFLAGE_BONUS: f64 = 0.2;

/// Category abilities that fired during a damage calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageModifier {
    /// Fighter attacking after it moved
    Assault,
    /// Defender has a friendly tank next to it
    FortifiedPosition,
    /// Soldier defending in forest
    Camouflage,
}

impl DamageModifier {
    pub fn label(&self) -> &'static str {
        match self {
            DamageModifier::Assault => "+20% assault",
            DamageModifier::FortifiedPosition => "+10% fortified position",
            DamageModifier::Camouflage => "+20% camouflage",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageReport {
    pub damage: i32,
    pub modifiers: Vec<DamageModifier>,
}

pub fn terrain_defense(terrain: Terrain) -> f64 {
    terrain.defense_reduction()
}

/// Calculate the damage `armament` deals when `attacker` fires at `defender`.
///
/// `units` is the whole roster; it is only consulted for the tank's
/// adjacency ability. No randomness: replays must reproduce every hit.
pub fn calculate_damage(
    attacker: &Unit,
    defender: &Unit,
    armament: &Armament,
    defender_terrain: Terrain,
    units: &Roster,
) -> DamageReport {
    let mut modifiers = Vec::new();
    let mut attack_multiplier = 1.0;
    let mut defense = terrain_defense(defender_terrain);

    if attacker.spec.category == UnitCategory::Fighter && attacker.status.moved {
        attack_multiplier += ASSAULT_BONUS;
        modifiers.push(DamageModifier::Assault);
    }

    let fortified = units.iter().any(|u| {
        u.id() != defender.id()
            && u.player == defender.player
            && u.spec.category == UnitCategory::Tank
            && u.status.position.distance_to(&defender.status.position) == 1
    });
    if fortified {
        defense += FORTIFIED_BONUS;
        modifiers.push(DamageModifier::FortifiedPosition);
    }

    if defender.spec.category == UnitCategory::Soldier && defender_terrain == Terrain::Forest {
        defense += CAMOUFLAGE_BONUS;
        modifiers.push(DamageModifier::Camouflage);
    }

    let defense = defense.min(MAX_DEFENSE_REDUCTION);
    let damage = (f64::from(armament.value) * attack_multiplier * (1.0 - defense)).floor() as i32;

    DamageReport { damage, modifiers }
}

/// Fire is not path-costed: terrain never blocks a shot.
pub fn is_within_attack_range(from: GridPosition, to: GridPosition, range: u32) -> bool {
    from.distance_to(&to) <= range
}
