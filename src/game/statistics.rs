//! After-action report, rebuilt from the action history.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{
    calculate_damage, GameAction, PlayerId, Roster, Scenario, Terrain, UnitCategory, UnitId,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitStatEntry {
    pub name: String,
    pub category: UnitCategory,
    pub player: PlayerId,
    pub damage_dealt: i32,
    pub kills: u32,
    pub damage_taken: i32,
    pub alive: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStatEntry {
    pub player: PlayerId,
    pub total_damage: i32,
    pub total_kills: u32,
    pub units_lost: u32,
    pub units_remaining: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleStatistics {
    /// Full rounds, both players' halves counted as one
    pub turn_count: u32,
    pub per_unit: BTreeMap<UnitId, UnitStatEntry>,
    /// Highest damage dealer, if anyone dealt damage at all
    pub mvp: Option<UnitId>,
    /// In scenario player order
    pub per_player: Vec<PlayerStatEntry>,
}

/// Replay `history` on a copy of `initial_units` and tally the fighting.
///
/// Damage is re-derived with the same model the reducer uses. Attacks that
/// name a unit no longer on the field are skipped.
pub fn compute_statistics(
    history: &[GameAction],
    initial_units: &Roster,
    scenario: &Scenario,
) -> BattleStatistics {
    let mut shadow = initial_units.clone();
    let mut per_unit: BTreeMap<UnitId, UnitStatEntry> = initial_units
        .iter()
        .map(|unit| {
            let entry = UnitStatEntry {
                name: unit.spec.name.clone(),
                category: unit.spec.category,
                player: unit.player,
                damage_dealt: 0,
                kills: 0,
                damage_taken: 0,
                alive: true,
            };
            (unit.id(), entry)
        })
        .collect();

    let mut half_turns = 1u32;

    for action in history {
        match *action {
            GameAction::TurnEnd => {
                shadow.iter_mut().for_each(|unit| unit.reset_turn());
                half_turns += 1;
            }
            GameAction::Move { unit, to } => {
                if let Ok(unit) = shadow.get_mut(unit) {
                    unit.status.previous_position = unit.status.position;
                    unit.status.position = to;
                    unit.status.moved = true;
                }
            }
            GameAction::UndoMove { unit } => {
                if let Ok(unit) = shadow.get_mut(unit) {
                    unit.status.position = unit.status.initial_position;
                    unit.status.previous_position = unit.status.initial_position;
                    unit.status.moved = false;
                }
            }
            GameAction::Attack {
                unit,
                target,
                armament,
            } => {
                let (Some(attacker), Some(defender)) = (shadow.find(unit), shadow.find(target)) else {
                    continue;
                };
                let Some(weapon) = attacker.armament(armament) else {
                    continue;
                };

                let terrain = scenario
                    .map
                    .terrain_at(defender.position())
                    .unwrap_or(Terrain::Plain);
                let damage = calculate_damage(attacker, defender, weapon, terrain, &shadow).damage;
                let remaining = defender.status.hp - damage;

                if let Some(entry) = per_unit.get_mut(&unit) {
                    entry.damage_dealt += damage;
                    if remaining <= 0 {
                        entry.kills += 1;
                    }
                }
                if let Some(entry) = per_unit.get_mut(&target) {
                    entry.damage_taken += damage;
                    entry.alive = remaining > 0;
                }

                if remaining <= 0 {
                    let _ = shadow.remove(target);
                } else if let Ok(defender) = shadow.get_mut(target) {
                    defender.status.hp = remaining;
                }
                if let Ok(attacker) = shadow.get_mut(unit) {
                    attacker.status.attacked = true;
                    attacker.status.moved = true;
                }
            }
        }
    }

    let per_player = scenario
        .players
        .iter()
        .map(|player| {
            let mut totals = PlayerStatEntry {
                player: player.id,
                total_damage: 0,
                total_kills: 0,
                units_lost: 0,
                units_remaining: 0,
            };
            for entry in per_unit.values().filter(|e| e.player == player.id) {
                totals.total_damage += entry.damage_dealt;
                totals.total_kills += entry.kills;
                if entry.alive {
                    totals.units_remaining += 1;
                } else {
                    totals.units_lost += 1;
                }
            }
            totals
        })
        .collect();

    // Strictly greater: the lowest id keeps a tie
    let mut mvp = None;
    let mut best = 0;
    for (&id, entry) in &per_unit {
        if entry.damage_dealt > best {
            best = entry.damage_dealt;
            mvp = Some(id);
        }
    }

    BattleStatistics {
        turn_count: half_turns.div_ceil(2),
        per_unit,
        mvp,
        per_player,
    }
}
