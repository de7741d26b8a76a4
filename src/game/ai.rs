//! Computer opponent.
//!
//! The planner decides a whole half-turn at once. Units act in ascending id
//! order against a `SimulationOverlay`, so a kill planned by one unit frees
//! the cell and removes the target for every unit after it, without touching
//! the real roster.

use bevy::log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::{
    calculate_damage, calculate_movement_range, is_within_attack_range, GameAction, GameMap,
    GridPosition, PlayerId, Roster, Terrain, Unit, UnitId,
};

// ============================================================================
// AI CONFIGURATION & TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Difficulty {
    /// Maximise raw damage, always advance
    #[default]
    Easy,
    /// Go for kills, then wounded targets
    Normal,
    /// Normal plus retreat, focus fire and cover-seeking
    Hard,
}

impl Difficulty {
    pub fn name(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }
}

/// Tuning knobs for the planner's heuristics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiWeights {
    /// Hard units below this share of max hp fall back instead of advancing
    pub retreat_hp_ratio: f64,
    pub kill_bonus: f64,
    /// Scaled by the target's missing hp share
    pub wounded_weight: f64,
    /// Per earlier attack on the same target this turn
    pub focus_fire_bonus: f64,
    pub forest_score: u32,
    pub mountain_score: u32,
}

impl Default for AiWeights {
    fn default() -> Self {
        Self {
            retreat_hp_ratio: 0.3,
            kill_bonus: 10000.0,
            wounded_weight: 1000.0,
            focus_fire_bonus: 500.0,
            forest_score: 2,
            mountain_score: 3,
        }
    }
}

impl AiWeights {
    /// How much a hard AI likes ending its move on `terrain`
    pub fn terrain_score(&self, terrain: Terrain) -> u32 {
        match terrain {
            Terrain::Forest => self.forest_score,
            Terrain::Mountain => self.mountain_score,
            Terrain::Plain | Terrain::Water => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AiConfig {
    pub difficulty: Difficulty,
    #[serde(default)]
    pub weights: AiWeights,
}

impl AiConfig {
    pub fn new(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            weights: AiWeights::default(),
        }
    }
}

/// One step of an AI plan. Dispatch through the reducer as a `GameAction`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AiAction {
    Move {
        unit: UnitId,
        to: GridPosition,
    },
    Attack {
        unit: UnitId,
        target: UnitId,
        armament: usize,
    },
    TurnEnd,
}

impl From<AiAction> for GameAction {
    fn from(action: AiAction) -> Self {
        match action {
            AiAction::Move { unit, to } => GameAction::Move { unit, to },
            AiAction::Attack {
                unit,
                target,
                armament,
            } => GameAction::Attack {
                unit,
                target,
                armament,
            },
            AiAction::TurnEnd => GameAction::TurnEnd,
        }
    }
}

// ============================================================================
// SIMULATION OVERLAY
// ============================================================================

/// Planning-time view of the battlefield: where units will be and how much
/// hp they will have once the actions planned so far are applied.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SimulationOverlay {
    positions: BTreeMap<UnitId, GridPosition>,
    hp: BTreeMap<UnitId, i32>,
    destroyed: BTreeSet<UnitId>,
    occupied: BTreeSet<GridPosition>,
    /// Planned attacks per target
    focus: BTreeMap<UnitId, u32>,
}

impl SimulationOverlay {
    pub fn from_roster(units: &Roster) -> Self {
        Self {
            positions: units.iter().map(|u| (u.id(), u.position())).collect(),
            hp: units.iter().map(|u| (u.id(), u.status.hp)).collect(),
            destroyed: BTreeSet::new(),
            occupied: units.iter().map(Unit::position).collect(),
            focus: BTreeMap::new(),
        }
    }

    pub fn position_of(&self, unit: &Unit) -> GridPosition {
        self.positions.get(&unit.id()).copied().unwrap_or(unit.position())
    }

    pub fn hp_of(&self, unit: &Unit) -> i32 {
        self.hp.get(&unit.id()).copied().unwrap_or(unit.status.hp)
    }

    pub fn is_destroyed(&self, unit: UnitId) -> bool {
        self.destroyed.contains(&unit)
    }

    pub fn is_occupied(&self, cell: GridPosition) -> bool {
        self.occupied.contains(&cell)
    }

    pub fn attacks_on(&self, target: UnitId) -> u32 {
        self.focus.get(&target).copied().unwrap_or(0)
    }

    pub fn with_move(mut self, unit: UnitId, from: GridPosition, to: GridPosition) -> Self {
        self.occupied.remove(&from);
        self.occupied.insert(to);
        self.positions.insert(unit, to);
        self
    }

    pub fn with_hit(mut self, target: &Unit, damage: i32) -> Self {
        let remaining = self.hp_of(target) - damage;
        self.hp.insert(target.id(), remaining);
        *self.focus.entry(target.id()).or_insert(0) += 1;
        if remaining <= 0 {
            let cell = self.position_of(target);
            self.destroyed.insert(target.id());
            self.occupied.remove(&cell);
        }
        self
    }

    /// The roster as it will look once the planned actions are applied
    pub fn project(&self, units: &Roster) -> Roster {
        let mut shadow = units.clone();
        for unit in units.iter() {
            if self.is_destroyed(unit.id()) {
                let _ = shadow.remove(unit.id());
            } else if let Ok(simulated) = shadow.get_mut(unit.id()) {
                simulated.status.position = self.position_of(unit);
                simulated.status.hp = self.hp_of(unit);
            }
        }
        shadow
    }
}

// ============================================================================
// PLANNER
// ============================================================================

/// Plan every action `ai_player` takes this turn. Always ends with `TurnEnd`.
pub fn plan_turn(
    units: &Roster,
    ai_player: PlayerId,
    config: &AiConfig,
    map: &GameMap,
) -> Vec<AiAction> {
    let planner = Planner {
        units,
        ai_player,
        config,
        map,
    };

    let (_, mut actions) = units.owned_by(ai_player).fold(
        (SimulationOverlay::from_roster(units), Vec::new()),
        |(overlay, mut actions), unit| {
            let overlay = planner.plan_unit(unit, overlay, &mut actions);
            (overlay, actions)
        },
    );

    actions.push(AiAction::TurnEnd);
    debug!(
        "AI player {} ({}) planned {} action(s)",
        ai_player,
        config.difficulty.name(),
        actions.len()
    );
    actions
}

struct Planner<'a> {
    units: &'a Roster,
    ai_player: PlayerId,
    config: &'a AiConfig,
    map: &'a GameMap,
}

struct AttackChoice<'a> {
    target: &'a Unit,
    armament: usize,
    damage: i32,
    score: f64,
}

impl<'a> Planner<'a> {
    fn living_enemies<'o>(&self, overlay: &'o SimulationOverlay) -> impl Iterator<Item = &'a Unit> + 'o
    where
        'a: 'o,
    {
        let ai_player = self.ai_player;
        self.units
            .iter()
            .filter(move |u| u.player != ai_player && !overlay.is_destroyed(u.id()))
    }

    fn plan_unit(
        &self,
        unit: &Unit,
        mut overlay: SimulationOverlay,
        actions: &mut Vec<AiAction>,
    ) -> SimulationOverlay {
        if unit.is_exhausted() || self.living_enemies(&overlay).next().is_none() {
            return overlay;
        }

        let mut position = overlay.position_of(unit);
        let mut planned_move = false;

        if !unit.status.moved {
            let nearest = self
                .living_enemies(&overlay)
                .map(|enemy| overlay.position_of(enemy))
                .min_by_key(|cell| position.distance_to(cell));

            if let Some(destination) =
                nearest.and_then(|enemy| self.choose_destination(unit, position, enemy, &overlay))
            {
                actions.push(AiAction::Move {
                    unit: unit.id(),
                    to: destination,
                });
                overlay = overlay.with_move(unit.id(), position, destination);
                position = destination;
                planned_move = true;
            }
        }

        if !unit.status.attacked {
            if let Some(choice) = self.choose_attack(unit, position, planned_move, &overlay) {
                actions.push(AiAction::Attack {
                    unit: unit.id(),
                    target: choice.target.id(),
                    armament: choice.armament,
                });
                overlay = overlay.with_hit(choice.target, choice.damage);
            }
        }

        overlay
    }

    fn should_retreat(&self, unit: &Unit) -> bool {
        self.config.difficulty == Difficulty::Hard
            && f64::from(unit.status.hp)
                < self.config.weights.retreat_hp_ratio * f64::from(unit.spec.max_hp)
    }

    /// Staying put is always an option; `None` means no cell beats it.
    fn choose_destination(
        &self,
        unit: &Unit,
        position: GridPosition,
        enemy: GridPosition,
        overlay: &SimulationOverlay,
    ) -> Option<GridPosition> {
        let candidates = calculate_movement_range(position, unit.spec.movement_range, self.map)
            .into_iter()
            .filter(|cell| !overlay.is_occupied(*cell));

        let mut best = None;
        let mut best_distance = position.distance_to(&enemy);

        if self.should_retreat(unit) {
            for cell in candidates {
                let distance = cell.distance_to(&enemy);
                if distance > best_distance {
                    best = Some(cell);
                    best_distance = distance;
                }
            }
            return best;
        }

        let hard = self.config.difficulty == Difficulty::Hard;
        let mut best_terrain = 0;
        for cell in candidates {
            let distance = cell.distance_to(&enemy);
            let terrain = match self.map.terrain_at(cell) {
                Some(terrain) if hard => self.config.weights.terrain_score(terrain),
                _ => 0,
            };
            if distance < best_distance || (distance == best_distance && terrain > best_terrain) {
                best = Some(cell);
                best_distance = distance;
                best_terrain = terrain;
            }
        }
        best
    }

    fn choose_attack(
        &self,
        unit: &Unit,
        position: GridPosition,
        planned_move: bool,
        overlay: &SimulationOverlay,
    ) -> Option<AttackChoice<'a>> {
        let shadow = overlay.project(self.units);
        let mut attacker = unit.clone();
        attacker.status.position = position;
        if planned_move {
            attacker.status.moved = true;
        }

        let mut best: Option<AttackChoice<'a>> = None;
        for enemy in self.living_enemies(overlay) {
            let target_cell = overlay.position_of(enemy);
            let mut defender = enemy.clone();
            defender.status.position = target_cell;
            defender.status.hp = overlay.hp_of(enemy);
            let terrain = self.map.terrain_at(target_cell).unwrap_or(Terrain::Plain);

            for (index, weapon) in attacker.spec.armaments.iter().enumerate() {
                if !is_within_attack_range(position, target_cell, weapon.range)
                    || !attacker.can_afford(weapon)
                {
                    continue;
                }

                let damage = calculate_damage(&attacker, &defender, weapon, terrain, &shadow).damage;
                let score = self.score_attack(damage, &defender, overlay.attacks_on(enemy.id()));
                if best.as_ref().map_or(true, |b| score > b.score) {
                    best = Some(AttackChoice {
                        target: enemy,
                        armament: index,
                        damage,
                        score,
                    });
                }
            }
        }
        best
    }

    fn score_attack(&self, damage: i32, target: &Unit, prior_attacks: u32) -> f64 {
        let weights = &self.config.weights;
        let mut score = f64::from(damage);
        if self.config.difficulty == Difficulty::Easy {
            return score;
        }

        if target.status.hp <= damage {
            score += weights.kill_bonus;
        } else {
            score += (1.0 - target.hp_percentage()) * weights.wounded_weight;
        }

        if self.config.difficulty == Difficulty::Hard {
            score += f64::from(prior_attacks) * weights.focus_fire_bonus;
        }
        score
    }
}
