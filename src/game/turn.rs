//! Match state and the reducer that advances it.
//!
//! `apply` is the only way a `GameState` changes. Illegal actions are not
//! errors: they leave the state untouched and leave no trace in the history.
//! `Err` is reserved for roster faults (an action naming a unit that does
//! not exist), which legal play never produces.

use bevy::log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::{
    calculate_damage, calculate_movement_range, is_within_attack_range, is_within_move_range,
    DamageModifier, DamageReport, GridPosition, PlayerId, Roster, RosterError, Scenario, Terrain,
    Unit, UnitId,
};

/// Share of max EN a unit recovers at the end of its owner's turn
pub const EN_REGEN_RATE: f64 = 0.1;

// ============================================================================
// ACTIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameAction {
    Move {
        unit: UnitId,
        to: GridPosition,
    },
    Attack {
        unit: UnitId,
        target: UnitId,
        /// Index into the attacker's armament list
        armament: usize,
    },
    /// Send a unit that moved but has not fired back to where it started
    UndoMove {
        unit: UnitId,
    },
    TurnEnd,
}

impl GameAction {
    /// The acting unit, if any
    pub fn unit(&self) -> Option<UnitId> {
        match self {
            GameAction::Move { unit, .. }
            | GameAction::Attack { unit, .. }
            | GameAction::UndoMove { unit } => Some(*unit),
            GameAction::TurnEnd => None,
        }
    }
}

/// Why an action was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rejection {
    GameFinished,
    WrongPlayer,
    AlreadyMoved,
    AlreadyAttacked,
    NotMoved,
    OutOfBounds,
    Impassable,
    Occupied,
    OutOfMoveRange,
    UnknownArmament,
    InsufficientEnergy,
    FriendlyTarget,
    OutOfAttackRange,
}

impl Rejection {
    pub fn describe(&self) -> &'static str {
        match self {
            Rejection::GameFinished => "the game is over",
            Rejection::WrongPlayer => "unit belongs to the inactive player",
            Rejection::AlreadyMoved => "unit already moved this turn",
            Rejection::AlreadyAttacked => "unit already attacked this turn",
            Rejection::NotMoved => "unit has not moved",
            Rejection::OutOfBounds => "destination is off the map",
            Rejection::Impassable => "destination is impassable",
            Rejection::Occupied => "destination is occupied",
            Rejection::OutOfMoveRange => "destination is out of movement range",
            Rejection::UnknownArmament => "no such armament",
            Rejection::InsufficientEnergy => "not enough EN",
            Rejection::FriendlyTarget => "cannot attack a friendly unit",
            Rejection::OutOfAttackRange => "target is out of range",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    Rejected(Rejection),
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }
}

// ============================================================================
// STATE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    #[default]
    Playing,
    Finished {
        winner: PlayerId,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub active_player: PlayerId,
    pub units: Roster,
    pub phase: GamePhase,
    /// Accepted actions only, in order
    pub history: Vec<GameAction>,
    pub turn_number: u32,
}

/// A shot the unit could take right now, with its damage preview
#[derive(Debug, Clone, PartialEq)]
pub struct AttackOption {
    pub target: UnitId,
    pub armament: usize,
    pub report: DamageReport,
}

impl GameState {
    pub fn new(scenario: &Scenario) -> Self {
        Self::with_units(scenario, scenario.units.clone())
    }

    /// Opening state for `scenario` with a custom roster
    pub fn with_units(scenario: &Scenario, units: Roster) -> Self {
        Self {
            active_player: scenario.players.first().id,
            units,
            phase: GamePhase::Playing,
            history: Vec::new(),
            turn_number: 1,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, GamePhase::Finished { .. })
    }

    pub fn winner(&self) -> Option<PlayerId> {
        match self.phase {
            GamePhase::Finished { winner } => Some(winner),
            GamePhase::Playing => None,
        }
    }

    pub fn units_of(&self, player: PlayerId) -> impl Iterator<Item = &Unit> {
        self.units.owned_by(player)
    }

    /// Cells `unit` may move to this turn. Empty when it cannot move at all.
    pub fn legal_moves(
        &self,
        unit: UnitId,
        scenario: &Scenario,
    ) -> Result<BTreeSet<GridPosition>, RosterError> {
        let unit = self.units.get(unit)?;
        if self.is_finished() || unit.player != self.active_player || unit.status.moved {
            return Ok(BTreeSet::new());
        }

        let mut cells = calculate_movement_range(unit.position(), unit.spec.movement_range, &scenario.map);
        cells.retain(|&cell| !self.units.is_occupied(cell));
        Ok(cells)
    }

    /// Every attack `unit` could legally make right now
    pub fn attack_options(
        &self,
        unit: UnitId,
        scenario: &Scenario,
    ) -> Result<Vec<AttackOption>, RosterError> {
        let attacker = self.units.get(unit)?;
        let mut options = Vec::new();

        for target in self.units.iter() {
            for armament in 0..attacker.spec.armaments.len() {
                let action = GameAction::Attack {
                    unit,
                    target: target.id(),
                    armament,
                };
                if !check(self, &action, scenario)?.is_accepted() {
                    continue;
                }
                let Some(weapon) = attacker.armament(armament) else {
                    continue;
                };
                let report = calculate_damage(
                    attacker,
                    target,
                    weapon,
                    terrain_under(scenario, target),
                    &self.units,
                );
                options.push(AttackOption {
                    target: target.id(),
                    armament,
                    report,
                });
            }
        }

        Ok(options)
    }
}

fn terrain_under(scenario: &Scenario, unit: &Unit) -> Terrain {
    scenario.map.terrain_at(unit.position()).unwrap_or(Terrain::Plain)
}

// ============================================================================
// LEGALITY
// ============================================================================

/// Decide whether `action` is legal in `state`.
pub fn check(
    state: &GameState,
    action: &GameAction,
    scenario: &Scenario,
) -> Result<Verdict, RosterError> {
    use Rejection::*;

    if state.is_finished() {
        return Ok(Verdict::Rejected(GameFinished));
    }

    let rejection = match *action {
        GameAction::Move { unit, to } => {
            let unit = state.units.get(unit)?;
            if unit.player != state.active_player {
                Some(WrongPlayer)
            } else if unit.status.moved {
                Some(AlreadyMoved)
            } else {
                match scenario.map.terrain_at(to) {
                    None => Some(OutOfBounds),
                    Some(terrain) if !terrain.is_passable() => Some(Impassable),
                    Some(_) if state.units.occupant(to).is_some_and(|o| o.id() != unit.id()) => {
                        Some(Occupied)
                    }
                    Some(_)
                        if !is_within_move_range(
                            unit.position(),
                            to,
                            unit.spec.movement_range,
                            &scenario.map,
                        ) =>
                    {
                        Some(OutOfMoveRange)
                    }
                    Some(_) => None,
                }
            }
        }
        GameAction::Attack {
            unit,
            target,
            armament,
        } => {
            let attacker = state.units.get(unit)?;
            let defender = state.units.get(target)?;
            if attacker.player != state.active_player {
                Some(WrongPlayer)
            } else if attacker.status.attacked {
                Some(AlreadyAttacked)
            } else {
                match attacker.armament(armament) {
                    None => Some(UnknownArmament),
                    Some(weapon) if !attacker.can_afford(weapon) => Some(InsufficientEnergy),
                    Some(_) if defender.player == attacker.player => Some(FriendlyTarget),
                    Some(weapon)
                        if !is_within_attack_range(
                            attacker.position(),
                            defender.position(),
                            weapon.range,
                        ) =>
                    {
                        Some(OutOfAttackRange)
                    }
                    Some(_) => None,
                }
            }
        }
        GameAction::UndoMove { unit } => {
            let unit = state.units.get(unit)?;
            if unit.player != state.active_player {
                Some(WrongPlayer)
            } else if !unit.status.moved {
                Some(NotMoved)
            } else if unit.status.attacked {
                Some(AlreadyAttacked)
            } else if state
                .units
                .occupant(unit.status.initial_position)
                .is_some_and(|o| o.id() != unit.id())
            {
                // Someone else stepped into the vacated cell
                Some(Occupied)
            } else {
                None
            }
        }
        GameAction::TurnEnd => None,
    };

    Ok(match rejection {
        Some(reason) => Verdict::Rejected(reason),
        None => Verdict::Accepted,
    })
}

// ============================================================================
// REDUCER
// ============================================================================

/// Advance `state` by one action.
///
/// Returns the unchanged state when the action is illegal or the game is
/// already over.
pub fn apply(
    state: &GameState,
    action: &GameAction,
    scenario: &Scenario,
) -> Result<GameState, RosterError> {
    if let Verdict::Rejected(reason) = check(state, action, scenario)? {
        debug!("Ignoring {:?}: {}", action, reason.describe());
        return Ok(state.clone());
    }

    let mut next = state.clone();
    match *action {
        GameAction::Move { unit, to } => {
            let unit = next.units.get_mut(unit)?;
            unit.status.previous_position = unit.status.position;
            unit.status.position = to;
            unit.status.moved = true;
        }
        GameAction::Attack {
            unit,
            target,
            armament,
        } => resolve_attack(&mut next, unit, target, armament, scenario)?,
        GameAction::UndoMove { unit } => {
            let unit = next.units.get_mut(unit)?;
            unit.status.position = unit.status.initial_position;
            unit.status.previous_position = unit.status.initial_position;
            unit.status.moved = false;
        }
        GameAction::TurnEnd => end_turn(&mut next, scenario),
    }

    next.history.push(*action);
    Ok(next)
}

fn resolve_attack(
    state: &mut GameState,
    unit: UnitId,
    target: UnitId,
    armament: usize,
    scenario: &Scenario,
) -> Result<(), RosterError> {
    let attacker = state.units.get(unit)?;
    let defender = state.units.get(target)?;
    let Some(weapon) = attacker.armament(armament).cloned() else {
        return Ok(());
    };

    let report = calculate_damage(
        attacker,
        defender,
        &weapon,
        terrain_under(scenario, defender),
        &state.units,
    );
    let remaining = defender.status.hp - report.damage;
    let labels: Vec<&str> = report.modifiers.iter().map(DamageModifier::label).collect();
    debug!(
        "{} hits {} with {} for {} ({} hp left) [{}]",
        attacker.spec.name,
        defender.spec.name,
        weapon.name,
        report.damage,
        remaining,
        labels.join(", ")
    );

    if remaining > 0 {
        state.units.get_mut(target)?.status.hp = remaining;
    } else {
        let destroyed = state.units.remove(target)?;
        info!("{} (unit {}) destroyed", destroyed.spec.name, destroyed.id());
    }

    let attacker = state.units.get_mut(unit)?;
    attacker.status.en -= f64::from(weapon.consumed_en);
    attacker.status.attacked = true;
    attacker.status.moved = true;
    Ok(())
}

fn end_turn(state: &mut GameState, scenario: &Scenario) {
    let active = state.active_player;

    for unit in state.units.iter_mut() {
        if unit.player == active {
            let max_en = f64::from(unit.spec.max_en);
            unit.status.en = (unit.status.en + max_en * EN_REGEN_RATE).min(max_en);
        }
        unit.reset_turn();
    }

    let next_player = scenario
        .players
        .next_after(active)
        .unwrap_or(scenario.players.first())
        .id;

    if state.units.count_for(next_player) == 0 {
        state.phase = GamePhase::Finished { winner: active };
        info!("Player {} wins on turn {}", active, state.turn_number);
        return;
    }

    state.active_player = next_player;
    if next_player == scenario.players.first().id {
        state.turn_number += 1;
    }
    info!("Turn {}: player {} to act", state.turn_number, next_player);
}

/// Rebuild every intermediate state of a match from its opening roster.
///
/// The first element is the opening state; each following one is the
/// result of applying the next action.
pub fn replay(
    scenario: &Scenario,
    initial_units: &Roster,
    history: &[GameAction],
) -> Result<Vec<GameState>, RosterError> {
    let mut states = vec![GameState::with_units(scenario, initial_units.clone())];
    for action in history {
        let next = match states.last() {
            Some(state) => apply(state, action, scenario)?,
            None => break,
        };
        states.push(next);
    }
    Ok(states)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Armament, GameMap, Player, UnitCategory, UnitSpec};

    fn spec(id: UnitId, category: UnitCategory) -> UnitSpec {
        let (movement_range, max_hp, max_en, armaments) = match category {
            UnitCategory::Fighter => (
                3,
                1000,
                200,
                vec![
                    Armament::new("Machine gun", 200, 2, 50),
                    Armament::new("Missile", 400, 3, 100),
                ],
            ),
            UnitCategory::Tank => (
                2,
                2000,
                400,
                vec![
                    Armament::new("Machine gun", 200, 2, 75),
                    Armament::new("Cannon", 500, 4, 150),
                ],
            ),
            UnitCategory::Soldier => (
                1,
                200,
                100,
                vec![Armament::new("Assault rifle", 100, 2, 10)],
            ),
        };
        UnitSpec {
            id,
            name: format!("{}-{id}", category.name()),
            category,
            movement_range,
            max_hp,
            max_en,
            armaments,
        }
    }

    fn unit(id: UnitId, category: UnitCategory, player: PlayerId, x: i32, y: i32) -> Unit {
        Unit::new(spec(id, category), player, GridPosition::new(x, y))
    }

    /// 8x8 field: forest at (4, 2), water at (0, 5)
    fn scenario(units: Vec<Unit>) -> Scenario {
        let mut map = GameMap::new(8, 8);
        map.set(4, 2, Terrain::Forest);
        map.set(0, 5, Terrain::Water);
        let players = vec![
            Player::new(1, "Hero", (0, 0, 255)),
            Player::new(2, "Villain", (255, 0, 0)),
        ];
        Scenario::new("test", "Test", map, players, units).unwrap()
    }

    fn duel() -> (Scenario, GameState) {
        let scenario = scenario(vec![
            unit(1, UnitCategory::Fighter, 1, 2, 2),
            unit(2, UnitCategory::Fighter, 2, 3, 2),
            unit(3, UnitCategory::Soldier, 2, 4, 2),
            unit(4, UnitCategory::Tank, 1, 2, 6),
        ]);
        let state = GameState::new(&scenario);
        (scenario, state)
    }

    fn step(state: &GameState, action: GameAction, scenario: &Scenario) -> GameState {
        apply(state, &action, scenario).unwrap()
    }

    #[test]
    fn test_opening_state() {
        let (_, state) = duel();
        assert_eq!(state.active_player, 1);
        assert_eq!(state.turn_number, 1);
        assert_eq!(state.phase, GamePhase::Playing);
        assert!(state.history.is_empty());
        assert_eq!(state.units_of(2).count(), 2);
    }

    #[test]
    fn test_move_updates_position_and_facing() {
        let (scenario, state) = duel();
        let to = GridPosition::new(2, 4);
        let next = step(&state, GameAction::Move { unit: 1, to }, &scenario);

        let fighter = next.units.get(1).unwrap();
        assert_eq!(fighter.position(), to);
        assert_eq!(fighter.status.previous_position, GridPosition::new(2, 2));
        assert_eq!(fighter.status.initial_position, GridPosition::new(2, 2));
        assert!(fighter.status.moved);
        assert_eq!(fighter.orientation(), crate::game::Orientation::Down);
        assert_eq!(next.history, vec![GameAction::Move { unit: 1, to }]);
    }

    #[test]
    fn test_illegal_moves_are_ignored() {
        let (scenario, state) = duel();
        let cases = [
            (GameAction::Move { unit: 2, to: GridPosition::new(3, 3) }, Rejection::WrongPlayer),
            (GameAction::Move { unit: 1, to: GridPosition::new(-1, 2) }, Rejection::OutOfBounds),
            (GameAction::Move { unit: 4, to: GridPosition::new(0, 5) }, Rejection::Impassable),
            (GameAction::Move { unit: 1, to: GridPosition::new(3, 2) }, Rejection::Occupied),
            (GameAction::Move { unit: 1, to: GridPosition::new(2, 6) }, Rejection::Occupied),
            (GameAction::Move { unit: 1, to: GridPosition::new(7, 7) }, Rejection::OutOfMoveRange),
            (GameAction::Move { unit: 1, to: GridPosition::new(2, 2) }, Rejection::OutOfMoveRange),
        ];

        for (action, reason) in cases {
            assert_eq!(check(&state, &action, &scenario), Ok(Verdict::Rejected(reason)), "{action:?}");
            assert_eq!(apply(&state, &action, &scenario), Ok(state.clone()));
        }

        let moved = step(&state, GameAction::Move { unit: 1, to: GridPosition::new(1, 2) }, &scenario);
        let again = GameAction::Move { unit: 1, to: GridPosition::new(0, 2) };
        assert_eq!(check(&moved, &again, &scenario), Ok(Verdict::Rejected(Rejection::AlreadyMoved)));
        assert_eq!(apply(&moved, &again, &scenario), Ok(moved));
    }

    #[test]
    fn test_attack_on_plain() {
        let (scenario, state) = duel();
        let next = step(&state, GameAction::Attack { unit: 1, target: 2, armament: 0 }, &scenario);

        let target = next.units.get(2).unwrap();
        let attacker = next.units.get(1).unwrap();
        assert_eq!(target.status.hp, 800);
        assert_eq!(attacker.status.en, 150.0);
        assert!(attacker.status.attacked && attacker.status.moved);
        assert_eq!(next.history.len(), 1);
    }

    #[test]
    fn test_attack_on_camouflaged_soldier() {
        let scenario = scenario(vec![
            unit(1, UnitCategory::Fighter, 1, 2, 2),
            unit(2, UnitCategory::Soldier, 2, 4, 2),
        ]);
        let state = GameState::new(&scenario);
        let preview = state.attack_options(1, &scenario).unwrap();
        assert_eq!(preview.len(), 2);
        assert_eq!(preview[0].report.damage, 120);

        // 200 hp soldier takes 120 and survives
        let next = step(&state, GameAction::Attack { unit: 1, target: 2, armament: 0 }, &scenario);
        assert_eq!(next.units.get(2).unwrap().status.hp, 80);
    }

    #[test]
    fn test_energy_gate() {
        let (scenario, mut state) = duel();
        state.units.get_mut(1).unwrap().status.en = 40.0;

        let action = GameAction::Attack { unit: 1, target: 2, armament: 0 };
        assert_eq!(check(&state, &action, &scenario), Ok(Verdict::Rejected(Rejection::InsufficientEnergy)));

        let next = step(&state, action, &scenario);
        assert_eq!(next, state);
        assert_eq!(next.units.get(2).unwrap().status.hp, 1000);
        assert!(!next.units.get(1).unwrap().status.attacked);
    }

    #[test]
    fn test_illegal_attacks_are_ignored() {
        let (scenario, state) = duel();
        let cases = [
            (GameAction::Attack { unit: 2, target: 1, armament: 0 }, Rejection::WrongPlayer),
            (GameAction::Attack { unit: 1, target: 2, armament: 5 }, Rejection::UnknownArmament),
            (GameAction::Attack { unit: 1, target: 4, armament: 1 }, Rejection::FriendlyTarget),
            (GameAction::Attack { unit: 1, target: 1, armament: 0 }, Rejection::FriendlyTarget),
            (GameAction::Attack { unit: 4, target: 2, armament: 0 }, Rejection::OutOfAttackRange),
        ];
        for (action, reason) in cases {
            assert_eq!(check(&state, &action, &scenario), Ok(Verdict::Rejected(reason)), "{action:?}");
            assert_eq!(apply(&state, &action, &scenario), Ok(state.clone()));
        }

        let fired = step(&state, GameAction::Attack { unit: 1, target: 2, armament: 0 }, &scenario);
        let again = GameAction::Attack { unit: 1, target: 3, armament: 0 };
        assert_eq!(check(&fired, &again, &scenario), Ok(Verdict::Rejected(Rejection::AlreadyAttacked)));
    }

    #[test]
    fn test_missing_units_are_faults() {
        let (scenario, state) = duel();
        assert_eq!(
            apply(&state, &GameAction::Move { unit: 99, to: GridPosition::new(0, 0) }, &scenario),
            Err(RosterError::UnitNotFound(99))
        );
        assert_eq!(
            apply(&state, &GameAction::Attack { unit: 1, target: 42, armament: 0 }, &scenario),
            Err(RosterError::UnitNotFound(42))
        );
        assert_eq!(
            apply(&state, &GameAction::UndoMove { unit: 7 }, &scenario),
            Err(RosterError::UnitNotFound(7))
        );
    }

    #[test]
    fn test_turn_end_regenerates_active_player_only() {
        let (scenario, mut state) = duel();
        state.units.get_mut(1).unwrap().status.en = 195.0;
        state.units.get_mut(4).unwrap().status.en = 100.0;
        state.units.get_mut(2).unwrap().status.en = 100.0;

        let next = step(&state, GameAction::TurnEnd, &scenario);
        assert_eq!(next.units.get(1).unwrap().status.en, 200.0);
        assert_eq!(next.units.get(4).unwrap().status.en, 140.0);
        assert_eq!(next.units.get(2).unwrap().status.en, 100.0);
        assert_eq!(next.active_player, 2);
        assert_eq!(next.turn_number, 1);

        let wrapped = step(&next, GameAction::TurnEnd, &scenario);
        assert_eq!(wrapped.active_player, 1);
        assert_eq!(wrapped.turn_number, 2);
        assert_eq!(wrapped.units.get(2).unwrap().status.en, 120.0);
    }

    #[test]
    fn test_turn_end_resets_flags_and_restore_point() {
        let (scenario, state) = duel();
        let to = GridPosition::new(1, 3);
        let state = step(&state, GameAction::Move { unit: 1, to }, &scenario);
        let state = step(&state, GameAction::Attack { unit: 1, target: 2, armament: 1 }, &scenario);
        let state = step(&state, GameAction::TurnEnd, &scenario);

        let fighter = state.units.get(1).unwrap();
        assert!(!fighter.status.moved && !fighter.status.attacked);
        assert_eq!(fighter.status.initial_position, to);
    }

    #[test]
    fn test_kill_defers_victory_to_turn_end() {
        let scenario = scenario(vec![
            unit(1, UnitCategory::Fighter, 1, 0, 0),
            unit(2, UnitCategory::Soldier, 2, 1, 0),
        ]);
        let state = GameState::new(&scenario);

        let state = step(&state, GameAction::Attack { unit: 1, target: 2, armament: 1 }, &scenario);
        assert!(!state.units.contains(2));
        assert_eq!(state.phase, GamePhase::Playing);

        let state = step(&state, GameAction::TurnEnd, &scenario);
        assert_eq!(state.phase, GamePhase::Finished { winner: 1 });
        assert_eq!(state.winner(), Some(1));
        assert_eq!(state.active_player, 1);
        assert_eq!(state.history.len(), 2);
    }

    #[test]
    fn test_finished_game_absorbs_everything() {
        let (scenario, mut state) = duel();
        state.phase = GamePhase::Finished { winner: 2 };

        let actions = [
            GameAction::TurnEnd,
            GameAction::Move { unit: 1, to: GridPosition::new(2, 3) },
            GameAction::Attack { unit: 1, target: 2, armament: 0 },
            GameAction::UndoMove { unit: 1 },
            GameAction::Move { unit: 99, to: GridPosition::new(2, 3) },
        ];
        for action in actions {
            assert_eq!(apply(&state, &action, &scenario), Ok(state.clone()));
        }
    }

    #[test]
    fn test_undo_restores_pre_move_state() {
        let (scenario, state) = duel();
        let moved = step(&state, GameAction::Move { unit: 1, to: GridPosition::new(1, 1) }, &scenario);
        let undone = step(&moved, GameAction::UndoMove { unit: 1 }, &scenario);

        let before = state.units.get(1).unwrap();
        let after = undone.units.get(1).unwrap();
        assert_eq!(after.position(), before.position());
        assert_eq!(after.status.moved, before.status.moved);
        assert_eq!(undone.history.len(), 2);

        // Nothing to undo, or too late once fired
        assert_eq!(
            check(&state, &GameAction::UndoMove { unit: 1 }, &scenario),
            Ok(Verdict::Rejected(Rejection::NotMoved))
        );
        let fired = step(&moved, GameAction::Attack { unit: 1, target: 2, armament: 1 }, &scenario);
        assert!(fired.units.get(1).unwrap().status.attacked);
        assert_eq!(
            check(&fired, &GameAction::UndoMove { unit: 1 }, &scenario),
            Ok(Verdict::Rejected(Rejection::AlreadyAttacked))
        );
    }

    #[test]
    fn test_undo_into_a_reoccupied_cell_is_refused() {
        let scenario = scenario(vec![
            unit(1, UnitCategory::Fighter, 1, 0, 0),
            unit(2, UnitCategory::Fighter, 1, 1, 0),
            unit(3, UnitCategory::Soldier, 2, 6, 6),
        ]);
        let state = GameState::new(&scenario);
        let state = step(&state, GameAction::Move { unit: 1, to: GridPosition::new(0, 2) }, &scenario);
        let state = step(&state, GameAction::Move { unit: 2, to: GridPosition::new(0, 0) }, &scenario);

        let undo = GameAction::UndoMove { unit: 1 };
        assert_eq!(check(&state, &undo, &scenario), Ok(Verdict::Rejected(Rejection::Occupied)));
        let refused = step(&state, undo, &scenario);
        assert_eq!(refused, state);
        assert_eq!(refused.units.get(1).unwrap().position(), GridPosition::new(0, 2));

        // Once the squatter backs out, the undo goes through
        let state = step(&state, GameAction::UndoMove { unit: 2 }, &scenario);
        let state = step(&state, undo, &scenario);
        assert_eq!(state.units.get(1).unwrap().position(), GridPosition::new(0, 0));
        assert_eq!(state.units.get(2).unwrap().position(), GridPosition::new(1, 0));
        assert_eq!(state.history.len(), 4);
    }

    #[test]
    fn test_legal_moves_skip_occupied_cells() {
        let (scenario, state) = duel();
        let moves = state.legal_moves(1, &scenario).unwrap();

        assert!(!moves.contains(&GridPosition::new(3, 2)));
        assert!(!moves.contains(&GridPosition::new(2, 2)));
        assert!(moves.contains(&GridPosition::new(2, 5)));
        for cell in &moves {
            let action = GameAction::Move { unit: 1, to: *cell };
            assert_eq!(check(&state, &action, &scenario), Ok(Verdict::Accepted));
        }

        // Inactive player's units have no moves
        assert!(state.legal_moves(2, &scenario).unwrap().is_empty());
    }

    #[test]
    fn test_replay_reproduces_every_state() {
        let (scenario, state) = duel();
        let s1 = step(&state, GameAction::Move { unit: 1, to: GridPosition::new(2, 3) }, &scenario);
        let s2 = step(&s1, GameAction::Attack { unit: 1, target: 2, armament: 0 }, &scenario);
        let s3 = step(&s2, GameAction::TurnEnd, &scenario);

        let states = replay(&scenario, &scenario.units, &s3.history).unwrap();
        assert_eq!(states, vec![state, s1, s2, s3]);
    }
}
