//! Bevy host for a single match.
//!
//! The rules engine knows nothing about frames or clocks. This plugin owns
//! the live `GameState`, feeds it queued player actions, and paces the AI's
//! planned actions out one at a time so a presentation layer can animate
//! them.

use bevy::prelude::*;
use std::collections::{HashMap, VecDeque};

use super::{
    apply, check, compute_statistics, plan_turn, AiAction, AiConfig, BattleStatistics, Difficulty,
    GameAction, GameState, MatchConfig, PlayerId, Rejection, Roster, SaveGameData, Scenario,
    Verdict,
};

pub struct MatchPlugin {
    pub scenario: Scenario,
    pub config: MatchConfig,
    /// Players driven by the planner
    pub ai_seats: HashMap<PlayerId, AiConfig>,
}

impl MatchPlugin {
    /// Human against the configured AI seat
    pub fn new(scenario: Scenario, config: MatchConfig) -> Self {
        let mut ai_seats = HashMap::new();
        ai_seats.insert(config.ai_player, config.ai_config());
        Self {
            scenario,
            config,
            ai_seats,
        }
    }

    pub fn with_ai_seat(mut self, player: PlayerId, ai: AiConfig) -> Self {
        self.ai_seats.insert(player, ai);
        self
    }

    pub fn without_ai_seat(mut self, player: PlayerId) -> Self {
        self.ai_seats.remove(&player);
        self
    }
}

impl Plugin for MatchPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(Battle::new(self.scenario.clone()))
            .init_resource::<PendingActions>()
            .insert_resource(AiControl::new(
                self.ai_seats.clone(),
                self.config.action_delay_secs,
            ))
            .init_resource::<MatchReport>()
            .add_systems(
                Update,
                (apply_pending_actions, drive_ai_turn, record_match_report).chain(),
            );
    }
}

// ============================================================================
// RESOURCES
// ============================================================================

/// The match being played
#[derive(Resource)]
pub struct Battle {
    pub scenario: Scenario,
    /// Roster the history replays from
    pub initial_units: Roster,
    pub state: GameState,
    /// Why the most recent action was refused, for player feedback
    pub last_rejection: Option<Rejection>,
}

impl Battle {
    pub fn new(scenario: Scenario) -> Self {
        let state = GameState::new(&scenario);
        Self::resume(scenario, state)
    }

    /// Continue from a saved state. The history replays from the scenario's
    /// opening roster.
    pub fn resume(scenario: Scenario, state: GameState) -> Self {
        Self {
            initial_units: scenario.units.clone(),
            scenario,
            state,
            last_rejection: None,
        }
    }

    pub fn snapshot(&self, difficulty: Difficulty) -> SaveGameData {
        SaveGameData::new(&self.scenario.id, self.state.clone(), difficulty)
    }

    /// Run one action through the reducer.
    ///
    /// # Panics
    ///
    /// On roster faults: an action naming a unit that does not exist means
    /// the caller's view of the match is corrupt.
    pub fn dispatch(&mut self, action: GameAction) -> Verdict {
        let verdict = match check(&self.state, &action, &self.scenario) {
            Ok(verdict) => verdict,
            Err(fault) => panic!("Roster fault checking {:?}: {}", action, fault),
        };

        match verdict {
            Verdict::Accepted => match apply(&self.state, &action, &self.scenario) {
                Ok(next) => {
                    self.state = next;
                    self.last_rejection = None;
                }
                Err(fault) => panic!("Roster fault applying {:?}: {}", action, fault),
            },
            Verdict::Rejected(reason) => {
                debug!("Rejected {:?}: {}", action, reason.describe());
                self.last_rejection = Some(reason);
            }
        }
        verdict
    }
}

/// Actions submitted by human players (or any other driver), applied in
/// order at the start of the next frame
#[derive(Resource, Default)]
pub struct PendingActions(pub VecDeque<GameAction>);

impl PendingActions {
    pub fn push(&mut self, action: GameAction) {
        self.0.push_back(action);
    }
}

#[derive(Resource)]
pub struct AiControl {
    pub seats: HashMap<PlayerId, AiConfig>,
    /// The current plan, not yet dispatched
    pub queue: VecDeque<AiAction>,
    /// `None` when actions go out every frame
    timer: Option<Timer>,
}

impl AiControl {
    pub fn new(seats: HashMap<PlayerId, AiConfig>, delay_secs: f32) -> Self {
        let timer = (delay_secs > 0.0).then(|| Timer::from_seconds(delay_secs, TimerMode::Repeating));
        Self {
            seats,
            queue: VecDeque::new(),
            timer,
        }
    }

    pub fn is_ai(&self, player: PlayerId) -> bool {
        self.seats.contains_key(&player)
    }

    fn restart_clock(&mut self) {
        if let Some(timer) = self.timer.as_mut() {
            timer.reset();
        }
    }

    fn tick(&mut self, delta: std::time::Duration) -> bool {
        match self.timer.as_mut() {
            Some(timer) => timer.tick(delta).just_finished(),
            None => true,
        }
    }
}

/// Filled in once the match is over
#[derive(Resource, Default)]
pub struct MatchReport {
    pub statistics: Option<BattleStatistics>,
}

// ============================================================================
// SYSTEMS
// ============================================================================

fn apply_pending_actions(mut battle: ResMut<Battle>, mut pending: ResMut<PendingActions>) {
    while let Some(action) = pending.0.pop_front() {
        battle.dispatch(action);
    }
}

fn drive_ai_turn(time: Res<Time>, mut battle: ResMut<Battle>, mut ai: ResMut<AiControl>) {
    if battle.state.is_finished() {
        ai.queue.clear();
        return;
    }

    let active = battle.state.active_player;
    let Some(config) = ai.seats.get(&active).cloned() else {
        return;
    };

    if ai.queue.is_empty() {
        let plan = plan_turn(&battle.state.units, active, &config, &battle.scenario.map);
        info!("AI player {} planned {} action(s)", active, plan.len());
        ai.queue.extend(plan);
        ai.restart_clock();
    }

    if !ai.tick(time.delta()) {
        return;
    }

    if let Some(action) = ai.queue.pop_front() {
        if let Verdict::Rejected(reason) = battle.dispatch(action.into()) {
            warn!("AI action {:?} rejected: {}", action, reason.describe());
        }
    }
}

fn record_match_report(battle: Res<Battle>, mut report: ResMut<MatchReport>) {
    if report.statistics.is_some() {
        return;
    }
    let Some(winner) = battle.state.winner() else {
        return;
    };

    let stats = compute_statistics(&battle.state.history, &battle.initial_units, &battle.scenario);
    let winner_name = battle
        .scenario
        .players
        .get(winner)
        .map(|p| p.name.as_str())
        .unwrap_or("unknown");
    info!(
        "Match over after {} turn(s): {} wins",
        stats.turn_count, winner_name
    );
    if let Some(entry) = stats.mvp.and_then(|id| stats.per_unit.get(&id)) {
        info!("MVP: {} with {} damage", entry.name, entry.damage_dealt);
    }
    report.statistics = Some(stats);
}
