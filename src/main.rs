//! Headless skirmish: the computer plays every seat until somebody wins.
//!
//! Usage: `war-sim [scenario.ron]`. Without an argument the embedded tutorial
//! is played. `match.ron` in the working directory overrides the defaults.

use bevy::log::LogPlugin;
use bevy::prelude::*;

use war_sim::{Battle, MatchConfig, MatchPlugin, MatchReport, SaveStore, Scenario};

/// Give up on a match that stops making progress
const MAX_FRAMES: u32 = 20_000;

fn main() -> AppExit {
    let mut app = App::new();
    app.add_plugins((MinimalPlugins, LogPlugin::default()));

    let config = MatchConfig {
        action_delay_secs: 0.0,
        ..MatchConfig::load_or_default("match.ron")
    };

    let scenario = match std::env::args().nth(1) {
        Some(path) => match Scenario::load_from_file(&path) {
            Ok(scenario) => scenario,
            Err(e) => {
                error!("Cannot load scenario {}: {}", path, e);
                return AppExit::error();
            }
        },
        None => Scenario::tutorial(),
    };
    info!(
        "Playing '{}' on a {}x{} map, difficulty {}",
        scenario.name,
        scenario.map.width,
        scenario.map.height,
        config.difficulty.name()
    );

    let seats: Vec<_> = scenario.players.iter().map(|p| p.id).collect();
    let plugin = seats.into_iter().fold(
        MatchPlugin::new(scenario, config.clone()),
        |plugin, player| plugin.with_ai_seat(player, config.ai_config()),
    );
    app.add_plugins(plugin);
    app.finish();
    app.cleanup();

    for _ in 0..MAX_FRAMES {
        app.update();
        if app.world().resource::<MatchReport>().statistics.is_some() {
            break;
        }
    }

    let Some(stats) = app.world().resource::<MatchReport>().statistics.clone() else {
        let battle = app.world().resource::<Battle>();
        warn!(
            "No winner after {} frames ({} actions played)",
            MAX_FRAMES,
            battle.state.history.len()
        );
        if let Err(e) = SaveStore::default().save(0, &battle.snapshot(config.difficulty)) {
            error!("Could not save the stalled match: {}", e);
        }
        return AppExit::error();
    };

    for entry in &stats.per_player {
        info!(
            "Player {}: {} damage, {} kill(s), {} lost, {} remaining",
            entry.player,
            entry.total_damage,
            entry.total_kills,
            entry.units_lost,
            entry.units_remaining
        );
    }
    AppExit::Success
}
