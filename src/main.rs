/// Entry point: configuration, logging, level loading, then the tick loop.

use std::time::Duration;

use ddave::config::GameConfig;
use ddave::sim::driver::{Presenter, Session};
use ddave::sim::event::GameEvent;
use ddave::sim::level::LevelStore;
use ddave::sim::world::{GameState, RunOutcome};
use ddave::ui::gamepad::GamepadState;
use ddave::ui::input::{Controls, InputState};
use ddave::ui::renderer::Renderer;
use ddave::ui::sound::SoundEngine;
use ddave::SimError;

/// How long the final frame stays up after the run ends.
const OUTCOME_HOLD: Duration = Duration::from_millis(1500);

/// Renderer plus optional sound, presented together once per tick.
struct Frontend {
    renderer: Renderer,
    sound: Option<SoundEngine>,
}

impl Presenter for Frontend {
    fn present(&mut self, state: &GameState, events: &[GameEvent]) -> Result<(), SimError> {
        if let Some(sfx) = &self.sound {
            sfx.play_events(events);
        }
        self.renderer.present(state, events)
    }
}

fn main() {
    let config = GameConfig::load();
    init_logging(&config);

    let store = load_levels(&config);
    let state = GameState::new(store).with_lives(config.start_lives);
    let mut session: Session<Controls> =
        Session::new(state, Duration::from_millis(config.tick_rate_ms));

    let mut frontend = Frontend {
        renderer: Renderer::new(),
        sound: if config.sound_enabled { SoundEngine::new() } else { None },
    };

    let honor_release = match frontend.renderer.init() {
        Ok(enhanced) => enhanced,
        Err(e) => {
            eprintln!("Terminal init failed: {e}");
            return;
        }
    };

    // stderr shares the alternate screen: only errors get through
    let log_level = log::max_level();
    log::set_max_level(screen_log_level(log_level));

    let result = game_loop(&mut session, &mut frontend, &config, honor_release);

    if let Err(e) = frontend.renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    log::set_max_level(log_level);

    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    println!();
    match session.state.outcome {
        Some(RunOutcome::Won { .. }) => println!("You made it! Thanks for playing Dangerous Dave."),
        Some(RunOutcome::GameOver { .. }) => println!("Game over. Thanks for playing Dangerous Dave."),
        None => println!("Thanks for playing Dangerous Dave."),
    }
    println!("Final Score: {}", session.state.score);
}

fn game_loop(
    session: &mut Session<Controls>,
    frontend: &mut Frontend,
    config: &GameConfig,
    honor_release: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut keyboard = InputState::new();
    keyboard.honor_release = honor_release;
    let mut gamepad = GamepadState::new();
    gamepad.load_button_config(&config.gamepad);
    if gamepad.connected {
        log::info!("gamepad detected");
    }
    session.attach_input(Controls::new(keyboard, gamepad));

    session.run(frontend)?;

    if session.state.outcome.is_some() {
        std::thread::sleep(OUTCOME_HOLD);
    }
    Ok(())
}

/// `RUST_LOG` wins; otherwise the configured level.
fn init_logging(config: &GameConfig) {
    let env = env_logger::Env::default().default_filter_or(config.log_level.as_str());
    env_logger::Builder::from_env(env).format_timestamp(None).init();
}

/// Log ceiling while the game owns the terminal.
fn screen_log_level(configured: log::LevelFilter) -> log::LevelFilter {
    configured.min(log::LevelFilter::Error)
}

fn load_levels(config: &GameConfig) -> LevelStore {
    match LevelStore::load_dir(&config.levels_dir) {
        Ok(store) => store,
        Err(e) => {
            log::warn!("{e}; using built-in levels");
            LevelStore::embedded()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::LevelFilter;

    #[test]
    fn only_errors_reach_the_game_screen() {
        assert_eq!(screen_log_level(LevelFilter::Debug), LevelFilter::Error);
        assert_eq!(screen_log_level(LevelFilter::Warn), LevelFilter::Error);
        assert_eq!(screen_log_level(LevelFilter::Off), LevelFilter::Off);
    }
}
