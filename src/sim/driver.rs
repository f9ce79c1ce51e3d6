/// Tick driver: input → step → present, on a fixed cadence.
///
/// One logical thread. The step runs to completion before presentation
/// sees the state, and nothing else mutates it. The next wake-up is
/// `tick_rate - elapsed`, clamped at zero; a slow tick is not made up
/// for with extra steps.

use std::time::{Duration, Instant};

use crate::error::SimError;
use super::event::GameEvent;
use super::step;
use super::world::GameState;

/// Logical actions an input source can report as held.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Action {
    Left,
    Right,
    /// Jump, climb, or fly up.
    Up,
    Down,
    Fire,
    Jetpack,
    Start,
}

pub trait InputSource {
    /// Collect pending device events. Called once per tick.
    fn poll(&mut self);
    fn is_held(&self, action: Action) -> bool;
    fn quit_requested(&self) -> bool {
        false
    }
}

/// Read-only consumer of settled state.
pub trait Presenter {
    fn present(&mut self, state: &GameState, events: &[GameEvent]) -> Result<(), SimError>;
}

pub fn next_delay(tick_rate: Duration, elapsed: Duration) -> Duration {
    tick_rate.saturating_sub(elapsed)
}

pub struct Session<I: InputSource> {
    pub state: GameState,
    input: Option<I>,
    tick_rate: Duration,
}

impl<I: InputSource> Session<I> {
    pub fn new(state: GameState, tick_rate: Duration) -> Self {
        Session { state, input: None, tick_rate }
    }

    pub fn attach_input(&mut self, input: I) {
        self.input = Some(input);
    }

    /// Poll input and advance one tick. `None` when the player quit
    /// instead; the state is left untouched.
    pub fn tick(&mut self) -> Result<Option<Vec<GameEvent>>, SimError> {
        let input = self.input.as_mut().ok_or(SimError::InputNotInitialized)?;
        input.poll();
        if input.quit_requested() {
            log::info!("quit requested");
            self.state.quit = true;
            return Ok(None);
        }
        step::latch_input(&mut self.state, |a| input.is_held(a));
        Ok(Some(step::step(&mut self.state)))
    }

    /// Run until the quit flag is set. An error ends the run unless the
    /// run was already ending when it happened.
    pub fn run<P: Presenter>(&mut self, presenter: &mut P) -> Result<(), SimError> {
        while !self.state.quit {
            let begin = Instant::now();
            let result = match self.tick() {
                Ok(Some(events)) => presenter.present(&self.state, &events),
                Ok(None) => break,
                Err(e) => Err(e),
            };
            match result {
                Ok(()) => {}
                Err(e) if self.state.quit => log::debug!("ignoring error while quitting: {e}"),
                Err(e) => return Err(e),
            }
            if self.state.quit {
                break;
            }
            std::thread::sleep(next_delay(self.tick_rate, begin.elapsed()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::level::LevelStore;
    use crate::sim::world::{Mode, RunOutcome};

    /// Replays one set of held actions per tick, then asks to quit.
    struct Script {
        frames: Vec<Vec<Action>>,
        cursor: usize,
    }

    impl InputSource for Script {
        fn poll(&mut self) {
            self.cursor += 1;
        }
        fn is_held(&self, action: Action) -> bool {
            self.frames
                .get(self.cursor - 1)
                .is_some_and(|held| held.contains(&action))
        }
        fn quit_requested(&self) -> bool {
            self.cursor > self.frames.len()
        }
    }

    #[derive(Default)]
    struct Recorder {
        ticks: Vec<u64>,
        modes: Vec<Mode>,
        fail_on: Option<u64>,
    }

    impl Presenter for Recorder {
        fn present(&mut self, state: &GameState, _events: &[GameEvent]) -> Result<(), SimError> {
            self.ticks.push(state.tick);
            self.modes.push(state.mode);
            match self.fail_on {
                Some(t) if t == state.tick => Err(SimError::SpriteOutOfRange { code: 200, x: 0, y: 0, tick: t }),
                _ => Ok(()),
            }
        }
    }

    fn session(frames: Vec<Vec<Action>>) -> Session<Script> {
        let mut s = Session::new(GameState::new(LevelStore::embedded()), Duration::ZERO);
        s.attach_input(Script { frames, cursor: 0 });
        s
    }

    #[test]
    fn delay_never_negative() {
        let rate = Duration::from_millis(33);
        assert_eq!(next_delay(rate, Duration::from_millis(10)), Duration::from_millis(23));
        assert_eq!(next_delay(rate, Duration::from_millis(50)), Duration::ZERO);
    }

    #[test]
    fn tick_without_input_is_an_error() {
        let mut s: Session<Script> = Session::new(GameState::new(LevelStore::embedded()), Duration::ZERO);
        assert!(matches!(s.tick(), Err(SimError::InputNotInitialized)));
        let mut rec = Recorder::default();
        assert!(matches!(s.run(&mut rec), Err(SimError::InputNotInitialized)));
        assert!(rec.ticks.is_empty());
    }

    #[test]
    fn presents_every_settled_tick_until_quit() {
        let mut s = session(vec![vec![], vec![Action::Start], vec![], vec![]]);
        let mut rec = Recorder::default();
        s.run(&mut rec).unwrap();
        assert_eq!(rec.ticks, vec![1, 2, 3, 4]);
        assert_eq!(rec.modes[0], Mode::Title);
        assert_eq!(rec.modes[1], Mode::Gameplay);
        assert!(s.state.quit);
    }

    #[test]
    fn presentation_error_aborts_run() {
        let mut s = session(vec![vec![]; 10]);
        let mut rec = Recorder { fail_on: Some(3), ..Recorder::default() };
        let err = s.run(&mut rec).unwrap_err();
        assert!(matches!(err, SimError::SpriteOutOfRange { tick: 3, .. }));
        assert_eq!(rec.ticks.len(), 3);
    }

    #[test]
    fn error_on_final_tick_is_swallowed() {
        // dying with no lives left: the run ends on the first tick
        let mut s = session(vec![vec![]; 40]);
        s.state.mode = Mode::Gameplay;
        s.state.lives = 0;
        s.state.dave.dead_timer = 1;
        let mut rec = Recorder { fail_on: Some(1), ..Recorder::default() };
        s.run(&mut rec).unwrap();
        assert!(matches!(s.state.outcome, Some(RunOutcome::GameOver { .. })));
    }
}
