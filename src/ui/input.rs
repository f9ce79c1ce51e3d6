/// Keyboard and combined input.
///
/// Tracks which keys are currently held down. The simulation samples
/// held state once per tick, so a key only needs to be down at the tick
/// boundary to count.
///
/// Uses crossterm's keyboard enhancement for Release events when available.
/// Falls back to timeout-based release detection on terminals that don't support it.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::sim::driver::{Action, InputSource};
use super::gamepad::GamepadState;

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

/// Keys bound to each action.
pub fn action_keys(action: Action) -> &'static [KeyCode] {
    match action {
        Action::Left => &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')],
        Action::Right => &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')],
        Action::Up => &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')],
        Action::Down => &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')],
        Action::Fire => &[
            KeyCode::Char('z'),
            KeyCode::Char('Z'),
            KeyCode::Char('f'),
            KeyCode::Char('F'),
        ],
        Action::Jetpack => &[
            KeyCode::Char('x'),
            KeyCode::Char('X'),
            KeyCode::Char('j'),
            KeyCode::Char('J'),
        ],
        Action::Start => &[KeyCode::Enter, KeyCode::Char(' ')],
    }
}

/// Esc, q or Ctrl+C.
pub fn is_quit_key(key: &KeyEvent) -> bool {
    if key.kind == KeyEventKind::Release {
        return false;
    }
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => true,
        KeyCode::Char('c') | KeyCode::Char('C') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Raw key events collected during drain, for meta-key handling.
    pub raw_events: Vec<KeyEvent>,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Drain all pending terminal events and update key states.
    /// Call this once per tick, before the simulation step.
    pub fn drain_events(&mut self) {
        self.raw_events.clear();

        // Read all available events without blocking
        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.apply(key, Instant::now());
            }
        }

        self.expire(Instant::now());
    }

    /// Record one key event as if it arrived at `now`.
    pub fn apply(&mut self, key: KeyEvent, now: Instant) {
        self.raw_events.push(key);
        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
            }
            KeyEventKind::Release => {
                // rely on timeout-based expiry instead
            }
            _ => {
                self.last_active.insert(key.code, now);
            }
        }
    }

    /// Drop keys with no Press/Repeat for `HOLD_TIMEOUT`.
    pub fn expire(&mut self, now: Instant) {
        self.last_active
            .retain(|_, t| now.saturating_duration_since(*t) < HOLD_TIMEOUT);
    }

    pub fn is_held(&self, code: KeyCode) -> bool {
        self.last_active.contains_key(&code)
    }

    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(*c))
    }

    pub fn action_held(&self, action: Action) -> bool {
        self.any_held(action_keys(action))
    }

    pub fn quit_pressed(&self) -> bool {
        self.raw_events.iter().any(is_quit_key)
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

// ── Combined keyboard + gamepad ──

pub struct Controls {
    pub keyboard: InputState,
    pub gamepad: GamepadState,
}

impl Controls {
    pub fn new(keyboard: InputState, gamepad: GamepadState) -> Self {
        Controls { keyboard, gamepad }
    }
}

impl InputSource for Controls {
    fn poll(&mut self) {
        self.keyboard.drain_events();
        self.gamepad.update();
    }

    fn is_held(&self, action: Action) -> bool {
        self.keyboard.action_held(action) || self.gamepad.is_held(action)
    }

    fn quit_requested(&self) -> bool {
        self.keyboard.quit_pressed() || self.gamepad.quit_held()
    }
}
