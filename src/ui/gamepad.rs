/// Gamepad input via gilrs.
///
/// Button mapping comes from the `[gamepad]` table of config.toml.
/// Default mapping:
///   D-pad / Left Stick    →  Left / Right / Up (jump, climb) / Down
///   A / X                 →  Fire
///   B / Y                 →  Jetpack
///   Start                 →  Start
///   Select                →  Quit
///
/// Everything is level-triggered: the simulation only asks what is held.

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};

use crate::config::GamepadConfig;
use crate::sim::driver::Action;

const STICK_DEADZONE: f32 = 0.25;

/// Logical button identifiers (one per physical button).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,      // South
    B,      // East
    X,      // West
    Y,      // North
    L1,
    R1,
    L2,
    R2,
    Start,
    Select,
}

impl Btn {
    pub fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH" => Some(Btn::A),
            "B" | "EAST" => Some(Btn::B),
            "X" | "WEST" => Some(Btn::X),
            "Y" | "NORTH" => Some(Btn::Y),
            "L1" | "LB" => Some(Btn::L1),
            "R1" | "RB" => Some(Btn::R1),
            "L2" | "LT" => Some(Btn::L2),
            "R2" | "RT" => Some(Btn::R2),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South => Some(Btn::A),
            Button::East => Some(Btn::B),
            Button::West => Some(Btn::X),
            Button::North => Some(Btn::Y),
            Button::LeftTrigger => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::LeftTrigger2 => Some(Btn::L2),
            Button::RightTrigger2 => Some(Btn::R2),
            Button::Start => Some(Btn::Start),
            Button::Select => Some(Btn::Select),
            _ => None,
        }
    }
}

/// Action-to-button mapping.
#[derive(Debug, PartialEq, Eq)]
struct ButtonMap {
    fire: Vec<Btn>,
    jetpack: Vec<Btn>,
    start: Vec<Btn>,
    quit: Vec<Btn>,
}

impl Default for ButtonMap {
    fn default() -> Self {
        ButtonMap {
            fire: vec![Btn::A, Btn::X],
            jetpack: vec![Btn::B, Btn::Y],
            start: vec![Btn::Start],
            quit: vec![Btn::Select],
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct Dpad {
    up: bool,
    down: bool,
    left: bool,
    right: bool,
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    buttons: [bool; 10],
    dpad: Dpad,
    stick_x: f32,
    stick_y: f32,
    map: ButtonMap,

    pub connected: bool,
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs_opt, connected) = match Gilrs::new() {
            Ok(g) => {
                let has_pad = g.gamepads().next().is_some();
                (Some(g), has_pad)
            }
            Err(e) => {
                log::warn!("gamepad support unavailable: {e}");
                (None, false)
            }
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: gilrs_opt,
            buttons: [false; 10],
            dpad: Dpad::default(),
            stick_x: 0.0,
            stick_y: 0.0,
            map: ButtonMap::default(),
            connected,
        }
    }

    /// Replace default bindings with configured ones. Lists with no
    /// recognisable button name keep their defaults.
    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        fn parse_list(names: &[String], slot: &mut Vec<Btn>) {
            let parsed: Vec<Btn> = names.iter().filter_map(|s| Btn::from_name(s)).collect();
            if parsed.is_empty() {
                log::warn!("no valid gamepad buttons in {names:?}, keeping defaults");
            } else {
                *slot = parsed;
            }
        }
        parse_list(&cfg.fire, &mut self.map.fire);
        parse_list(&cfg.jetpack, &mut self.map.jetpack);
        parse_list(&cfg.start, &mut self.map.start);
        parse_list(&cfg.quit, &mut self.map.quit);
    }

    pub fn update(&mut self) {
        #[cfg(feature = "gamepad")]
        self.poll_gilrs();
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let gilrs = match &mut self.gilrs {
            Some(g) => g,
            None => return,
        };

        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, true);
                }
                EventType::ButtonReleased(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, false);
                }
                EventType::AxisChanged(axis, value, _) => {
                    self.connected = true;
                    match axis {
                        Axis::LeftStickX => self.stick_x = value,
                        Axis::LeftStickY => self.stick_y = value,
                        _ => {}
                    }
                }
                EventType::Connected => {
                    log::info!("gamepad connected");
                    self.connected = true;
                }
                EventType::Disconnected => {
                    log::info!("gamepad disconnected");
                    self.connected = false;
                    self.release_all();
                }
                _ => {}
            }
        }
    }

    #[cfg(feature = "gamepad")]
    fn set_button(&mut self, gilrs_btn: Button, held: bool) {
        match gilrs_btn {
            Button::DPadUp => self.dpad.up = held,
            Button::DPadDown => self.dpad.down = held,
            Button::DPadLeft => self.dpad.left = held,
            Button::DPadRight => self.dpad.right = held,
            other => {
                if let Some(btn) = Btn::from_gilrs(other) {
                    self.buttons[btn as usize] = held;
                }
            }
        }
    }

    fn any_held(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.buttons[b as usize])
    }

    pub fn is_held(&self, action: Action) -> bool {
        match action {
            Action::Left => self.dpad.left || self.stick_x < -STICK_DEADZONE,
            Action::Right => self.dpad.right || self.stick_x > STICK_DEADZONE,
            Action::Up => self.dpad.up || self.stick_y > STICK_DEADZONE,
            Action::Down => self.dpad.down || self.stick_y < -STICK_DEADZONE,
            Action::Fire => self.any_held(&self.map.fire),
            Action::Jetpack => self.any_held(&self.map.jetpack),
            Action::Start => self.any_held(&self.map.start),
        }
    }

    pub fn quit_held(&self) -> bool {
        self.any_held(&self.map.quit)
    }

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn release_all(&mut self) {
        self.buttons = [false; 10];
        self.dpad = Dpad::default();
        self.stick_x = 0.0;
        self.stick_y = 0.0;
    }
}

impl Default for GamepadState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline() -> GamepadState {
        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: None,
            buttons: [false; 10],
            dpad: Dpad::default(),
            stick_x: 0.0,
            stick_y: 0.0,
            map: ButtonMap::default(),
            connected: false,
        }
    }

    #[test]
    fn button_names_case_insensitive() {
        assert_eq!(Btn::from_name("a"), Some(Btn::A));
        assert_eq!(Btn::from_name("Back"), Some(Btn::Select));
        assert_eq!(Btn::from_name("rt"), Some(Btn::R2));
        assert_eq!(Btn::from_name("turbo"), None);
    }

    #[test]
    fn config_overrides_only_valid_lists() {
        let mut pad = offline();
        pad.load_button_config(&GamepadConfig {
            fire: vec!["R1".into()],
            jetpack: vec!["nonsense".into()],
            start: vec!["A".into(), "Start".into()],
            quit: vec![],
        });
        assert_eq!(pad.map.fire, vec![Btn::R1]);
        assert_eq!(pad.map.jetpack, vec![Btn::B, Btn::Y]);
        assert_eq!(pad.map.start, vec![Btn::A, Btn::Start]);
        assert_eq!(pad.map.quit, vec![Btn::Select]);
    }

    #[test]
    fn held_buttons_map_to_actions() {
        let mut pad = offline();
        pad.buttons[Btn::Y as usize] = true;
        pad.stick_x = -0.8;
        assert!(pad.is_held(Action::Jetpack));
        assert!(pad.is_held(Action::Left));
        assert!(!pad.is_held(Action::Right));
        assert!(!pad.is_held(Action::Fire));
        pad.stick_x = 0.1;
        assert!(!pad.is_held(Action::Left));
        pad.buttons[Btn::Select as usize] = true;
        assert!(pad.quit_held());
    }
}
