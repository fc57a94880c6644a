/// Gamepad input using gilrs.
///
/// Button mapping is loaded from config.toml via `load_button_config()`.
/// Default mapping:
///   D-pad / Left Stick    →  Directions
///   A / Start             →  Select
///   B                     →  Cancel
///   X / Y                 →  Shift
///   Select                →  Quit
///
/// Each logical key is compared with its state on the previous poll, so a
/// held D-pad produces exactly one Press and one Release.

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};

use crate::config::GamepadConfig;
use crate::domain::input::{InputEvent, Key};

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.25;

/// Logical button identifiers (one per physical button).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    L1,      // LeftTrigger
    R1,      // RightTrigger
    Start,
    Select,
}

const BTN_COUNT: usize = 8;

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH"  => Some(Btn::A),
            "B" | "EAST"   => Some(Btn::B),
            "X" | "WEST"   => Some(Btn::X),
            "Y" | "NORTH"  => Some(Btn::Y),
            "L1" | "LB" | "LEFTTRIGGER"  => Some(Btn::L1),
            "R1" | "RB" | "RIGHTTRIGGER" => Some(Btn::R1),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South     => Some(Btn::A),
            Button::East      => Some(Btn::B),
            Button::West      => Some(Btn::X),
            Button::North     => Some(Btn::Y),
            Button::LeftTrigger  => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::Start     => Some(Btn::Start),
            Button::Select    => Some(Btn::Select),
            _ => None,
        }
    }
}

/// Logical keys in a fixed order, used to index held state.
const KEYS: [Key; 8] = [
    Key::Up,
    Key::Down,
    Key::Left,
    Key::Right,
    Key::Select,
    Key::Cancel,
    Key::Shift,
    Key::Quit,
];

/// Action-to-button mapping (loaded from config).
struct ActionMap {
    select: Vec<Btn>,
    cancel: Vec<Btn>,
    shift: Vec<Btn>,
    quit: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            select: vec![Btn::A, Btn::Start],
            cancel: vec![Btn::B],
            shift:  vec![Btn::X, Btn::Y],
            quit:   vec![Btn::Select],
        }
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    buttons: [bool; BTN_COUNT],
    /// Up, down, left, right.
    dpad: [bool; 4],
    stick_x: f32,
    stick_y: f32,

    action_map: ActionMap,

    /// Logical key state after the previous poll, indexed like `KEYS`.
    prev: [bool; 8],

    pub connected: bool,
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs_opt, connected) = {
            match Gilrs::new() {
                Ok(g) => {
                    let has_pad = g.gamepads().next().is_some();
                    (Some(g), has_pad)
                }
                Err(_) => (None, false),
            }
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: gilrs_opt,
            buttons: [false; BTN_COUNT],
            dpad: [false; 4],
            stick_x: 0.0,
            stick_y: 0.0,
            action_map: ActionMap::default(),
            prev: [false; 8],
            connected,
        }
    }

    /// Load button mapping from config. Empty or unparseable lists keep
    /// the default for that action.
    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        fn parse_into(names: &[String], slot: &mut Vec<Btn>) {
            let parsed: Vec<Btn> = names.iter().filter_map(|s| Btn::from_name(s)).collect();
            if !parsed.is_empty() {
                *slot = parsed;
            }
        }
        let map = &mut self.action_map;
        parse_into(&cfg.select, &mut map.select);
        parse_into(&cfg.cancel, &mut map.cancel);
        parse_into(&cfg.shift, &mut map.shift);
        parse_into(&cfg.quit, &mut map.quit);
    }

    /// Poll the pad and report key transitions since the last call.
    pub fn update(&mut self) -> Vec<InputEvent> {
        #[cfg(feature = "gamepad")]
        self.poll_gilrs();

        self.transitions()
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
                    self.connected = true;
                    tracing::info!("gamepad connected");
                }
                EventType::Disconnected => {
                    self.connected = false;
                    self.release_all();
                    tracing::info!("gamepad disconnected");
                }
                _ => {}
            }
        }
    }

    #[cfg(feature = "gamepad")]
    fn set_button(&mut self, gilrs_btn: Button, held: bool) {
        // D-pad is tracked apart from the face buttons.
        let dpad = match gilrs_btn {
            Button::DPadUp => Some(0),
            Button::DPadDown => Some(1),
            Button::DPadLeft => Some(2),
            Button::DPadRight => Some(3),
            _ => None,
        };
        if let Some(i) = dpad {
            self.dpad[i] = held;
        } else if let Some(btn) = Btn::from_gilrs(gilrs_btn) {
            self.buttons[btn as usize] = held;
        }
    }

    fn any_held(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.buttons[b as usize])
    }

    /// Current held state of each logical key, indexed like `KEYS`.
    fn held_keys(&self) -> [bool; 8] {
        [
            self.dpad[0] || self.stick_y > STICK_DEADZONE,
            self.dpad[1] || self.stick_y < -STICK_DEADZONE,
            self.dpad[2] || self.stick_x < -STICK_DEADZONE,
            self.dpad[3] || self.stick_x > STICK_DEADZONE,
            self.any_held(&self.action_map.select),
            self.any_held(&self.action_map.cancel),
            self.any_held(&self.action_map.shift),
            self.any_held(&self.action_map.quit),
        ]
    }

    fn transitions(&mut self) -> Vec<InputEvent> {
        let now = self.held_keys();
        let mut out = Vec::new();
        for (i, key) in KEYS.into_iter().enumerate() {
            match (self.prev[i], now[i]) {
                (false, true) => out.push(InputEvent::Press(key)),
                (true, false) => out.push(InputEvent::Release(key)),
                _ => {}
            }
        }
        self.prev = now;
        out
    }

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn release_all(&mut self) {
        self.buttons = [false; BTN_COUNT];
        self.dpad = [false; 4];
        self.stick_x = 0.0;
        self.stick_y = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dpad_edges() {
        let mut pad = GamepadState::new();
        pad.dpad[0] = true;
        assert_eq!(pad.transitions(), vec![InputEvent::Press(Key::Up)]);
        assert!(pad.transitions().is_empty());
        pad.dpad[0] = false;
        assert_eq!(pad.transitions(), vec![InputEvent::Release(Key::Up)]);
    }

    #[test]
    fn stick_past_deadzone_is_a_direction() {
        let mut pad = GamepadState::new();
        pad.stick_x = -0.1;
        assert!(pad.transitions().is_empty());
        pad.stick_x = -0.8;
        assert_eq!(pad.transitions(), vec![InputEvent::Press(Key::Left)]);
    }

    #[test]
    fn config_remaps_actions() {
        let mut pad = GamepadState::new();
        pad.load_button_config(&GamepadConfig {
            select: vec!["b".into()],
            cancel: vec!["a".into()],
            shift: vec!["nonsense".into()],
            quit: vec![],
        });
        pad.buttons[Btn::B as usize] = true;
        assert_eq!(pad.transitions(), vec![InputEvent::Press(Key::Select)]);
        pad.buttons[Btn::X as usize] = true;
        assert_eq!(pad.transitions(), vec![InputEvent::Press(Key::Shift)]);
    }

    #[test]
    fn release_all_releases_keys() {
        let mut pad = GamepadState::new();
        pad.buttons[Btn::Start as usize] = true;
        pad.transitions();
        pad.release_all();
        assert_eq!(pad.transitions(), vec![InputEvent::Release(Key::Select)]);
    }
}
