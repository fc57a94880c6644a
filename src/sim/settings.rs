/// Settings list and the Sound sub-page.
///
/// Option values live here; changes that touch the outside world (wifi,
/// volume, bluetooth, output) are reported as effects.

use super::event::{Effect, Sfx};
use super::screen::Screen;
use crate::domain::input::Key;
use crate::domain::selection::SelectionIndex;

pub const DIFFICULTIES: &[&str] = &["Easy", "Normal", "Hard"];
pub const VOLUME_STEP: u8 = 10;

const SOUND_ROWS: usize = 3;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SettingValue {
    Submenu,
    Toggle(bool),
    Choice { choices: &'static [&'static str], index: usize },
}

#[derive(Clone, Debug)]
pub struct SettingOption {
    pub name: &'static str,
    pub value: SettingValue,
}

impl SettingOption {
    /// Row text, e.g. `WiFi: On`.
    pub fn display(&self) -> String {
        match &self.value {
            SettingValue::Submenu => format!("{} >", self.name),
            SettingValue::Toggle(on) => format!("{}: {}", self.name, on_off(*on)),
            SettingValue::Choice { choices, index } => format!("{}: {}", self.name, choices[*index]),
        }
    }

    /// Value as shown to the remote panel. `None` for submenus.
    pub fn value_text(&self) -> Option<String> {
        match &self.value {
            SettingValue::Submenu => None,
            SettingValue::Toggle(on) => Some(on.to_string()),
            SettingValue::Choice { choices, index } => Some(choices[*index].to_string()),
        }
    }

    /// Step a toggle or choice. Returns whether anything changed.
    fn cycle(&mut self, delta: isize) -> bool {
        match &mut self.value {
            SettingValue::Submenu => false,
            SettingValue::Toggle(on) => {
                *on = !*on;
                true
            }
            SettingValue::Choice { choices, index } => {
                let n = choices.len() as isize;
                *index = (*index as isize + delta).rem_euclid(n) as usize;
                true
            }
        }
    }
}

fn on_off(on: bool) -> &'static str {
    if on { "On" } else { "Off" }
}

#[derive(Clone, Debug)]
pub struct SoundSettings {
    pub volume: u8,
    pub bluetooth: bool,
    pub outputs: Vec<String>,
    pub output: usize,
    pub cursor: SelectionIndex,
}

impl SoundSettings {
    /// Row labels in display order.
    pub fn rows(&self) -> [String; SOUND_ROWS] {
        [
            format!("Volume: {}%", self.volume),
            format!("Bluetooth: {}", on_off(self.bluetooth)),
            format!("Output: {}", self.output_name()),
        ]
    }

    pub fn output_name(&self) -> &str {
        self.outputs.get(self.output).map(String::as_str).unwrap_or("-")
    }

    fn adjust(&mut self, delta: isize, fx: &mut Vec<Effect>) {
        match self.cursor.current() {
            0 => {
                let step = VOLUME_STEP as i16 * delta.signum() as i16;
                let volume = (self.volume as i16 + step).clamp(0, 100) as u8;
                if volume != self.volume {
                    self.volume = volume;
                    fx.push(Effect::SetVolume(volume));
                }
            }
            1 => {
                self.bluetooth = !self.bluetooth;
                fx.push(Effect::SetBluetooth(self.bluetooth));
            }
            _ => {
                if self.outputs.is_empty() {
                    return;
                }
                let n = self.outputs.len() as isize;
                self.output = (self.output as isize + delta).rem_euclid(n) as usize;
                fx.push(Effect::SetOutput(self.outputs[self.output].clone()));
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct Settings {
    options: Vec<SettingOption>,
    cursor: SelectionIndex,
    sound: SoundSettings,
}

impl Settings {
    pub fn new(volume: u8, outputs: Vec<String>) -> Self {
        let options = vec![
            SettingOption { name: "Sound", value: SettingValue::Submenu },
            SettingOption { name: "WiFi", value: SettingValue::Toggle(true) },
            SettingOption {
                name: "Difficulty",
                value: SettingValue::Choice { choices: DIFFICULTIES, index: 1 },
            },
            SettingOption { name: "Show Tips", value: SettingValue::Toggle(true) },
        ];
        Settings {
            cursor: SelectionIndex::new(options.len(), options.len()),
            options,
            sound: SoundSettings {
                volume: volume.min(100),
                bluetooth: false,
                outputs,
                output: 0,
                cursor: SelectionIndex::new(SOUND_ROWS, SOUND_ROWS),
            },
        }
    }

    pub fn options(&self) -> &[SettingOption] {
        &self.options
    }

    pub fn cursor(&self) -> &SelectionIndex {
        &self.cursor
    }

    pub fn sound(&self) -> &SoundSettings {
        &self.sound
    }

    pub fn option(&self, name: &str) -> Option<&SettingOption> {
        self.options.iter().find(|o| o.name == name)
    }

    pub fn enter(&mut self) {
        self.cursor.reset();
    }

    pub fn enter_sound(&mut self) {
        self.sound.cursor.reset();
    }

    pub fn handle(&mut self, key: Key, fx: &mut Vec<Effect>) -> Option<Screen> {
        match key {
            Key::Up | Key::Down => {
                self.cursor.move_by(if key == Key::Up { -1 } else { 1 });
                fx.push(Effect::Sound(Sfx::Move));
                None
            }
            Key::Left => {
                self.cycle_current(-1, fx);
                None
            }
            Key::Right => {
                self.cycle_current(1, fx);
                None
            }
            Key::Select => {
                let opt = self.options.get(self.cursor.current())?;
                if opt.value == SettingValue::Submenu {
                    fx.push(Effect::Sound(Sfx::Select));
                    return Some(Screen::SoundSettings);
                }
                self.cycle_current(1, fx);
                None
            }
            Key::Cancel => Some(Screen::MainMenu),
            _ => None,
        }
    }

    pub fn handle_sound(&mut self, key: Key, fx: &mut Vec<Effect>) -> Option<Screen> {
        match key {
            Key::Up | Key::Down => {
                self.sound.cursor.move_by(if key == Key::Up { -1 } else { 1 });
                fx.push(Effect::Sound(Sfx::Move));
                None
            }
            Key::Left => {
                self.sound.adjust(-1, fx);
                None
            }
            Key::Right => {
                self.sound.adjust(1, fx);
                None
            }
            Key::Select | Key::Cancel => Some(Screen::Settings),
            _ => None,
        }
    }

    /// Set an option by name from text. Booleans accept `true`/`false`
    /// (any case), choices accept one of their labels. Unknown names or
    /// values are ignored and reported as `false`.
    pub fn set_by_name(&mut self, name: &str, value: &str, fx: &mut Vec<Effect>) -> bool {
        let Some(opt) = self.options.iter_mut().find(|o| o.name == name) else {
            return false;
        };
        let changed = match &mut opt.value {
            SettingValue::Submenu => return false,
            SettingValue::Toggle(on) => match value.to_ascii_lowercase().as_str() {
                "true" => {
                    *on = true;
                    true
                }
                "false" => {
                    *on = false;
                    true
                }
                _ => false,
            },
            SettingValue::Choice { choices, index } => {
                match choices.iter().position(|c| c.eq_ignore_ascii_case(value)) {
                    Some(i) => {
                        *index = i;
                        true
                    }
                    None => false,
                }
            }
        };
        if changed {
            side_effect(opt, fx);
        }
        changed
    }

    fn cycle_current(&mut self, delta: isize, fx: &mut Vec<Effect>) {
        if let Some(opt) = self.options.get_mut(self.cursor.current()) {
            if opt.cycle(delta) {
                side_effect(opt, fx);
            }
        }
    }
}

fn side_effect(opt: &SettingOption, fx: &mut Vec<Effect>) {
    if let ("WiFi", SettingValue::Toggle(on)) = (opt.name, &opt.value) {
        fx.push(Effect::SetWifi(*on));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings::new(50, vec!["Headphones".into(), "HDMI".into()])
    }

    fn at(s: &mut Settings, name: &str) {
        s.cursor.reset();
        while s.options[s.cursor.current()].name != name {
            s.cursor.move_by(1);
        }
    }

    #[test]
    fn defaults() {
        let s = settings();
        let rows: Vec<String> = s.options().iter().map(SettingOption::display).collect();
        assert_eq!(rows, vec!["Sound >", "WiFi: On", "Difficulty: Normal", "Show Tips: On"]);
    }

    #[test]
    fn difficulty_cycles_both_ways() {
        let mut s = settings();
        at(&mut s, "Difficulty");
        let mut fx = Vec::new();
        s.handle(Key::Right, &mut fx);
        assert_eq!(s.option("Difficulty").unwrap().value_text().unwrap(), "Hard");
        s.handle(Key::Select, &mut fx);
        assert_eq!(s.option("Difficulty").unwrap().value_text().unwrap(), "Easy");
        s.handle(Key::Left, &mut fx);
        assert_eq!(s.option("Difficulty").unwrap().value_text().unwrap(), "Hard");
        assert!(fx.is_empty());
    }

    #[test]
    fn wifi_flip_emits_effect() {
        let mut s = settings();
        at(&mut s, "WiFi");
        let mut fx = Vec::new();
        s.handle(Key::Left, &mut fx);
        assert_eq!(fx, vec![Effect::SetWifi(false)]);
        assert_eq!(s.option("WiFi").unwrap().display(), "WiFi: Off");
    }

    #[test]
    fn sound_entry_and_exit() {
        let mut s = settings();
        let mut fx = Vec::new();
        assert_eq!(s.handle(Key::Select, &mut fx), Some(Screen::SoundSettings));
        assert_eq!(s.handle_sound(Key::Cancel, &mut fx), Some(Screen::Settings));
        assert_eq!(s.handle(Key::Cancel, &mut fx), Some(Screen::MainMenu));
    }

    #[test]
    fn volume_steps_and_clamps() {
        let mut s = Settings::new(90, vec![]);
        let mut fx = Vec::new();
        s.handle_sound(Key::Right, &mut fx);
        s.handle_sound(Key::Right, &mut fx);
        assert_eq!(s.sound().volume, 100);
        assert_eq!(fx, vec![Effect::SetVolume(100)]);
        for _ in 0..15 {
            s.handle_sound(Key::Left, &mut fx);
        }
        assert_eq!(s.sound().volume, 0);
    }

    #[test]
    fn output_cycles_configured_list() {
        let mut s = settings();
        let mut fx = Vec::new();
        s.handle_sound(Key::Up, &mut fx);
        fx.clear();
        s.handle_sound(Key::Right, &mut fx);
        assert_eq!(fx, vec![Effect::SetOutput("HDMI".into())]);
        s.handle_sound(Key::Right, &mut fx);
        assert_eq!(s.sound().output_name(), "Headphones");
    }

    #[test]
    fn bluetooth_toggles() {
        let mut s = settings();
        let mut fx = Vec::new();
        s.handle_sound(Key::Down, &mut fx);
        fx.clear();
        s.handle_sound(Key::Right, &mut fx);
        assert_eq!(fx, vec![Effect::SetBluetooth(true)]);
        assert_eq!(s.sound().rows()[1], "Bluetooth: On");
    }

    #[test]
    fn set_by_name_parses_values() {
        let mut s = settings();
        let mut fx = Vec::new();
        assert!(s.set_by_name("Difficulty", "hard", &mut fx));
        assert_eq!(s.option("Difficulty").unwrap().value_text().unwrap(), "Hard");
        assert!(s.set_by_name("WiFi", "False", &mut fx));
        assert_eq!(fx, vec![Effect::SetWifi(false)]);
        assert!(!s.set_by_name("Difficulty", "Nightmare", &mut fx));
        assert!(!s.set_by_name("Sound", "true", &mut fx));
        assert!(!s.set_by_name("Brightness", "9", &mut fx));
    }
}
