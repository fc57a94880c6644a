/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

// ── Public Config Struct ──

#[derive(Clone, Debug, Default)]
pub struct AppConfig {
    pub timing: TimingConfig,
    pub gamepad: GamepadConfig,
    pub chat: ChatConfig,
    pub remote: RemoteConfig,
    pub sound: SoundConfig,
    pub system: SystemConfig,
    pub log: LogConfig,
}

#[derive(Clone, Debug)]
pub struct TimingConfig {
    pub frame: Duration,
    pub snake_move: Duration,
    pub pong_tick: Duration,
    pub tetris_drop: Duration,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub select: Vec<String>,
    pub cancel: Vec<String>,
    pub shift: Vec<String>,
    pub quit: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    Simulated,
    Irc,
}

#[derive(Clone, Debug)]
pub struct ChatConfig {
    pub mode: ChatMode,
    pub server: String,
    pub port: u16,
    pub channel: String,
    pub nick: String,
}

#[derive(Clone, Debug)]
pub struct RemoteConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct SoundConfig {
    /// Initial volume in percent.
    pub volume: u8,
    pub outputs: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct SystemConfig {
    pub shell_commands: bool,
}

#[derive(Clone, Debug)]
pub struct LogConfig {
    /// Empty disables file logging.
    pub file: String,
    pub level: String,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    chat: TomlChat,
    #[serde(default)]
    remote: TomlRemote,
    #[serde(default)]
    sound: TomlSound,
    #[serde(default)]
    system: TomlSystem,
    #[serde(default)]
    log: TomlLog,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_frame")]
    frame_ms: u64,
    #[serde(default = "default_snake_move")]
    snake_move_ms: u64,
    #[serde(default = "default_pong_tick")]
    pong_tick_ms: u64,
    #[serde(default = "default_tetris_drop")]
    tetris_drop_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_pad_select")]
    select: Vec<String>,
    #[serde(default = "default_pad_cancel")]
    cancel: Vec<String>,
    #[serde(default = "default_pad_shift")]
    shift: Vec<String>,
    #[serde(default = "default_pad_quit")]
    quit: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlChat {
    #[serde(default = "default_chat_mode")]
    mode: ChatMode,
    #[serde(default = "default_irc_server")]
    server: String,
    #[serde(default = "default_irc_port")]
    port: u16,
    #[serde(default = "default_irc_channel")]
    channel: String,
    #[serde(default = "default_irc_nick")]
    nick: String,
}

#[derive(Deserialize, Debug)]
struct TomlRemote {
    #[serde(default = "default_remote_host")]
    host: String,
    #[serde(default = "default_remote_port")]
    port: u16,
}

#[derive(Deserialize, Debug)]
struct TomlSound {
    #[serde(default = "default_volume")]
    volume: u8,
    #[serde(default = "default_outputs")]
    outputs: Vec<String>,
}

#[derive(Deserialize, Debug, Default)]
struct TomlSystem {
    #[serde(default)]
    shell_commands: bool,
}

#[derive(Deserialize, Debug)]
struct TomlLog {
    #[serde(default = "default_log_file")]
    file: String,
    #[serde(default = "default_log_level")]
    level: String,
}

// ── Defaults ──

fn default_frame() -> u64 { 33 }
fn default_snake_move() -> u64 { 200 }
fn default_pong_tick() -> u64 { 33 }
fn default_tetris_drop() -> u64 { 500 }

fn default_pad_select() -> Vec<String> { vec!["A".into(), "Start".into()] }
fn default_pad_cancel() -> Vec<String> { vec!["B".into()] }
fn default_pad_shift() -> Vec<String> { vec!["X".into(), "Y".into()] }
fn default_pad_quit() -> Vec<String> { vec!["Select".into()] }

fn default_chat_mode() -> ChatMode { ChatMode::Simulated }
fn default_irc_server() -> String { "irc.libera.chat".into() }
fn default_irc_port() -> u16 { 6667 }
fn default_irc_channel() -> String { "#pocketpet".into() }
fn default_irc_nick() -> String { "virtualpet".into() }

fn default_remote_host() -> String { "0.0.0.0".into() }
fn default_remote_port() -> u16 { 8000 }

fn default_volume() -> u8 { 50 }
fn default_outputs() -> Vec<String> {
    vec!["Headphones".into(), "HDMI".into(), "Bluetooth".into()]
}

fn default_log_file() -> String { "pocketpet.log".into() }
fn default_log_level() -> String { "info".into() }

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            frame_ms: default_frame(),
            snake_move_ms: default_snake_move(),
            pong_tick_ms: default_pong_tick(),
            tetris_drop_ms: default_tetris_drop(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            select: default_pad_select(),
            cancel: default_pad_cancel(),
            shift: default_pad_shift(),
            quit: default_pad_quit(),
        }
    }
}

impl Default for TomlChat {
    fn default() -> Self {
        TomlChat {
            mode: default_chat_mode(),
            server: default_irc_server(),
            port: default_irc_port(),
            channel: default_irc_channel(),
            nick: default_irc_nick(),
        }
    }
}

impl Default for TomlRemote {
    fn default() -> Self {
        TomlRemote {
            host: default_remote_host(),
            port: default_remote_port(),
        }
    }
}

impl Default for TomlSound {
    fn default() -> Self {
        TomlSound {
            volume: default_volume(),
            outputs: default_outputs(),
        }
    }
}

impl Default for TomlLog {
    fn default() -> Self {
        TomlLog {
            file: default_log_file(),
            level: default_log_level(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        TomlConfig::default().into_app().timing
    }
}

impl Default for GamepadConfig {
    fn default() -> Self {
        TomlConfig::default().into_app().gamepad
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        TomlConfig::default().into_app().chat
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        TomlConfig::default().into_app().remote
    }
}

impl Default for SoundConfig {
    fn default() -> Self {
        TomlConfig::default().into_app().sound
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        SystemConfig { shell_commands: false }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        TomlConfig::default().into_app().log
    }
}

impl TomlConfig {
    fn into_app(self) -> AppConfig {
        let mut outputs = self.sound.outputs;
        if outputs.is_empty() {
            outputs = default_outputs();
        }
        AppConfig {
            timing: TimingConfig {
                frame: Duration::from_millis(self.timing.frame_ms.max(1)),
                snake_move: Duration::from_millis(self.timing.snake_move_ms),
                pong_tick: Duration::from_millis(self.timing.pong_tick_ms),
                tetris_drop: Duration::from_millis(self.timing.tetris_drop_ms),
            },
            gamepad: GamepadConfig {
                select: self.gamepad.select,
                cancel: self.gamepad.cancel,
                shift: self.gamepad.shift,
                quit: self.gamepad.quit,
            },
            chat: ChatConfig {
                mode: self.chat.mode,
                server: self.chat.server,
                port: self.chat.port,
                channel: self.chat.channel,
                nick: self.chat.nick,
            },
            remote: RemoteConfig {
                host: self.remote.host,
                port: self.remote.port,
            },
            sound: SoundConfig {
                volume: self.sound.volume.min(100),
                outputs,
            },
            system: SystemConfig {
                shell_commands: self.system.shell_commands,
            },
            log: LogConfig {
                file: self.log.file,
                level: self.log.level,
            },
        }
    }
}

// ── Loading ──

impl AppConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory,
    /// (3) `~/.local/share/pocketpet`.
    /// Missing file or missing keys fall back to defaults.
    pub fn load() -> Self {
        load_toml(&candidate_dirs())
    }

    /// Parse a config document; missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<TomlConfig>(text).map(TomlConfig::into_app)
    }
}

/// Candidate directories to search: exe dir + CWD + data home (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/pocketpet");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
/// Logging is not up yet when this runs, so warnings go to stderr.
fn load_toml(search_dirs: &[PathBuf]) -> AppConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match AppConfig::from_toml_str(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        eprintln!("Warning: config.toml parse error: {e}");
                        eprintln!("Using default settings.");
                        return AppConfig::default();
                    }
                },
                Err(e) => {
                    eprintln!("Warning: could not read {}: {e}", path.display());
                }
            }
        }
    }
    AppConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let cfg = AppConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.timing.frame, Duration::from_millis(33));
        assert_eq!(cfg.timing.snake_move, Duration::from_millis(200));
        assert_eq!(cfg.chat.mode, ChatMode::Simulated);
        assert_eq!(cfg.chat.port, 6667);
        assert_eq!(cfg.remote.port, 8000);
        assert_eq!(cfg.sound.volume, 50);
        assert_eq!(cfg.sound.outputs.len(), 3);
        assert!(!cfg.system.shell_commands);
        assert_eq!(cfg.log.level, "info");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = AppConfig::from_toml_str(
            "[timing]\nsnake_move_ms = 120\n[chat]\nmode = \"irc\"\nnick = \"rex\"\n",
        )
        .unwrap();
        assert_eq!(cfg.timing.snake_move, Duration::from_millis(120));
        assert_eq!(cfg.timing.tetris_drop, Duration::from_millis(500));
        assert_eq!(cfg.chat.mode, ChatMode::Irc);
        assert_eq!(cfg.chat.nick, "rex");
        assert_eq!(cfg.chat.server, "irc.libera.chat");
    }

    #[test]
    fn volume_and_outputs_sanitized() {
        let cfg = AppConfig::from_toml_str("[sound]\nvolume = 250\noutputs = []\n").unwrap();
        assert_eq!(cfg.sound.volume, 100);
        assert_eq!(cfg.sound.outputs, default_outputs());
    }

    #[test]
    fn unknown_chat_mode_is_an_error() {
        assert!(AppConfig::from_toml_str("[chat]\nmode = \"carrier-pigeon\"\n").is_err());
    }
}
