/// System settings hooks: volume, radios and the default audio sink.
///
/// Disabled unless `[system] shell_commands = true`, so running on a
/// desktop never flips the host's WiFi.

use std::process::{Command, Stdio};

use tracing::{debug, warn};

use crate::sim::event::Effect;

pub struct SystemControl {
    enabled: bool,
}

impl SystemControl {
    pub fn new(enabled: bool) -> Self {
        SystemControl { enabled }
    }

    /// Run the command behind `effect`, if it has one. Does not wait.
    pub fn apply(&self, effect: &Effect) {
        let Some(args) = command_for(effect) else {
            return;
        };
        if !self.enabled {
            debug!(cmd = %args.join(" "), "shell commands disabled");
            return;
        }
        let spawned = Command::new(&args[0])
            .args(&args[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        match spawned {
            Ok(child) => debug!(cmd = %args.join(" "), pid = child.id(), "spawned"),
            Err(e) => warn!("{} failed: {e}", args[0]),
        }
    }
}

fn command_for(effect: &Effect) -> Option<Vec<String>> {
    let radio = |on: bool, dev: &str| {
        let verb = if on { "unblock" } else { "block" };
        vec!["rfkill".into(), verb.into(), dev.into()]
    };
    let args = match effect {
        Effect::SetVolume(v) => vec![
            "amixer".into(),
            "sset".into(),
            "Master".into(),
            format!("{v}%"),
        ],
        Effect::SetWifi(on) => radio(*on, "wifi"),
        Effect::SetBluetooth(on) => radio(*on, "bluetooth"),
        Effect::SetOutput(sink) => vec!["pactl".into(), "set-default-sink".into(), sink.clone()],
        _ => return None,
    };
    Some(args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_settings_to_commands() {
        assert_eq!(
            command_for(&Effect::SetVolume(70)).unwrap(),
            ["amixer", "sset", "Master", "70%"]
        );
        assert_eq!(command_for(&Effect::SetWifi(false)).unwrap(), ["rfkill", "block", "wifi"]);
        assert_eq!(
            command_for(&Effect::SetBluetooth(true)).unwrap(),
            ["rfkill", "unblock", "bluetooth"]
        );
        assert_eq!(
            command_for(&Effect::SetOutput("hdmi".into())).unwrap(),
            ["pactl", "set-default-sink", "hdmi"]
        );
    }

    #[test]
    fn other_effects_have_no_command() {
        assert!(command_for(&Effect::Quit).is_none());
        assert!(command_for(&Effect::StartChat).is_none());
    }

    #[test]
    fn disabled_control_runs_nothing() {
        SystemControl::new(false).apply(&Effect::SetWifi(false));
    }
}
