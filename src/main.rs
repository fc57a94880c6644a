/// Entry point and frame loop.

mod config;
mod domain;
mod games;
mod net;
mod sim;
mod ui;

use std::fs::File;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{info, warn, Level};

use config::{AppConfig, ChatMode, LogConfig};
use net::transport::{ChatLink, ChatTransport};
use sim::chat::ChatLine;
use sim::event::Effect;
use sim::machine::ScreenMachine;
use sim::remote::{RemoteCommand, RemoteView};
use ui::draw::{self, Hud};
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::SoundEngine;
use ui::system::SystemControl;

fn main() -> Result<()> {
    let config = AppConfig::load();
    init_logging(&config.log);
    info!("pocketpet starting");

    let mut renderer = Renderer::new();
    let honor_release = renderer.init().context("terminal init failed")?;

    let result = run(&config, &mut renderer, honor_release);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    if let Err(e) = &result {
        tracing::error!("{e:#}");
    }
    result
}

/// Install the file logger. A log file that cannot be opened leaves the
/// program running without one.
fn init_logging(cfg: &LogConfig) {
    let Some(file) = open_log(cfg) else { return };
    let level: Level = cfg.level.parse().unwrap_or(Level::INFO);
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(level)
        .init();
}

fn open_log(cfg: &LogConfig) -> Option<File> {
    if cfg.file.is_empty() {
        return None;
    }
    match File::create(&cfg.file) {
        Ok(file) => Some(file),
        Err(e) => {
            eprintln!("Warning: cannot open log {}: {e}; logging disabled.", cfg.file);
            None
        }
    }
}

/// Everything the machine's effects are executed against.
struct Collaborators<'a> {
    config: &'a AppConfig,
    sound: Option<SoundEngine>,
    system: SystemControl,
    chat: Option<Box<dyn ChatTransport>>,
    remote_view: Arc<Mutex<RemoteView>>,
    remote_tx: Sender<RemoteCommand>,
    hud: Hud,
}

impl Collaborators<'_> {
    /// Returns false when the loop should stop.
    fn execute(&mut self, effects: Vec<Effect>) -> bool {
        for effect in effects {
            match effect {
                Effect::Quit => return false,
                Effect::StartChat => self.start_chat(),
                Effect::StartRemote => self.start_remote(),
                Effect::SendChat(text) => match self.chat.as_mut() {
                    Some(chat) => chat.enqueue_outgoing(text),
                    None => warn!("chat message dropped, no transport"),
                },
                Effect::Sound(sfx) => {
                    if let Some(s) = &self.sound {
                        s.play(sfx);
                    }
                }
                Effect::PlayMusic(track) => {
                    if let Some(s) = self.sound.as_mut() {
                        s.play_music(track);
                    }
                }
                Effect::StopMusic => {
                    if let Some(s) = self.sound.as_mut() {
                        s.stop_music();
                    }
                }
                Effect::SetVolume(v) => {
                    if let Some(s) = self.sound.as_mut() {
                        s.set_volume(v);
                    }
                    self.system.apply(&Effect::SetVolume(v));
                }
                other @ (Effect::SetWifi(_) | Effect::SetBluetooth(_) | Effect::SetOutput(_)) => {
                    self.system.apply(&other)
                }
            }
        }
        true
    }

    fn start_chat(&mut self) {
        let cfg = &self.config.chat;
        let link = match cfg.mode {
            ChatMode::Simulated => net::transport::spawn_simulated(&cfg.nick),
            ChatMode::Irc => net::irc::spawn(cfg),
        };
        self.chat = Some(match link {
            Ok(link) => Box::new(link),
            Err(e) => {
                warn!("chat transport failed to start: {e}");
                Box::new(failed_link(format!("chat unavailable: {e}")))
            }
        });
    }

    fn start_remote(&mut self) {
        let view = Arc::clone(&self.remote_view);
        match net::remote::spawn(&self.config.remote, view, self.remote_tx.clone()) {
            Ok(addr) => self.hud.remote_url = format!("http://{addr}/"),
            Err(e) => {
                warn!("remote panel failed to start: {e:#}");
                self.hud.remote_url = "unavailable".into();
            }
        }
    }
}

/// A link with no worker behind it, holding only an error line.
fn failed_link(message: String) -> ChatLink {
    let (in_tx, in_rx) = mpsc::channel();
    let (out_tx, _) = tokio::sync::mpsc::unbounded_channel();
    let _ = in_tx.send(ChatLine::new("error", message));
    ChatLink::new(in_rx, out_tx, "you")
}

fn run(config: &AppConfig, renderer: &mut Renderer, honor_release: bool) -> Result<()> {
    let mut kb = InputState::new();
    kb.honor_release = honor_release;
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    info!(gamepad = gp.connected, key_release = honor_release, "input ready");

    let (remote_tx, remote_rx): (Sender<RemoteCommand>, Receiver<RemoteCommand>) = mpsc::channel();
    let mut collab = Collaborators {
        config,
        sound: SoundEngine::new(config.sound.volume),
        system: SystemControl::new(config.system.shell_commands),
        chat: None,
        remote_view: Arc::new(Mutex::new(RemoteView::default())),
        remote_tx,
        hud: Hud::default(),
    };
    if collab.sound.is_none() {
        warn!("no audio output, running silent");
    }

    let mut machine = ScreenMachine::new(config);
    let start = Instant::now();

    loop {
        let mut events = kb.drain_events();
        events.extend(gp.update());
        for ev in events {
            let fx = machine.handle_event(ev);
            if !collab.execute(fx) {
                info!("quit requested");
                return Ok(());
            }
        }

        let fx = machine.tick(start.elapsed());
        if !collab.execute(fx) {
            return Ok(());
        }

        if let Some(chat) = collab.chat.as_mut() {
            machine.set_chat_lines(chat.poll_incoming());
        }
        while let Ok(cmd) = remote_rx.try_recv() {
            let fx = machine.apply_remote(cmd);
            if !collab.execute(fx) {
                return Ok(());
            }
        }
        *collab.remote_view.lock().unwrap_or_else(|p| p.into_inner()) = machine.remote_view();

        renderer.begin_frame()?;
        draw::draw(&machine, &collab.hud, renderer);
        renderer.end_frame()?;

        std::thread::sleep(config.timing.frame);
    }
}
