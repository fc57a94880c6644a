/// ScreenMachine: the router that owns every screen's state.
///
/// Input and time go in, effects come out. The frame loop feeds it
/// `InputEvent`s and the elapsed time, executes the returned effects, pushes
/// chat snapshots in with `set_chat_lines`, and applies remote commands.
/// Nothing in here blocks or does I/O.
///
/// ## Transitions
///
/// Every screen change goes through `transition()`, which runs the leave
/// hook of the old screen and the enter hook of the new one:
///   - leaving Tetris always stops the music, whatever the destination
///   - entering a game resets it (high scores survive)
///   - entering Chat starts the transport once per process
///   - entering Remote starts the server once, and the chat transport once
///   - Settings and Battle start at the top when entered from the menu, and
///     keep their cursor when coming back from one of their sub-screens

use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use super::battle::Battle;
use super::chat::{self, ChatLine, ChatScreen, ComposerMode};
use super::event::{Effect, Sfx, Track};
use super::inventory::Inventory;
use super::remote::{RemoteCommand, RemoteView, REMOTE_CHAT_TAIL};
use super::screen::{Screen, MENU, MENU_VISIBLE};
use super::settings::Settings;
use crate::config::AppConfig;
use crate::domain::composer::TextComposer;
use crate::domain::input::{InputEvent, Key};
use crate::domain::selection::SelectionIndex;
use crate::games::pong::Pong;
use crate::games::snake::Snake;
use crate::games::tetris::Tetris;
use crate::games::{GameEvent, MiniGame};

pub struct ScreenMachine {
    screen: Screen,
    menu: SelectionIndex,
    snake: Snake,
    pong: Pong,
    tetris: Tetris,
    battle: Battle,
    settings: Settings,
    inventory: Inventory,
    chat: ChatScreen,
    typer: TextComposer,
    chat_started: bool,
    remote_started: bool,
}

impl ScreenMachine {
    pub fn new(cfg: &AppConfig) -> Self {
        ScreenMachine::build(cfg, StdRng::from_entropy())
    }

    /// Deterministic machine: every game and the battle draw from RNGs
    /// derived from `seed`.
    #[cfg(test)]
    pub fn seeded(cfg: &AppConfig, seed: u64) -> Self {
        ScreenMachine::build(cfg, StdRng::seed_from_u64(seed))
    }

    fn build(cfg: &AppConfig, mut root: StdRng) -> Self {
        let mut fork = || StdRng::from_rng(&mut root).unwrap_or_else(|_| StdRng::from_entropy());
        ScreenMachine {
            screen: Screen::MainMenu,
            menu: SelectionIndex::new(MENU.len(), MENU_VISIBLE),
            snake: Snake::with_rng(cfg.timing.snake_move, fork()),
            pong: Pong::with_rng(cfg.timing.pong_tick, fork()),
            tetris: Tetris::with_rng(cfg.timing.tetris_drop, fork()),
            battle: Battle::with_rng(fork()),
            settings: Settings::new(cfg.sound.volume, cfg.sound.outputs.clone()),
            inventory: Inventory::new(),
            chat: ChatScreen::new(),
            typer: TextComposer::new(),
            chat_started: false,
            remote_started: false,
        }
    }

    // ── Accessors (read by the renderer) ──

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn menu(&self) -> &SelectionIndex {
        &self.menu
    }

    pub fn snake(&self) -> &Snake {
        &self.snake
    }

    pub fn pong(&self) -> &Pong {
        &self.pong
    }

    pub fn tetris(&self) -> &Tetris {
        &self.tetris
    }

    pub fn battle(&self) -> &Battle {
        &self.battle
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn chat(&self) -> &ChatScreen {
        &self.chat
    }

    pub fn typer(&self) -> &TextComposer {
        &self.typer
    }

    // ── Input ──

    pub fn handle_event(&mut self, event: InputEvent) -> Vec<Effect> {
        let mut fx = Vec::new();
        let key = match event {
            InputEvent::Press(Key::Quit) => {
                fx.push(Effect::Quit);
                return fx;
            }
            InputEvent::Press(key) => key,
            InputEvent::Release(_) => {
                if self.screen == Screen::Pong {
                    self.pong.handle_event(event);
                }
                return fx;
            }
        };

        let next = match self.screen {
            Screen::MainMenu => self.menu_key(key, &mut fx),
            Screen::DogPark | Screen::Remote => leave_on_select_or_cancel(key),
            Screen::Inventory => self.inventory.handle(key, &mut fx),
            Screen::Chat => chat::compose(&mut self.chat.composer, key, ComposerMode::Chat, &mut fx),
            Screen::Type => chat::compose(&mut self.typer, key, ComposerMode::Typer, &mut fx),
            Screen::Settings => self.settings.handle(key, &mut fx),
            Screen::SoundSettings => self.settings.handle_sound(key, &mut fx),
            Screen::Battle => self.battle.handle_menu(key, &mut fx),
            Screen::BattlePractice => self.battle.handle_practice(key, &mut fx),
            Screen::BattleGameLink => self.battle.handle_gamelink(key),
            Screen::Snake | Screen::Pong | Screen::Tetris => {
                match leave_on_select_or_cancel(key) {
                    Some(to) => Some(to),
                    None => {
                        let events = match self.screen {
                            Screen::Snake => self.snake.handle_event(event),
                            Screen::Pong => self.pong.handle_event(event),
                            _ => self.tetris.handle_event(event),
                        };
                        game_sounds(events, &mut fx);
                        None
                    }
                }
            }
        };

        if let Some(to) = next {
            self.transition(to, &mut fx);
        }
        fx
    }

    fn menu_key(&mut self, key: Key, fx: &mut Vec<Effect>) -> Option<Screen> {
        match key {
            Key::Up | Key::Down => {
                self.menu.move_by(if key == Key::Up { -1 } else { 1 });
                fx.push(Effect::Sound(Sfx::Move));
                None
            }
            Key::Select => {
                fx.push(Effect::Sound(Sfx::Select));
                self.menu.select(&MENU).copied()
            }
            _ => None,
        }
    }

    // ── Time ──

    /// Advance the active game. `now` is the time since program start.
    pub fn tick(&mut self, now: Duration) -> Vec<Effect> {
        let events = match self.screen {
            Screen::Snake => self.snake.tick(now),
            Screen::Pong => self.pong.tick(now),
            Screen::Tetris => self.tetris.tick(now),
            _ => return Vec::new(),
        };
        let mut fx = Vec::new();
        game_sounds(events, &mut fx);
        fx
    }

    // ── Transitions ──

    fn transition(&mut self, to: Screen, fx: &mut Vec<Effect>) {
        let from = self.screen;
        if from == to {
            return;
        }
        if from == Screen::Tetris {
            fx.push(Effect::StopMusic);
        }
        debug!(?from, ?to, "screen change");
        self.screen = to;

        match to {
            Screen::Snake => self.snake.reset(),
            Screen::Pong => self.pong.reset(),
            Screen::Tetris => {
                self.tetris.reset();
                fx.push(Effect::PlayMusic(Track::Tetris));
            }
            Screen::Chat => {
                self.start_chat(fx);
                self.chat.composer.reset();
            }
            Screen::Remote => {
                if !self.remote_started {
                    self.remote_started = true;
                    fx.push(Effect::StartRemote);
                }
                self.start_chat(fx);
            }
            Screen::Type => self.typer.reset(),
            Screen::Inventory => self.inventory.enter(),
            Screen::Settings if from == Screen::MainMenu => self.settings.enter(),
            Screen::SoundSettings => self.settings.enter_sound(),
            Screen::Battle if from == Screen::MainMenu => self.battle.enter(),
            Screen::BattlePractice => self.battle.start_practice(),
            _ => {}
        }
    }

    fn start_chat(&mut self, fx: &mut Vec<Effect>) {
        if !self.chat_started {
            self.chat_started = true;
            fx.push(Effect::StartChat);
        }
    }

    // ── Collaborators ──

    /// Latest transport history.
    pub fn set_chat_lines(&mut self, lines: &[ChatLine]) {
        self.chat.set_lines(lines);
    }

    pub fn apply_remote(&mut self, cmd: RemoteCommand) -> Vec<Effect> {
        let mut fx = Vec::new();
        match cmd {
            RemoteCommand::SetOption { name, value } => {
                if !self.settings.set_by_name(&name, &value, &mut fx) {
                    debug!(%name, %value, "remote set ignored");
                }
            }
            RemoteCommand::SendChat(text) => {
                if !text.is_empty() {
                    fx.push(Effect::SendChat(text));
                }
            }
            RemoteCommand::AddItem(item) => {
                if !item.is_empty() {
                    self.inventory.add_item(item);
                }
            }
            RemoteCommand::RemoveItem(index) => {
                self.inventory.remove_item(index);
            }
        }
        fx
    }

    /// Snapshot for the control panel.
    pub fn remote_view(&self) -> RemoteView {
        let text = |name: &str| {
            self.settings
                .option(name)
                .and_then(|o| o.value_text())
                .unwrap_or_default()
        };
        RemoteView {
            difficulty: text("Difficulty"),
            wifi: text("WiFi") == "true",
            items: self.inventory.items().to_vec(),
            chat: self.chat.tail(REMOTE_CHAT_TAIL).to_vec(),
        }
    }
}

fn leave_on_select_or_cancel(key: Key) -> Option<Screen> {
    matches!(key, Key::Select | Key::Cancel).then_some(Screen::MainMenu)
}

fn game_sounds(events: Vec<GameEvent>, fx: &mut Vec<Effect>) {
    for ev in events {
        let sfx = match ev {
            GameEvent::AppleEaten { .. } => Sfx::Apple,
            GameEvent::Crashed { .. } | GameEvent::BoardReset { .. } => Sfx::Crash,
            GameEvent::PaddleHit => Sfx::Paddle,
            GameEvent::PointWon { .. } => Sfx::Point,
            GameEvent::PointLost => Sfx::Miss,
            GameEvent::PieceLocked => Sfx::Lock,
            GameEvent::LinesCleared { .. } => Sfx::Line,
            GameEvent::NewHighScore { .. } => Sfx::Win,
        };
        fx.push(Effect::Sound(sfx));
    }
}
