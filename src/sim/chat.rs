/// Chat and typer screens: the on-screen keyboard key map, plus the
/// history snapshot the chat screen displays.

use super::event::{Effect, Sfx};
use super::screen::Screen;
use crate::domain::composer::TextComposer;
use crate::domain::input::Key;

/// Chat rows shown above the keyboard.
pub const CHAT_VISIBLE: usize = 6;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatLine {
    pub author: String,
    pub text: String,
}

impl ChatLine {
    pub fn new(author: impl Into<String>, text: impl Into<String>) -> Self {
        ChatLine { author: author.into(), text: text.into() }
    }
}

/// What Select does on the keyboard.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ComposerMode {
    /// Send the buffer.
    Chat,
    /// Toggle shift; nothing is ever sent.
    Typer,
}

/// Apply one key to a composer. Returns the next screen on Cancel.
pub fn compose(
    composer: &mut TextComposer,
    key: Key,
    mode: ComposerMode,
    fx: &mut Vec<Effect>,
) -> Option<Screen> {
    match key {
        Key::Left => composer.move_cursor(-1),
        Key::Right => composer.move_cursor(1),
        Key::Up => composer.append(),
        Key::Down => composer.delete(),
        Key::Shift => composer.toggle_shift(),
        Key::Select => match mode {
            ComposerMode::Chat => {
                if let Some(text) = composer.commit() {
                    fx.push(Effect::Sound(Sfx::Select));
                    fx.push(Effect::SendChat(text));
                }
            }
            ComposerMode::Typer => composer.toggle_shift(),
        },
        Key::Cancel => return Some(Screen::MainMenu),
        Key::Quit => {}
    }
    None
}

#[derive(Clone, Debug)]
pub struct ChatScreen {
    lines: Vec<ChatLine>,
    pub composer: TextComposer,
}

impl ChatScreen {
    pub fn new() -> Self {
        ChatScreen { lines: Vec::new(), composer: TextComposer::new() }
    }

    /// Replace the history with the transport's latest snapshot.
    pub fn set_lines(&mut self, lines: &[ChatLine]) {
        if self.lines.as_slice() != lines {
            self.lines = lines.to_vec();
        }
    }

    /// Newest `n` lines, oldest first.
    pub fn tail(&self, n: usize) -> &[ChatLine] {
        &self.lines[self.lines.len().saturating_sub(n)..]
    }
}
