/// On-screen keyboard: a cursor over a fixed alphabet plus the text typed
/// so far. Shared by the chat and typer screens.

use super::selection::SelectionIndex;

pub const ALPHABET: &[char] = &[
    'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm',
    'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9',
    '.', ',', '!', '?', ' ',
];

/// Characters of the alphabet shown at once.
pub const KEYS_VISIBLE: usize = 10;

/// Longest buffer kept; older characters fall off the front.
pub const MAX_TEXT: usize = 60;

#[derive(Clone, Debug)]
pub struct TextComposer {
    cursor: SelectionIndex,
    text: String,
    shift: bool,
}

impl TextComposer {
    pub fn new() -> Self {
        TextComposer {
            cursor: SelectionIndex::new(ALPHABET.len(), KEYS_VISIBLE),
            text: String::new(),
            shift: false,
        }
    }

    pub fn reset(&mut self) {
        *self = TextComposer::new();
    }

    pub fn move_cursor(&mut self, delta: isize) {
        self.cursor.move_by(delta);
    }

    /// Character under the cursor, as it would be typed.
    pub fn cursor_char(&self) -> char {
        let ch = ALPHABET[self.cursor.current()];
        if self.shift { ch.to_ascii_uppercase() } else { ch }
    }

    pub fn cursor_index(&self) -> usize {
        self.cursor.current()
    }

    /// Visible slice of the alphabet with the absolute index of each key.
    pub fn visible_keys(&self) -> impl Iterator<Item = (usize, char)> + '_ {
        self.cursor.window().map(move |i| {
            let ch = ALPHABET[i];
            (i, if self.shift { ch.to_ascii_uppercase() } else { ch })
        })
    }

    /// Type the character under the cursor. Shift applies once.
    pub fn append(&mut self) {
        let ch = self.cursor_char();
        self.shift = false;
        self.text.push(ch);
        let len = self.text.chars().count();
        if len > MAX_TEXT {
            self.text = self.text.chars().skip(len - MAX_TEXT).collect();
        }
    }

    pub fn delete(&mut self) {
        self.text.pop();
    }

    pub fn toggle_shift(&mut self) {
        self.shift = !self.shift;
    }

    /// Take the buffer for sending. Empty buffers are not sent.
    pub fn commit(&mut self) -> Option<String> {
        if self.text.is_empty() {
            return None;
        }
        Some(std::mem::take(&mut self.text))
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn shift(&self) -> bool {
        self.shift
    }

    pub fn scroll(&self) -> usize {
        self.cursor.scroll()
    }
}
