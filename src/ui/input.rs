/// Keyboard input: crossterm key events to `InputEvent`s.
///
/// Every press or auto-repeat becomes a `Press`. Releases come from the
/// terminal when keyboard enhancement is confirmed working; otherwise a key
/// is considered released once no press/repeat has arrived for
/// `HOLD_TIMEOUT`.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::input::{InputEvent, Key};

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

/// Physical key to logical key.
pub fn key_for(event: &KeyEvent) -> Option<Key> {
    if event.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(event.code, KeyCode::Char('c') | KeyCode::Char('C'))
    {
        return Some(Key::Quit);
    }
    match event.code {
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => Some(Key::Up),
        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => Some(Key::Down),
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => Some(Key::Left),
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => Some(Key::Right),
        KeyCode::Enter | KeyCode::Char(' ') => Some(Key::Select),
        KeyCode::Esc | KeyCode::Backspace => Some(Key::Cancel),
        KeyCode::Tab => Some(Key::Shift),
        KeyCode::Char('q') | KeyCode::Char('Q') => Some(Key::Quit),
        _ => None,
    }
}

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each held key.
    last_active: HashMap<Key, Instant>,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(8),
            honor_release: false,
        }
    }

    /// Drain all pending terminal events. Call once per frame.
    pub fn drain_events(&mut self) -> Vec<InputEvent> {
        let mut out = Vec::new();
        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.feed(&key, Instant::now(), &mut out);
            }
        }
        self.expire(Instant::now(), &mut out);
        out
    }

    fn feed(&mut self, event: &KeyEvent, now: Instant, out: &mut Vec<InputEvent>) {
        let Some(key) = key_for(event) else { return };
        match event.kind {
            KeyEventKind::Release if self.honor_release => {
                if self.last_active.remove(&key).is_some() {
                    out.push(InputEvent::Release(key));
                }
            }
            // Unconfirmed releases are left to the timeout.
            KeyEventKind::Release => {}
            _ => {
                self.last_active.insert(key, now);
                out.push(InputEvent::Press(key));
            }
        }
    }

    /// Synthesize releases for keys that went quiet.
    fn expire(&mut self, now: Instant, out: &mut Vec<InputEvent>) {
        let mut gone: Vec<Key> = self
            .last_active
            .iter()
            .filter(|(_, t)| now.duration_since(**t) >= HOLD_TIMEOUT)
            .map(|(k, _)| *k)
            .collect();
        gone.sort_by_key(|k| *k as u8);
        for key in gone {
            self.last_active.remove(&key);
            out.push(InputEvent::Release(key));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(code: KeyCode, kind: KeyEventKind) -> KeyEvent {
        KeyEvent::new_with_kind(code, KeyModifiers::NONE, kind)
    }

    #[test]
    fn keymap() {
        let k = |code| key_for(&KeyEvent::new(code, KeyModifiers::NONE));
        assert_eq!(k(KeyCode::Char('w')), Some(Key::Up));
        assert_eq!(k(KeyCode::Left), Some(Key::Left));
        assert_eq!(k(KeyCode::Char(' ')), Some(Key::Select));
        assert_eq!(k(KeyCode::Backspace), Some(Key::Cancel));
        assert_eq!(k(KeyCode::Tab), Some(Key::Shift));
        assert_eq!(k(KeyCode::Char('x')), None);
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(key_for(&ctrl_c), Some(Key::Quit));
    }

    #[test]
    fn repeats_press_and_times_out() {
        let mut input = InputState::new();
        let t0 = Instant::now();
        let mut out = Vec::new();
        input.feed(&ev(KeyCode::Up, KeyEventKind::Press), t0, &mut out);
        input.feed(&ev(KeyCode::Up, KeyEventKind::Repeat), t0 + Duration::from_millis(100), &mut out);
        input.expire(t0 + Duration::from_millis(200), &mut out);
        assert_eq!(out, vec![InputEvent::Press(Key::Up), InputEvent::Press(Key::Up)]);
        input.expire(t0 + Duration::from_millis(260), &mut out);
        assert_eq!(out.last(), Some(&InputEvent::Release(Key::Up)));
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn release_honored_only_when_enabled() {
        let mut input = InputState::new();
        let t0 = Instant::now();
        let mut out = Vec::new();
        input.feed(&ev(KeyCode::Down, KeyEventKind::Press), t0, &mut out);
        input.feed(&ev(KeyCode::Down, KeyEventKind::Release), t0, &mut out);
        assert_eq!(out, vec![InputEvent::Press(Key::Down)]);

        input.honor_release = true;
        input.feed(&ev(KeyCode::Down, KeyEventKind::Release), t0, &mut out);
        assert_eq!(out.last(), Some(&InputEvent::Release(Key::Down)));
        input.expire(t0 + Duration::from_secs(1), &mut out);
        assert_eq!(out.len(), 2);
    }
}
