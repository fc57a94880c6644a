/// Abstract input events.
///
/// Every physical source (keyboard, gamepad, GPIO joystick) is translated
/// into these before it reaches the state machine, so no screen ever sees a
/// raw key code.

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Select,
    Cancel,
    Shift,
    Quit,
}

/// A key transition. Only Pong listens to releases; every other screen
/// acts on presses alone.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum InputEvent {
    Press(Key),
    Release(Key),
}

impl InputEvent {
    /// The key if this is a press, `None` for releases.
    pub fn pressed(self) -> Option<Key> {
        match self {
            InputEvent::Press(k) => Some(k),
            InputEvent::Release(_) => None,
        }
    }
}
