/// Mini-games: three independent update-on-tick state machines.
///
/// Each game owns its RNG and movement gate; the plain-data state it
/// exposes through `state()` is what the renderer reads.

pub mod pong;
pub mod snake;
pub mod tetris;

use std::time::Duration;

use crate::domain::input::InputEvent;

/// Events emitted by a game step.
/// The state machine turns these into sound effects.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameEvent {
    AppleEaten { score: u32 },
    Crashed { score: u32 },
    PaddleHit,
    PointWon { score: u32 },
    PointLost,
    PieceLocked,
    LinesCleared { lines: u32 },
    BoardReset { score: u32 },
    NewHighScore { score: u32 },
}

pub trait MiniGame {
    type State;

    /// Apply one input event. Events the game does not use are ignored.
    fn handle_event(&mut self, event: InputEvent) -> Vec<GameEvent>;

    /// Advance the game if its interval has elapsed. `now` is the time
    /// since program start.
    fn tick(&mut self, now: Duration) -> Vec<GameEvent>;

    /// Start a fresh round. High scores survive.
    fn reset(&mut self);

    fn state(&self) -> &Self::State;
}

/// Record `score` as the new best if it beats `high`.
fn record_high(score: u32, high: &mut u32, events: &mut Vec<GameEvent>) {
    if score > *high {
        *high = score;
        events.push(GameEvent::NewHighScore { score });
    }
}
