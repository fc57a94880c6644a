/// Snake on a 16x16 grid.
///
/// The body is a deque with the head at the front. Each gated tick moves
/// the head one cell; eating the apple skips the tail pop so the snake
/// grows by one. Hitting a wall or the body ends the round.

use std::collections::VecDeque;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::Rng;

use super::{record_high, GameEvent, MiniGame};
use crate::domain::input::{InputEvent, Key};
use crate::domain::timing::TickGate;

pub const GRID_W: i32 = 16;
pub const GRID_H: i32 = 16;
pub const APPLE_REWARD: u32 = 10;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Dir {
    Up,
    Down,
    Left,
    Right,
}

impl Dir {
    pub fn delta(self) -> (i32, i32) {
        match self {
            Dir::Up => (0, -1),
            Dir::Down => (0, 1),
            Dir::Left => (-1, 0),
            Dir::Right => (1, 0),
        }
    }

    pub fn opposite(self) -> Dir {
        match self {
            Dir::Up => Dir::Down,
            Dir::Down => Dir::Up,
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }

    fn from_key(key: Key) -> Option<Dir> {
        match key {
            Key::Up => Some(Dir::Up),
            Key::Down => Some(Dir::Down),
            Key::Left => Some(Dir::Left),
            Key::Right => Some(Dir::Right),
            _ => None,
        }
    }
}

pub const START_DIR: Dir = Dir::Right;
pub const START_CELL: (i32, i32) = (GRID_W / 2, GRID_H / 2);

#[derive(Clone, Debug)]
pub struct SnakeState {
    /// Head first. Cells are unique.
    pub body: VecDeque<(i32, i32)>,
    pub direction: Dir,
    /// Never inside `body`.
    pub apple: (i32, i32),
    pub score: u32,
    pub high_score: u32,
}

pub struct Snake {
    state: SnakeState,
    gate: TickGate,
    rng: StdRng,
}

impl Snake {
    pub fn with_rng(move_delay: Duration, rng: StdRng) -> Self {
        let mut snake = Snake {
            state: SnakeState {
                body: VecDeque::new(),
                direction: START_DIR,
                apple: (0, 0),
                score: 0,
                high_score: 0,
            },
            gate: TickGate::new(move_delay),
            rng,
        };
        snake.reset();
        snake
    }

    #[cfg(test)]
    pub fn state_mut(&mut self) -> &mut SnakeState {
        &mut self.state
    }

    /// Rejection-sample a free cell for the apple.
    /// Returns false when the body fills the grid.
    fn place_apple(&mut self) -> bool {
        if self.state.body.len() >= (GRID_W * GRID_H) as usize {
            return false;
        }
        loop {
            let cell = (self.rng.gen_range(0..GRID_W), self.rng.gen_range(0..GRID_H));
            if !self.state.body.contains(&cell) {
                self.state.apple = cell;
                return true;
            }
        }
    }

    fn end_round(&mut self, events: &mut Vec<GameEvent>) {
        let s = &mut self.state;
        events.push(GameEvent::Crashed { score: s.score });
        record_high(s.score, &mut s.high_score, events);
        self.reset();
    }
}

fn in_bounds((x, y): (i32, i32)) -> bool {
    x >= 0 && x < GRID_W && y >= 0 && y < GRID_H
}

impl MiniGame for Snake {
    type State = SnakeState;

    fn handle_event(&mut self, event: InputEvent) -> Vec<GameEvent> {
        if let Some(dir) = event.pressed().and_then(Dir::from_key) {
            if dir != self.state.direction.opposite() {
                self.state.direction = dir;
            }
        }
        vec![]
    }

    fn tick(&mut self, now: Duration) -> Vec<GameEvent> {
        if !self.gate.ready(now) {
            return vec![];
        }
        let mut events = Vec::new();

        let (hx, hy) = self.state.body[0];
        let (dx, dy) = self.state.direction.delta();
        let head = (hx + dx, hy + dy);

        if !in_bounds(head) || self.state.body.contains(&head) {
            self.end_round(&mut events);
            return events;
        }

        self.state.body.push_front(head);
        if head == self.state.apple {
            self.state.score += APPLE_REWARD;
            events.push(GameEvent::AppleEaten { score: self.state.score });
            if !self.place_apple() {
                self.end_round(&mut events);
            }
        } else {
            self.state.body.pop_back();
        }

        events
    }

    fn reset(&mut self) {
        self.state.body.clear();
        self.state.body.push_back(START_CELL);
        self.state.direction = START_DIR;
        self.state.score = 0;
        self.place_apple();
        self.gate.rearm();
    }

    fn state(&self) -> &SnakeState {
        &self.state
    }
}
