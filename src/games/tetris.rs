/// Tetris on a 10x16 board.
///
/// ## Pieces
///
/// Each shape is a list of rotation states; each state is four cell
/// offsets `(col, row)` from the piece anchor. Rotation steps to the next
/// state modulo the state count and is simply refused when the result
/// would collide (no wall kicks).
///
/// ## Collision
///
/// A cell collides when its column is outside `0..COLS`, its row is at or
/// below `ROWS`, or it lands on a filled board cell. Rows above the top
/// (negative) never collide, so pieces may poke out of the board while
/// spawning or rotating.
///
/// ## Locking
///
/// When the piece cannot move down it is merged into the board, full rows
/// are removed with empty rows inserted at the top, and a new piece
/// spawns. A spawn that collides immediately ends the game: the board and
/// score reset and a fresh piece spawns.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::Rng;

use super::{record_high, GameEvent, MiniGame};
use crate::domain::input::{InputEvent, Key};
use crate::domain::timing::TickGate;

pub const COLS: usize = 10;
pub const ROWS: usize = 16;
pub const LINE_REWARD: u32 = 100;
pub const SPAWN: (i32, i32) = (COLS as i32 / 2 - 2, 0);

type Rotation = [(i32, i32); 4];

pub const SHAPES: [&[Rotation]; 4] = [
    // O
    &[[(0, 0), (1, 0), (0, 1), (1, 1)]],
    // I
    &[
        [(0, 0), (1, 0), (2, 0), (3, 0)],
        [(1, -1), (1, 0), (1, 1), (1, 2)],
    ],
    // T
    &[
        [(0, 0), (1, 0), (2, 0), (1, 1)],
        [(1, 0), (1, 1), (1, 2), (2, 1)],
        [(0, 1), (1, 1), (2, 1), (1, 0)],
        [(0, 1), (1, 0), (1, 1), (1, 2)],
    ],
    // L
    &[
        [(0, 0), (0, 1), (0, 2), (1, 2)],
        [(0, 1), (1, 1), (2, 1), (0, 2)],
        [(0, 0), (1, 0), (1, 1), (1, 2)],
        [(0, 1), (1, 1), (2, 1), (2, 0)],
    ],
];

pub type Board = Vec<[bool; COLS]>;

fn empty_board() -> Board {
    vec![[false; COLS]; ROWS]
}

#[derive(Clone, Debug)]
pub struct TetrisState {
    /// `board[row][col]`, row 0 at the top.
    pub board: Board,
    /// Index into `SHAPES`.
    pub shape: usize,
    pub rotation: usize,
    /// `(col, row)` of the piece origin.
    pub anchor: (i32, i32),
    pub score: u32,
    pub high_score: u32,
}

impl TetrisState {
    /// Board cells covered by the active piece at `anchor`/`rotation`.
    pub fn piece_cells(&self, anchor: (i32, i32), rotation: usize) -> impl Iterator<Item = (i32, i32)> {
        let (ax, ay) = anchor;
        let offsets: Rotation = SHAPES[self.shape][rotation];
        offsets.into_iter().map(move |(x, y)| (ax + x, ay + y))
    }

    /// Would the active piece collide at `anchor`/`rotation`?
    pub fn collides(&self, anchor: (i32, i32), rotation: usize) -> bool {
        self.piece_cells(anchor, rotation).any(|(x, y)| {
            if x < 0 || x >= COLS as i32 || y >= ROWS as i32 {
                return true;
            }
            y >= 0 && self.board[y as usize][x as usize]
        })
    }

    fn lock_piece(&mut self) {
        for (x, y) in self.piece_cells(self.anchor, self.rotation) {
            if y >= 0 {
                self.board[y as usize][x as usize] = true;
            }
        }
    }

    /// Drop full rows, refill from the top. Returns the number cleared.
    fn clear_lines(&mut self) -> u32 {
        self.board.retain(|row| !row.iter().all(|&c| c));
        let cleared = ROWS - self.board.len();
        for _ in 0..cleared {
            self.board.insert(0, [false; COLS]);
        }
        self.score += cleared as u32 * LINE_REWARD;
        cleared as u32
    }
}

pub struct Tetris {
    state: TetrisState,
    gate: TickGate,
    rng: StdRng,
}

impl Tetris {
    pub fn with_rng(drop_delay: Duration, rng: StdRng) -> Self {
        let mut tetris = Tetris {
            state: TetrisState {
                board: empty_board(),
                shape: 0,
                rotation: 0,
                anchor: SPAWN,
                score: 0,
                high_score: 0,
            },
            gate: TickGate::new(drop_delay),
            rng,
        };
        tetris.reset();
        tetris
    }

    fn spawn(&mut self, events: &mut Vec<GameEvent>) {
        self.place_new_piece();
        if self.state.collides(self.state.anchor, self.state.rotation) {
            let s = &mut self.state;
            events.push(GameEvent::BoardReset { score: s.score });
            record_high(s.score, &mut s.high_score, events);
            s.board = empty_board();
            s.score = 0;
            self.place_new_piece();
        }
    }

    fn place_new_piece(&mut self) {
        self.state.shape = self.rng.gen_range(0..SHAPES.len());
        self.state.rotation = 0;
        self.state.anchor = SPAWN;
    }

    fn try_move(&mut self, dx: i32, dy: i32) -> bool {
        let (x, y) = self.state.anchor;
        let next = (x + dx, y + dy);
        if self.state.collides(next, self.state.rotation) {
            return false;
        }
        self.state.anchor = next;
        true
    }

    fn try_rotate(&mut self) {
        let next = (self.state.rotation + 1) % SHAPES[self.state.shape].len();
        if !self.state.collides(self.state.anchor, next) {
            self.state.rotation = next;
        }
    }

    /// One row down; lock, clear and respawn when blocked.
    fn step_down(&mut self) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if self.try_move(0, 1) {
            return events;
        }
        self.state.lock_piece();
        events.push(GameEvent::PieceLocked);
        let lines = self.state.clear_lines();
        if lines > 0 {
            events.push(GameEvent::LinesCleared { lines });
        }
        self.spawn(&mut events);
        events
    }
}

impl MiniGame for Tetris {
    type State = TetrisState;

    fn handle_event(&mut self, event: InputEvent) -> Vec<GameEvent> {
        match event.pressed() {
            Some(Key::Left) => {
                self.try_move(-1, 0);
            }
            Some(Key::Right) => {
                self.try_move(1, 0);
            }
            Some(Key::Up) => self.try_rotate(),
            Some(Key::Down) => return self.step_down(),
            _ => {}
        }
        vec![]
    }

    fn tick(&mut self, now: Duration) -> Vec<GameEvent> {
        if !self.gate.ready(now) {
            return vec![];
        }
        self.step_down()
    }

    fn reset(&mut self) {
        self.state.board = empty_board();
        self.state.score = 0;
        self.place_new_piece();
        self.gate.rearm();
    }

    fn state(&self) -> &TetrisState {
        &self.state
    }
}
