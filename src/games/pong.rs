/// Pong on the 128x128 canvas.
///
/// Left paddle follows the held direction key; right paddle is a fixed
/// reactive AI that steps toward the ball every tick. The ball bounces off
/// the top and bottom edges and off either paddle, and leaving the board
/// on either side starts a new rally.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::Rng;

use super::{record_high, GameEvent, MiniGame};
use crate::domain::input::{InputEvent, Key};
use crate::domain::timing::TickGate;

pub const WIDTH: i32 = 128;
pub const HEIGHT: i32 = 128;
pub const PADDLE_W: i32 = 4;
pub const PADDLE_H: i32 = 20;
pub const BALL_SIZE: i32 = 4;
pub const PLAYER_X: i32 = 4;
pub const AI_X: i32 = WIDTH - PADDLE_W - 4;
pub const BALL_SPEED: f32 = 2.0;
pub const PADDLE_SPEED: i32 = 3;
pub const AI_STEP: i32 = 2;

const PADDLE_START: i32 = HEIGHT / 2 - PADDLE_H / 2;
const BALL_START: (f32, f32) = ((WIDTH / 2) as f32, (HEIGHT / 2) as f32);

#[derive(Clone, Debug)]
pub struct PongState {
    /// Top edge of each paddle, always in `[0, HEIGHT - PADDLE_H]`.
    pub player_y: i32,
    pub ai_y: i32,
    /// Top-left corner of the ball.
    pub ball: (f32, f32),
    pub velocity: (f32, f32),
    /// Per-tick paddle motion while a direction key is held.
    pub player_vel: i32,
    pub score: u32,
    pub high_score: u32,
}

pub struct Pong {
    state: PongState,
    gate: TickGate,
    rng: StdRng,
}

fn clamp_paddle(y: i32) -> i32 {
    y.clamp(0, HEIGHT - PADDLE_H)
}

/// Does the ball's square overlap the paddle at (`x`, `y`)?
fn hits_paddle(ball: (f32, f32), x: i32, y: i32) -> bool {
    let (bx, by) = ball;
    let size = BALL_SIZE as f32;
    bx < (x + PADDLE_W) as f32
        && bx + size > x as f32
        && by < (y + PADDLE_H) as f32
        && by + size > y as f32
}

impl Pong {
    pub fn with_rng(tick: Duration, rng: StdRng) -> Self {
        let mut pong = Pong {
            state: PongState {
                player_y: PADDLE_START,
                ai_y: PADDLE_START,
                ball: BALL_START,
                velocity: (BALL_SPEED, BALL_SPEED),
                player_vel: 0,
                score: 0,
                high_score: 0,
            },
            gate: TickGate::new(tick),
            rng,
        };
        pong.reset();
        pong
    }

    /// Center paddles and ball; serve along a random diagonal.
    fn new_rally(&mut self, events: &mut Vec<GameEvent>) {
        let s = &mut self.state;
        record_high(s.score, &mut s.high_score, events);
        s.player_y = PADDLE_START;
        s.ai_y = PADDLE_START;
        s.ball = BALL_START;
        let vx = if self.rng.gen_bool(0.5) { BALL_SPEED } else { -BALL_SPEED };
        let vy = if self.rng.gen_bool(0.5) { BALL_SPEED } else { -BALL_SPEED };
        s.velocity = (vx, vy);
    }
}

impl MiniGame for Pong {
    type State = PongState;

    fn handle_event(&mut self, event: InputEvent) -> Vec<GameEvent> {
        let s = &mut self.state;
        match event {
            InputEvent::Press(Key::Up) => s.player_vel = -PADDLE_SPEED,
            InputEvent::Press(Key::Down) => s.player_vel = PADDLE_SPEED,
            InputEvent::Release(Key::Up) if s.player_vel < 0 => s.player_vel = 0,
            InputEvent::Release(Key::Down) if s.player_vel > 0 => s.player_vel = 0,
            _ => {}
        }
        vec![]
    }

    fn tick(&mut self, now: Duration) -> Vec<GameEvent> {
        if !self.gate.ready(now) {
            return vec![];
        }
        let mut events = Vec::new();
        let s = &mut self.state;

        s.player_y = clamp_paddle(s.player_y + s.player_vel);

        s.ball.0 += s.velocity.0;
        s.ball.1 += s.velocity.1;

        let floor = (HEIGHT - BALL_SIZE) as f32;
        if s.ball.1 <= 0.0 {
            s.ball.1 = 0.0;
            s.velocity.1 = s.velocity.1.abs();
        } else if s.ball.1 >= floor {
            s.ball.1 = floor;
            s.velocity.1 = -s.velocity.1.abs();
        }

        // One paddle at most per tick, and only when the ball is heading at it.
        if s.velocity.0 < 0.0 && hits_paddle(s.ball, PLAYER_X, s.player_y) {
            s.velocity.0 = -s.velocity.0;
            events.push(GameEvent::PaddleHit);
        } else if s.velocity.0 > 0.0 && hits_paddle(s.ball, AI_X, s.ai_y) {
            s.velocity.0 = -s.velocity.0;
            events.push(GameEvent::PaddleHit);
        }

        if s.ball.0 + (BALL_SIZE as f32) < 0.0 {
            events.push(GameEvent::PointLost);
            self.new_rally(&mut events);
            self.state.score = 0;
            return events;
        }
        if s.ball.0 > WIDTH as f32 {
            s.score += 1;
            events.push(GameEvent::PointWon { score: s.score });
            self.new_rally(&mut events);
            return events;
        }

        let ball_y = s.ball.1 as i32;
        if ball_y > s.ai_y + PADDLE_H / 2 {
            s.ai_y += AI_STEP;
        } else {
            s.ai_y -= AI_STEP;
        }
        s.ai_y = clamp_paddle(s.ai_y);

        events
    }

    fn reset(&mut self) {
        self.state.score = 0;
        self.state.player_vel = 0;
        self.new_rally(&mut Vec::new());
        self.gate.rearm();
    }

    fn state(&self) -> &PongState {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    const TICK: Duration = Duration::from_millis(33);

    fn seeded() -> Pong {
        Pong::with_rng(TICK, StdRng::seed_from_u64(3))
    }

    fn at(step: u32) -> Duration {
        TICK * step
    }

    #[test]
    fn reset_serves_diagonally_from_center() {
        let g = seeded();
        let s = g.state();
        assert_eq!(s.ball, BALL_START);
        assert_eq!(s.player_y, PADDLE_START);
        assert_eq!(s.ai_y, PADDLE_START);
        assert_eq!(s.velocity.0.abs(), BALL_SPEED);
        assert_eq!(s.velocity.1.abs(), BALL_SPEED);
    }

    #[test]
    fn held_key_moves_until_release() {
        let mut g = seeded();
        g.handle_event(InputEvent::Press(Key::Up));
        g.tick(at(0));
        g.tick(at(1));
        assert_eq!(g.state().player_y, PADDLE_START - 2 * PADDLE_SPEED);
        g.handle_event(InputEvent::Release(Key::Up));
        g.tick(at(2));
        assert_eq!(g.state().player_y, PADDLE_START - 2 * PADDLE_SPEED);
    }

    #[test]
    fn release_of_other_key_keeps_moving() {
        let mut g = seeded();
        g.handle_event(InputEvent::Press(Key::Down));
        g.handle_event(InputEvent::Release(Key::Up));
        assert_eq!(g.state().player_vel, PADDLE_SPEED);
    }

    #[test]
    fn paddle_clamped_to_board() {
        let mut g = seeded();
        g.state.velocity = (0.0, 0.0);
        g.handle_event(InputEvent::Press(Key::Down));
        for i in 0..100 {
            g.tick(at(i));
            assert!(g.state().player_y >= 0 && g.state().player_y <= HEIGHT - PADDLE_H);
            assert!(g.state().ai_y >= 0 && g.state().ai_y <= HEIGHT - PADDLE_H);
        }
        assert_eq!(g.state().player_y, HEIGHT - PADDLE_H);
    }

    #[test]
    fn bounces_off_player_paddle_once() {
        let mut g = seeded();
        g.state.player_y = 50;
        g.state.ball = (PLAYER_X as f32 + PADDLE_W as f32 + 1.0, 55.0);
        g.state.velocity = (-BALL_SPEED, BALL_SPEED);
        let events = g.tick(at(0));
        assert_eq!(events, vec![GameEvent::PaddleHit]);
        assert_eq!(g.state().velocity.0, BALL_SPEED);
        // Still overlapping next tick but heading away: no second flip.
        let events = g.tick(at(1));
        assert!(events.is_empty());
        assert_eq!(g.state().velocity.0, BALL_SPEED);
    }

    #[test]
    fn bounces_off_ai_paddle() {
        let mut g = seeded();
        g.state.ai_y = 50;
        g.state.ball = (AI_X as f32 - BALL_SIZE as f32 - 1.0, 58.0);
        g.state.velocity = (BALL_SPEED, -BALL_SPEED);
        g.tick(at(0));
        assert_eq!(g.state().velocity.0, -BALL_SPEED);
    }

    #[test]
    fn no_flip_in_open_court() {
        let mut g = seeded();
        g.state.ball = (60.0, 60.0);
        g.state.velocity = (BALL_SPEED, BALL_SPEED);
        g.tick(at(0));
        assert_eq!(g.state().velocity.0, BALL_SPEED);
    }

    #[test]
    fn reflects_off_top_edge() {
        let mut g = seeded();
        g.state.ball = (60.0, 1.0);
        g.state.velocity = (BALL_SPEED, -BALL_SPEED);
        g.tick(at(0));
        assert_eq!(g.state().ball.1, 0.0);
        assert_eq!(g.state().velocity.1, BALL_SPEED);
    }

    #[test]
    fn right_exit_scores_and_serves() {
        let mut g = seeded();
        g.state.ai_y = 0;
        g.state.ball = (WIDTH as f32 - 1.0, 100.0);
        g.state.velocity = (BALL_SPEED, BALL_SPEED);
        let events = g.tick(at(0));
        assert!(events.contains(&GameEvent::PointWon { score: 1 }));
        assert!(events.contains(&GameEvent::NewHighScore { score: 1 }));
        assert_eq!(g.state().score, 1);
        assert_eq!(g.state().high_score, 1);
        assert_eq!(g.state().ball, BALL_START);
    }

    #[test]
    fn left_exit_scores_nothing_and_keeps_best() {
        let mut g = seeded();
        g.state.score = 3;
        g.state.high_score = 1;
        g.state.player_y = HEIGHT - PADDLE_H;
        g.state.ball = (-BALL_SIZE as f32 + 1.0, 20.0);
        g.state.velocity = (-BALL_SPEED, BALL_SPEED);
        let events = g.tick(at(0));
        assert_eq!(events[0], GameEvent::PointLost);
        assert_eq!(g.state().high_score, 3);
        assert_eq!(g.state().score, 0);
        assert_eq!(g.state().ball, BALL_START);
    }

    #[test]
    fn ai_steps_toward_ball() {
        let mut g = seeded();
        g.state.ai_y = 10;
        g.state.ball = (60.0, 100.0);
        g.state.velocity = (-BALL_SPEED, 0.0);
        g.tick(at(0));
        assert_eq!(g.state().ai_y, 10 + AI_STEP);
    }
}
