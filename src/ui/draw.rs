/// Per-screen draw routines. Each one reads state and paints the canvas;
/// none of them mutate anything.

use super::canvas::{Canvas, Color, CHAR_W, HEIGHT, LINE_H, WIDTH};
use crate::domain::composer::TextComposer;
use crate::domain::selection::SelectionIndex;
use crate::games::pong::{PongState, BALL_SIZE, PADDLE_H, PADDLE_W, PLAYER_X, AI_X};
use crate::games::snake::{SnakeState, GRID_W};
use crate::games::tetris::{TetrisState, COLS, ROWS};
use crate::games::MiniGame;
use crate::sim::battle::{Battle, Outcome, ACTIONS, BATTLE_OPTIONS, ENEMY_HP, PLAYER_MAX_HP};
use crate::sim::chat::CHAT_VISIBLE;
use crate::sim::inventory::{Inventory, InventoryMode, ITEM_ACTIONS};
use crate::sim::machine::ScreenMachine;
use crate::sim::screen::{Screen, MENU};
use crate::sim::settings::{SettingOption, Settings};

/// Top of the content area, below the title bar.
const BODY_Y: i32 = 12;
/// Characters that fit across the display.
const LINE_CHARS: usize = (WIDTH / CHAR_W) as usize;

const PIECE_COLORS: [Color; 4] = [Color::Yellow, Color::Cyan, Color::Purple, Color::Orange];

/// Information from outside the state machine that some screens show.
#[derive(Clone, Debug, Default)]
pub struct Hud {
    pub remote_url: String,
}

pub fn draw(m: &ScreenMachine, hud: &Hud, c: &mut impl Canvas) {
    c.clear(Color::Black);
    match m.screen() {
        Screen::MainMenu => draw_menu(m.menu(), c),
        Screen::DogPark => draw_dog_park(c),
        Screen::Inventory => draw_inventory(m.inventory(), c),
        Screen::Chat => draw_chat(m, c),
        Screen::Type => draw_typer(m.typer(), c),
        Screen::Settings => draw_settings(m.settings(), c),
        Screen::SoundSettings => draw_sound(m.settings(), c),
        Screen::Battle => draw_battle_menu(m.battle(), c),
        Screen::BattlePractice => draw_practice(m.battle(), c),
        Screen::BattleGameLink => draw_gamelink(c),
        Screen::Snake => draw_snake(m.snake().state(), c),
        Screen::Pong => draw_pong(m.pong().state(), c),
        Screen::Tetris => draw_tetris(m.tetris().state(), c),
        Screen::Remote => draw_remote(hud, c),
    }
}

// ── Shared pieces ──

fn title(c: &mut impl Canvas, text: &str) {
    c.fill_rect(0, 0, WIDTH, LINE_H, Color::Blue);
    let x = (WIDTH - c.text_width(text)) / 2;
    c.draw_text(x.max(0), 0, text, Color::White);
}

fn hint(c: &mut impl Canvas, text: &str) {
    c.draw_text(0, HEIGHT - LINE_H, text, Color::Gray);
}

fn clip(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Rows of `labels` inside the cursor's window, selected row highlighted.
fn list<S: AsRef<str>>(c: &mut impl Canvas, y: i32, labels: &[S], cursor: &SelectionIndex) {
    for (row, i) in cursor.window().enumerate() {
        let Some(label) = labels.get(i) else { break };
        let ry = y + row as i32 * LINE_H;
        let selected = i == cursor.current();
        if selected {
            c.fill_rect(0, ry, WIDTH, LINE_H, Color::Gray);
        }
        let marker = if selected { ">" } else { " " };
        let text = format!("{marker}{}", clip(label.as_ref(), LINE_CHARS - 1));
        c.draw_text(0, ry, &text, Color::White);
    }
    if cursor.scroll() > 0 {
        c.draw_text(WIDTH - CHAR_W, y, "^", Color::Yellow);
    }
    if cursor.scroll() + cursor.visible() < cursor.count() {
        let last = y + (cursor.visible() as i32 - 1) * LINE_H;
        c.draw_text(WIDTH - CHAR_W, last, "v", Color::Yellow);
    }
}

fn keyboard(c: &mut impl Canvas, y: i32, composer: &TextComposer) {
    let tail: String = {
        let text = composer.text();
        let skip = text.chars().count().saturating_sub(LINE_CHARS - 2);
        text.chars().skip(skip).collect()
    };
    c.draw_text(0, y, &format!(">{tail}_"), Color::White);

    let ky = y + LINE_H + 2;
    c.fill_rect(0, ky, WIDTH, LINE_H, Color::Gray);
    for (slot, (i, ch)) in composer.visible_keys().enumerate() {
        let x = slot as i32 * 2 * CHAR_W;
        let selected = i == composer.cursor_index();
        if selected {
            c.fill_rect(x, ky, 2 * CHAR_W, LINE_H, Color::Yellow);
        }
        let shown = if ch == ' ' { '_' } else { ch };
        c.draw_text(x, ky, &shown.to_string(), if selected { Color::Black } else { Color::White });
    }
    if composer.shift() {
        c.draw_text(0, ky + LINE_H, "SHIFT", Color::Orange);
    }
}

// ── Screens ──

fn draw_menu(menu: &SelectionIndex, c: &mut impl Canvas) {
    title(c, "Pocket Pet");
    let labels: Vec<&str> = MENU.iter().map(|s| s.label()).collect();
    list(c, BODY_Y, &labels, menu);
    hint(c, "Up/Dn move  Enter go");
}

fn draw_dog_park(c: &mut impl Canvas) {
    c.fill_rect(0, 0, WIDTH, 80, Color::Cyan);
    c.fill_rect(0, 80, WIDTH, 48, Color::Green);
    c.fill_rect(100, 8, 16, 16, Color::Yellow);
    // Dog: body, head, legs, tail.
    c.fill_rect(40, 72, 32, 16, Color::Orange);
    c.fill_rect(68, 60, 16, 16, Color::Orange);
    c.fill_rect(78, 64, 4, 4, Color::Black);
    c.fill_rect(42, 88, 4, 8, Color::Orange);
    c.fill_rect(64, 88, 4, 8, Color::Orange);
    c.fill_rect(32, 68, 8, 4, Color::Orange);
    c.draw_text(4, 4, "Dog Park", Color::Black);
    hint(c, "Enter/Esc back");
}

fn draw_inventory(inv: &Inventory, c: &mut impl Canvas) {
    title(c, "Inventory");
    if inv.items().is_empty() {
        c.draw_text(0, BODY_Y, "(empty)", Color::Gray);
        hint(c, "Esc back");
        return;
    }
    let labels: Vec<String> = inv
        .items()
        .iter()
        .map(|it| {
            if inv.equipped() == Some(it.as_str()) { format!("{it}*") } else { it.clone() }
        })
        .collect();
    list(c, BODY_Y, &labels, inv.cursor());

    let box_y = HEIGHT - 5 * LINE_H;
    match inv.mode() {
        InventoryMode::Browse => hint(c, "Enter actions"),
        InventoryMode::Actions => {
            c.fill_rect(0, box_y, WIDTH, 3 * LINE_H, Color::Blue);
            list(c, box_y, &ITEM_ACTIONS, inv.actions());
        }
        InventoryMode::Inspect => {
            let item = inv.highlighted().unwrap_or_default();
            c.fill_rect(0, box_y, WIDTH, 3 * LINE_H, Color::Purple);
            c.draw_text(0, box_y, &clip(item, LINE_CHARS), Color::White);
            c.draw_text(0, box_y + LINE_H, "Your pet loves it.", Color::White);
            hint(c, "Enter/Esc back");
        }
    }
}

fn draw_chat(m: &ScreenMachine, c: &mut impl Canvas) {
    title(c, "Chat");
    for (row, line) in m.chat().tail(CHAT_VISIBLE).iter().enumerate() {
        let color = if line.author == "error" { Color::Red } else { Color::White };
        let text = clip(&format!("{}: {}", line.author, line.text), LINE_CHARS);
        c.draw_text(0, BODY_Y + row as i32 * LINE_H, &text, color);
    }
    keyboard(c, BODY_Y + CHAT_VISIBLE as i32 * LINE_H + 4, &m.chat().composer);
    hint(c, "Up type Dn del Tab");
}

fn draw_typer(t: &TextComposer, c: &mut impl Canvas) {
    title(c, "Type");
    let chars: Vec<char> = t.text().chars().collect();
    for (row, chunk) in chars.chunks(LINE_CHARS).enumerate() {
        let line: String = chunk.iter().collect();
        c.draw_text(0, BODY_Y + row as i32 * LINE_H, &line, Color::White);
    }
    keyboard(c, HEIGHT - 5 * LINE_H, t);
    hint(c, "Enter shift Esc back");
}

fn draw_settings(s: &Settings, c: &mut impl Canvas) {
    title(c, "Settings");
    let labels: Vec<String> = s.options().iter().map(SettingOption::display).collect();
    list(c, BODY_Y, &labels, s.cursor());
    hint(c, "L/R change Esc back");
}

fn draw_sound(s: &Settings, c: &mut impl Canvas) {
    title(c, "Sound");
    let sound = s.sound();
    list(c, BODY_Y, &sound.rows(), &sound.cursor);
    let bar_y = BODY_Y + 4 * LINE_H;
    c.fill_rect(4, bar_y, WIDTH - 8, 6, Color::Gray);
    c.fill_rect(4, bar_y, (WIDTH - 8) * sound.volume as i32 / 100, 6, Color::Green);
    hint(c, "L/R adjust Esc back");
}

fn draw_battle_menu(b: &Battle, c: &mut impl Canvas) {
    title(c, "Battle");
    list(c, BODY_Y, &BATTLE_OPTIONS, b.menu());
    hint(c, "Enter fight Esc back");
}

fn hp_bar(c: &mut impl Canvas, y: i32, label: &str, hp: i32, max: i32, color: Color) {
    c.draw_text(0, y, &format!("{label} {hp}"), Color::White);
    let w = WIDTH - 8;
    c.fill_rect(4, y + LINE_H, w, 4, Color::Gray);
    c.fill_rect(4, y + LINE_H, w * hp.clamp(0, max) / max.max(1), 4, color);
}

fn draw_practice(b: &Battle, c: &mut impl Canvas) {
    title(c, "Practice");
    let p = b.practice();
    hp_bar(c, BODY_Y, "You", p.player_hp, PLAYER_MAX_HP, Color::Green);
    hp_bar(c, BODY_Y + 2 * LINE_H + 4, "Enemy", p.enemy_hp, ENEMY_HP.1, Color::Red);

    let msg_y = BODY_Y + 5 * LINE_H;
    let chars: Vec<char> = p.message.chars().collect();
    for (row, chunk) in chars.chunks(LINE_CHARS).take(2).enumerate() {
        let line: String = chunk.iter().collect();
        c.draw_text(0, msg_y + row as i32 * LINE_H, &line, Color::Yellow);
    }

    match p.outcome {
        None => {
            list(c, HEIGHT - 3 * LINE_H, &ACTIONS, &p.actions);
        }
        Some(outcome) => {
            let (text, color) = match outcome {
                Outcome::Won => ("VICTORY", Color::Green),
                Outcome::Lost => ("DEFEAT", Color::Red),
            };
            c.draw_text(0, HEIGHT - 3 * LINE_H, text, color);
            hint(c, "Enter continue");
        }
    }
}

fn draw_gamelink(c: &mut impl Canvas) {
    title(c, "GameLink");
    c.draw_text(0, BODY_Y, "Looking for a", Color::White);
    c.draw_text(0, BODY_Y + LINE_H, "friend nearby...", Color::White);
    c.draw_text(0, BODY_Y + 3 * LINE_H, "Not available yet", Color::Gray);
    hint(c, "Enter/Esc back");
}

fn draw_snake(s: &SnakeState, c: &mut impl Canvas) {
    let cell = WIDTH / GRID_W;
    let (ax, ay) = s.apple;
    c.fill_rect(ax * cell, ay * cell, cell, cell, Color::Red);
    for (i, &(x, y)) in s.body.iter().enumerate() {
        let color = if i == 0 { Color::Yellow } else { Color::Green };
        c.fill_rect(x * cell, y * cell, cell, cell, color);
    }
    c.draw_text(0, 0, &format!("{} HI {}", s.score, s.high_score), Color::White);
}

fn draw_pong(s: &PongState, c: &mut impl Canvas) {
    for y in (0..HEIGHT).step_by(16) {
        c.fill_rect(WIDTH / 2 - 1, y, 2, 8, Color::Gray);
    }
    c.fill_rect(PLAYER_X, s.player_y, PADDLE_W, PADDLE_H, Color::White);
    c.fill_rect(AI_X, s.ai_y, PADDLE_W, PADDLE_H, Color::White);
    c.fill_rect(s.ball.0 as i32, s.ball.1 as i32, BALL_SIZE, BALL_SIZE, Color::Yellow);
    c.draw_text(16, 0, &format!("{}", s.score), Color::White);
    c.draw_text(WIDTH / 2 + 8, 0, &format!("HI {}", s.high_score), Color::Gray);
}

fn draw_tetris(s: &TetrisState, c: &mut impl Canvas) {
    let cell = HEIGHT / ROWS as i32;
    let board_w = cell * COLS as i32;
    c.fill_rect(board_w, 0, 2, HEIGHT, Color::Gray);
    for (y, row) in s.board.iter().enumerate() {
        for (x, &filled) in row.iter().enumerate() {
            if filled {
                c.fill_rect(x as i32 * cell, y as i32 * cell, cell, cell, Color::Blue);
            }
        }
    }
    let color = PIECE_COLORS[s.shape % PIECE_COLORS.len()];
    for (x, y) in s.piece_cells(s.anchor, s.rotation) {
        if y >= 0 {
            c.fill_rect(x * cell, y * cell, cell, cell, color);
        }
    }
    let side = board_w + 6;
    c.draw_text(side, 8, "SCORE", Color::Gray);
    c.draw_text(side, 8 + LINE_H, &s.score.to_string(), Color::White);
    c.draw_text(side, 8 + 3 * LINE_H, "HIGH", Color::Gray);
    c.draw_text(side, 8 + 4 * LINE_H, &s.high_score.to_string(), Color::White);
}

fn draw_remote(hud: &Hud, c: &mut impl Canvas) {
    title(c, "Remote");
    c.draw_text(0, BODY_Y, "Control panel at", Color::White);
    c.draw_text(0, BODY_Y + LINE_H, &clip(&hud.remote_url, LINE_CHARS), Color::Cyan);
    hint(c, "Enter/Esc back");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::domain::input::{InputEvent, Key};

    /// Canvas that records what was drawn.
    #[derive(Default)]
    struct Recorder {
        rects: Vec<(i32, i32, i32, i32, Color)>,
        texts: Vec<(i32, i32, String)>,
    }

    impl Canvas for Recorder {
        fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: Color) {
            self.rects.push((x, y, w, h, color));
        }

        fn draw_text(&mut self, x: i32, y: i32, text: &str, _color: Color) {
            self.texts.push((x, y, text.to_string()));
        }
    }

    impl Recorder {
        fn has_text(&self, needle: &str) -> bool {
            self.texts.iter().any(|(_, _, t)| t.contains(needle))
        }
    }

    fn render(m: &ScreenMachine) -> Recorder {
        let mut r = Recorder::default();
        draw(m, &Hud { remote_url: "http://pet:8000/".into() }, &mut r);
        r
    }

    fn open(m: &mut ScreenMachine, target: Screen) {
        while MENU[m.menu().current()] != target {
            m.handle_event(InputEvent::Press(Key::Down));
        }
        m.handle_event(InputEvent::Press(Key::Select));
    }

    #[test]
    fn menu_shows_window_only() {
        let m = ScreenMachine::seeded(&AppConfig::default(), 1);
        let r = render(&m);
        assert!(r.has_text(">Dog Park"));
        assert!(r.has_text("Battle"));
        assert!(!r.has_text("Remote"));
    }

    #[test]
    fn snake_draws_every_body_cell_and_apple() {
        let mut m = ScreenMachine::seeded(&AppConfig::default(), 1);
        open(&mut m, Screen::Snake);
        let r = render(&m);
        let s = m.snake().state();
        let cell = WIDTH / GRID_W;
        let (ax, ay) = s.apple;
        assert!(r.rects.contains(&(ax * cell, ay * cell, cell, cell, Color::Red)));
        let (hx, hy) = s.body[0];
        assert!(r.rects.contains(&(hx * cell, hy * cell, cell, cell, Color::Yellow)));
    }

    #[test]
    fn every_screen_stays_on_the_display() {
        let mut m = ScreenMachine::seeded(&AppConfig::default(), 1);
        for target in MENU {
            open(&mut m, target);
            let r = render(&m);
            for &(x, y, w, h, _) in &r.rects {
                assert!(x >= 0 && y >= 0 && x + w <= WIDTH && y + h <= HEIGHT, "{target:?} rect {x},{y},{w},{h}");
            }
            for (x, y, _) in &r.texts {
                assert!(*x >= 0 && *y >= 0 && *y < HEIGHT, "{target:?} text at {x},{y}");
            }
            m.handle_event(InputEvent::Press(Key::Cancel));
            if m.screen() != Screen::MainMenu {
                m.handle_event(InputEvent::Press(Key::Cancel));
            }
        }
    }

    #[test]
    fn remote_shows_url() {
        let mut m = ScreenMachine::seeded(&AppConfig::default(), 1);
        open(&mut m, Screen::Remote);
        assert!(render(&m).has_text("http://pet:8000/"));
    }

    #[test]
    fn practice_shows_message_and_actions() {
        let mut m = ScreenMachine::seeded(&AppConfig::default(), 1);
        open(&mut m, Screen::Battle);
        m.handle_event(InputEvent::Press(Key::Select));
        m.handle_event(InputEvent::Press(Key::Select));
        let r = render(&m);
        assert!(r.has_text("You hit!") || r.has_text("You won!"));
        assert!(r.has_text("Attack"));
    }
}
