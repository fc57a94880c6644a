/// Battle sub-flow: a two-entry menu, a turn-based practice fight against a
/// random enemy, and a GameLink placeholder.

use rand::rngs::StdRng;
use rand::Rng;

use super::event::{Effect, Sfx};
use super::screen::Screen;
use crate::domain::input::Key;
use crate::domain::selection::SelectionIndex;

pub const BATTLE_OPTIONS: [&str; 2] = ["Practice", "GameLink"];
pub const ACTIONS: [&str; 2] = ["Attack", "Run"];

pub const PLAYER_MAX_HP: i32 = 50;
pub const ENEMY_HP: (i32, i32) = (30, 60);
pub const DAMAGE: (i32, i32) = (5, 12);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Outcome {
    Won,
    Lost,
}

#[derive(Clone, Debug)]
pub struct Practice {
    /// Never negative.
    pub player_hp: i32,
    pub enemy_hp: i32,
    pub actions: SelectionIndex,
    pub outcome: Option<Outcome>,
    pub message: String,
}

pub struct Battle {
    menu: SelectionIndex,
    practice: Practice,
    rng: StdRng,
}

impl Battle {
    pub fn with_rng(rng: StdRng) -> Self {
        Battle {
            menu: SelectionIndex::new(BATTLE_OPTIONS.len(), BATTLE_OPTIONS.len()),
            practice: Practice {
                player_hp: PLAYER_MAX_HP,
                enemy_hp: ENEMY_HP.1,
                actions: SelectionIndex::new(ACTIONS.len(), ACTIONS.len()),
                outcome: None,
                message: String::new(),
            },
            rng,
        }
    }

    pub fn menu(&self) -> &SelectionIndex {
        &self.menu
    }

    pub fn practice(&self) -> &Practice {
        &self.practice
    }

    /// Entering from the main menu starts at the top.
    pub fn enter(&mut self) {
        self.menu.reset();
    }

    pub fn start_practice(&mut self) {
        let p = &mut self.practice;
        p.player_hp = PLAYER_MAX_HP;
        p.enemy_hp = self.rng.gen_range(ENEMY_HP.0..=ENEMY_HP.1);
        p.actions.reset();
        p.outcome = None;
        p.message = "A wild enemy appears!".to_string();
    }

    pub fn handle_menu(&mut self, key: Key, fx: &mut Vec<Effect>) -> Option<Screen> {
        match key {
            Key::Up | Key::Down => {
                self.menu.move_by(if key == Key::Up { -1 } else { 1 });
                fx.push(Effect::Sound(Sfx::Move));
                None
            }
            Key::Select => {
                fx.push(Effect::Sound(Sfx::Select));
                match self.menu.select(&BATTLE_OPTIONS) {
                    Some(&"Practice") => Some(Screen::BattlePractice),
                    _ => Some(Screen::BattleGameLink),
                }
            }
            Key::Cancel => Some(Screen::MainMenu),
            _ => None,
        }
    }

    pub fn handle_practice(&mut self, key: Key, fx: &mut Vec<Effect>) -> Option<Screen> {
        if self.practice.outcome.is_some() {
            return matches!(key, Key::Select | Key::Cancel).then_some(Screen::Battle);
        }
        match key {
            Key::Up | Key::Down => {
                self.practice.actions.move_by(if key == Key::Up { -1 } else { 1 });
                fx.push(Effect::Sound(Sfx::Move));
                None
            }
            Key::Select => match self.practice.actions.select(&ACTIONS) {
                Some(&"Attack") => {
                    let sfx = match self.exchange() {
                        Some(Outcome::Won) => Sfx::Win,
                        Some(Outcome::Lost) => Sfx::Lose,
                        None => Sfx::Hit,
                    };
                    fx.push(Effect::Sound(sfx));
                    None
                }
                _ => Some(Screen::Battle),
            },
            Key::Cancel => Some(Screen::Battle),
            _ => None,
        }
    }

    pub fn handle_gamelink(&mut self, key: Key) -> Option<Screen> {
        matches!(key, Key::Select | Key::Cancel).then_some(Screen::Battle)
    }

    /// One round: the player strikes first, the enemy answers if it is
    /// still standing.
    fn exchange(&mut self) -> Option<Outcome> {
        let p = &mut self.practice;
        let dealt = self.rng.gen_range(DAMAGE.0..=DAMAGE.1);
        p.enemy_hp = (p.enemy_hp - dealt).max(0);
        if p.enemy_hp == 0 {
            p.message = "You won!".to_string();
            p.outcome = Some(Outcome::Won);
            return p.outcome;
        }
        let taken = self.rng.gen_range(DAMAGE.0..=DAMAGE.1);
        p.player_hp = (p.player_hp - taken).max(0);
        p.message = format!("You hit! {dealt} dmg Enemy hits {taken}");
        if p.player_hp == 0 {
            p.message.push_str(" - You lost!");
            p.outcome = Some(Outcome::Lost);
        }
        p.outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn seeded() -> Battle {
        Battle::with_rng(StdRng::seed_from_u64(11))
    }

    #[test]
    fn practice_starts_in_range() {
        let mut b = seeded();
        for _ in 0..50 {
            b.start_practice();
            let p = b.practice();
            assert_eq!(p.player_hp, PLAYER_MAX_HP);
            assert!((ENEMY_HP.0..=ENEMY_HP.1).contains(&p.enemy_hp));
            assert_eq!(p.outcome, None);
        }
    }

    #[test]
    fn attack_damages_both_sides_within_range() {
        let mut b = seeded();
        b.start_practice();
        b.practice.enemy_hp = 60;
        let mut fx = Vec::new();
        assert_eq!(b.handle_practice(Key::Select, &mut fx), None);
        let p = b.practice();
        assert!((60 - DAMAGE.1..=60 - DAMAGE.0).contains(&p.enemy_hp));
        assert!((PLAYER_MAX_HP - DAMAGE.1..=PLAYER_MAX_HP - DAMAGE.0).contains(&p.player_hp));
        assert!(p.message.starts_with("You hit! "));
        assert_eq!(fx, vec![Effect::Sound(Sfx::Hit)]);
    }

    #[test]
    fn finishing_blow_wins_without_reply() {
        let mut b = seeded();
        b.start_practice();
        b.practice.enemy_hp = 1;
        let mut fx = Vec::new();
        b.handle_practice(Key::Select, &mut fx);
        let p = b.practice();
        assert_eq!(p.outcome, Some(Outcome::Won));
        assert_eq!(p.enemy_hp, 0);
        assert_eq!(p.player_hp, PLAYER_MAX_HP);
        assert_eq!(p.message, "You won!");
        assert_eq!(fx, vec![Effect::Sound(Sfx::Win)]);
    }

    #[test]
    fn losing_clamps_player_hp() {
        let mut b = seeded();
        b.start_practice();
        b.practice.enemy_hp = 60;
        b.practice.player_hp = 1;
        b.handle_practice(Key::Select, &mut Vec::new());
        let p = b.practice();
        assert_eq!(p.player_hp, 0);
        assert_eq!(p.outcome, Some(Outcome::Lost));
        assert!(p.message.ends_with(" - You lost!"));
    }

    #[test]
    fn fight_always_ends_and_hp_never_negative() {
        let mut b = seeded();
        b.start_practice();
        let mut rounds = 0;
        while b.practice().outcome.is_none() {
            b.handle_practice(Key::Select, &mut Vec::new());
            assert!(b.practice().player_hp >= 0 && b.practice().enemy_hp >= 0);
            rounds += 1;
            assert!(rounds < 20);
        }
        assert_eq!(b.handle_practice(Key::Up, &mut Vec::new()), None);
        assert_eq!(b.handle_practice(Key::Select, &mut Vec::new()), Some(Screen::Battle));
    }

    #[test]
    fn run_returns_to_menu() {
        let mut b = seeded();
        b.start_practice();
        let mut fx = Vec::new();
        b.handle_practice(Key::Down, &mut fx);
        assert_eq!(b.handle_practice(Key::Select, &mut fx), Some(Screen::Battle));
        assert_eq!(b.practice().player_hp, PLAYER_MAX_HP);
    }

    #[test]
    fn menu_routes() {
        let mut b = seeded();
        let mut fx = Vec::new();
        assert_eq!(b.handle_menu(Key::Select, &mut fx), Some(Screen::BattlePractice));
        b.handle_menu(Key::Down, &mut fx);
        assert_eq!(b.handle_menu(Key::Select, &mut fx), Some(Screen::BattleGameLink));
        assert_eq!(b.handle_menu(Key::Cancel, &mut fx), Some(Screen::MainMenu));
        assert_eq!(b.handle_gamelink(Key::Left), None);
        assert_eq!(b.handle_gamelink(Key::Cancel), Some(Screen::Battle));
    }
}
