/// Inventory: browse items, open an action menu on one, inspect it.

use super::event::{Effect, Sfx};
use super::screen::Screen;
use crate::domain::input::Key;
use crate::domain::selection::SelectionIndex;

pub const START_ITEMS: &[&str] = &[
    "Ball of Yarn",
    "Catnip",
    "Canned Tuna",
    "Feather Toy",
    "Laser Pointer",
];
pub const ITEM_ACTIONS: [&str; 3] = ["Select", "Discard", "Inspect"];

/// Rows of the item list shown at once.
pub const ITEMS_VISIBLE: usize = 5;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum InventoryMode {
    Browse,
    Actions,
    Inspect,
}

#[derive(Clone, Debug)]
pub struct Inventory {
    items: Vec<String>,
    cursor: SelectionIndex,
    actions: SelectionIndex,
    mode: InventoryMode,
    /// Item last marked with the Select action.
    equipped: Option<String>,
}

impl Inventory {
    pub fn new() -> Self {
        let items: Vec<String> = START_ITEMS.iter().map(|s| s.to_string()).collect();
        Inventory {
            cursor: SelectionIndex::new(items.len(), ITEMS_VISIBLE),
            items,
            actions: SelectionIndex::new(ITEM_ACTIONS.len(), ITEM_ACTIONS.len()),
            mode: InventoryMode::Browse,
            equipped: None,
        }
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn cursor(&self) -> &SelectionIndex {
        &self.cursor
    }

    pub fn actions(&self) -> &SelectionIndex {
        &self.actions
    }

    pub fn mode(&self) -> InventoryMode {
        self.mode
    }

    pub fn equipped(&self) -> Option<&str> {
        self.equipped.as_deref()
    }

    pub fn highlighted(&self) -> Option<&str> {
        self.cursor.select(&self.items).map(String::as_str)
    }

    pub fn enter(&mut self) {
        self.cursor.reset();
        self.mode = InventoryMode::Browse;
    }

    pub fn add_item(&mut self, item: String) {
        self.items.push(item);
        self.cursor.set_count(self.items.len());
    }

    /// Remove by index. Out-of-range indices are ignored.
    pub fn remove_item(&mut self, index: usize) -> bool {
        if index >= self.items.len() {
            return false;
        }
        self.items.remove(index);
        self.cursor.set_count(self.items.len());
        if self.items.is_empty() {
            self.mode = InventoryMode::Browse;
        }
        true
    }

    pub fn handle(&mut self, key: Key, fx: &mut Vec<Effect>) -> Option<Screen> {
        match self.mode {
            InventoryMode::Browse => match key {
                Key::Up | Key::Down => {
                    self.cursor.move_by(if key == Key::Up { -1 } else { 1 });
                    fx.push(Effect::Sound(Sfx::Move));
                    None
                }
                Key::Select if !self.items.is_empty() => {
                    self.actions.reset();
                    self.mode = InventoryMode::Actions;
                    fx.push(Effect::Sound(Sfx::Select));
                    None
                }
                Key::Cancel => Some(Screen::MainMenu),
                _ => None,
            },
            InventoryMode::Actions => {
                match key {
                    Key::Up | Key::Down => {
                        self.actions.move_by(if key == Key::Up { -1 } else { 1 });
                        fx.push(Effect::Sound(Sfx::Move));
                    }
                    Key::Select => self.apply_action(fx),
                    Key::Cancel => self.mode = InventoryMode::Browse,
                    _ => {}
                }
                None
            }
            InventoryMode::Inspect => {
                if matches!(key, Key::Select | Key::Cancel) {
                    self.mode = InventoryMode::Actions;
                }
                None
            }
        }
    }

    fn apply_action(&mut self, fx: &mut Vec<Effect>) {
        let Some(item) = self.highlighted().map(str::to_string) else {
            self.mode = InventoryMode::Browse;
            return;
        };
        match self.actions.select(&ITEM_ACTIONS) {
            Some(&"Select") => {
                self.equipped = Some(item);
                self.mode = InventoryMode::Browse;
                fx.push(Effect::Sound(Sfx::Select));
            }
            Some(&"Discard") => {
                self.remove_item(self.cursor.current());
                self.mode = InventoryMode::Browse;
            }
            _ => self.mode = InventoryMode::Inspect,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(inv: &mut Inventory, keys: &[Key]) {
        let mut fx = Vec::new();
        for &k in keys {
            inv.handle(k, &mut fx);
        }
    }

    #[test]
    fn select_action_equips_item() {
        let mut inv = Inventory::new();
        press(&mut inv, &[Key::Down, Key::Select]);
        assert_eq!(inv.mode(), InventoryMode::Actions);
        press(&mut inv, &[Key::Select]);
        assert_eq!(inv.equipped(), Some("Catnip"));
        assert_eq!(inv.mode(), InventoryMode::Browse);
    }

    #[test]
    fn discard_last_clamps_cursor() {
        let mut inv = Inventory::new();
        press(&mut inv, &[Key::Up, Key::Select, Key::Down, Key::Select]);
        assert_eq!(inv.items().len(), START_ITEMS.len() - 1);
        assert_eq!(inv.cursor().current(), START_ITEMS.len() - 2);
        assert_eq!(inv.highlighted(), Some("Feather Toy"));
    }

    #[test]
    fn inspect_and_back() {
        let mut inv = Inventory::new();
        press(&mut inv, &[Key::Select, Key::Up]);
        press(&mut inv, &[Key::Select]);
        assert_eq!(inv.mode(), InventoryMode::Inspect);
        press(&mut inv, &[Key::Cancel]);
        assert_eq!(inv.mode(), InventoryMode::Actions);
        press(&mut inv, &[Key::Cancel]);
        assert_eq!(inv.mode(), InventoryMode::Browse);
    }

    #[test]
    fn empty_inventory_stays_in_browse() {
        let mut inv = Inventory::new();
        while !inv.items().is_empty() {
            inv.remove_item(0);
        }
        press(&mut inv, &[Key::Select, Key::Down]);
        assert_eq!(inv.mode(), InventoryMode::Browse);
        assert_eq!(inv.highlighted(), None);
        let mut fx = Vec::new();
        assert_eq!(inv.handle(Key::Cancel, &mut fx), Some(Screen::MainMenu));
    }

    #[test]
    fn remote_add_and_remove() {
        let mut inv = Inventory::new();
        inv.add_item("Bone".into());
        assert_eq!(inv.items().last().map(String::as_str), Some("Bone"));
        assert!(inv.remove_item(0));
        assert!(!inv.remove_item(99));
        assert_eq!(inv.items()[0], "Catnip");
    }
}
