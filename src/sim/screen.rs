/// The screens of the pet. Exactly one is active at a time.

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Screen {
    MainMenu,
    DogPark,
    Inventory,
    Chat,
    Settings,
    SoundSettings,
    Battle,
    BattlePractice,
    BattleGameLink,
    Snake,
    Pong,
    Tetris,
    Remote,
    Type,
}

/// Main menu entries, top to bottom.
pub const MENU: [Screen; 10] = [
    Screen::DogPark,
    Screen::Inventory,
    Screen::Chat,
    Screen::Settings,
    Screen::Battle,
    Screen::Snake,
    Screen::Pong,
    Screen::Tetris,
    Screen::Remote,
    Screen::Type,
];

/// Rows of the main menu shown at once.
pub const MENU_VISIBLE: usize = 6;

impl Screen {
    pub fn label(self) -> &'static str {
        match self {
            Screen::MainMenu => "Main Menu",
            Screen::DogPark => "Dog Park",
            Screen::Inventory => "Inventory",
            Screen::Chat => "Chat",
            Screen::Settings => "Settings",
            Screen::SoundSettings => "Sound",
            Screen::Battle => "Battle",
            Screen::BattlePractice => "Practice",
            Screen::BattleGameLink => "GameLink",
            Screen::Snake => "Snake",
            Screen::Pong => "Pong",
            Screen::Tetris => "Tetris",
            Screen::Remote => "Remote",
            Screen::Type => "Type",
        }
    }
}
