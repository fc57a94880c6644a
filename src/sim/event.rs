/// Side effects requested by the state machine.
/// The frame loop executes these against audio, network and system
/// collaborators; the machine itself performs no I/O.

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Sfx {
    Move,
    Select,
    Apple,
    Crash,
    Paddle,
    Point,
    Miss,
    Lock,
    Line,
    Hit,
    Win,
    Lose,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Track {
    Tetris,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Effect {
    /// Start the chat transport. Emitted at most once per process.
    StartChat,
    /// Start the HTTP control panel. Emitted at most once per process.
    StartRemote,
    PlayMusic(Track),
    StopMusic,
    Sound(Sfx),
    SendChat(String),
    SetVolume(u8),
    SetWifi(bool),
    SetBluetooth(bool),
    SetOutput(String),
    Quit,
}
