/// The pet's screen flow: the state machine and the per-screen state it
/// routes input to.

pub mod battle;
pub mod chat;
pub mod event;
pub mod inventory;
pub mod machine;
pub mod remote;
pub mod screen;
pub mod settings;
