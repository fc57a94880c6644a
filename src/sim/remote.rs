/// Messages between the HTTP control panel and the state machine.
///
/// The server thread only ever reads a `RemoteView` snapshot and sends
/// `RemoteCommand`s back; the frame loop applies them.

use super::chat::ChatLine;

/// Chat lines shown on the panel.
pub const REMOTE_CHAT_TAIL: usize = 10;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RemoteCommand {
    SetOption { name: String, value: String },
    SendChat(String),
    AddItem(String),
    RemoveItem(usize),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RemoteView {
    pub difficulty: String,
    pub wifi: bool,
    pub items: Vec<String>,
    pub chat: Vec<ChatLine>,
}
