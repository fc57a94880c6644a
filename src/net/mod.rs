/// Network collaborators: chat transports and the HTTP control panel.
/// Each runs as a task on a shared tokio runtime and talks to the frame
/// loop over channels.

pub mod irc;
pub mod remote;
pub mod runtime;
pub mod transport;
