/// Chat transport interface and the channel-backed link the frame loop
/// holds, plus the offline "simulated peer" transport.

use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
use tokio::time;
use tracing::{debug, info};

use super::runtime;
use crate::sim::chat::ChatLine;

/// Lines of history kept; older lines are dropped.
pub const HISTORY_MAX: usize = 100;

pub trait ChatTransport {
    /// Collect anything received since the last poll and return the whole
    /// history, oldest first.
    fn poll_incoming(&mut self) -> &[ChatLine];

    /// Queue a line for sending. Never blocks.
    fn enqueue_outgoing(&mut self, text: String);
}

/// Frame-loop side of a transport worker task.
/// Incoming lines arrive on a std channel drained each frame; outgoing
/// lines go to the worker over an unbounded tokio channel, so neither side
/// blocks.
pub struct ChatLink {
    incoming: Receiver<ChatLine>,
    outgoing: UnboundedSender<String>,
    history: Vec<ChatLine>,
    /// Author shown for our own lines.
    local: String,
}

impl ChatLink {
    pub fn new(
        incoming: Receiver<ChatLine>,
        outgoing: UnboundedSender<String>,
        local: &str,
    ) -> Self {
        ChatLink {
            incoming,
            outgoing,
            history: Vec::new(),
            local: local.to_string(),
        }
    }

    fn push(&mut self, line: ChatLine) {
        self.history.push(line);
        if self.history.len() > HISTORY_MAX {
            let excess = self.history.len() - HISTORY_MAX;
            self.history.drain(..excess);
        }
    }
}

impl ChatTransport for ChatLink {
    fn poll_incoming(&mut self) -> &[ChatLine] {
        while let Ok(line) = self.incoming.try_recv() {
            self.push(line);
        }
        &self.history
    }

    fn enqueue_outgoing(&mut self, text: String) {
        let line = ChatLine::new(self.local.clone(), text.clone());
        self.push(line);
        if self.outgoing.send(text).is_err() {
            self.push(ChatLine::new("error", "chat link is down"));
        }
    }
}

const PET_REPLIES: &[&str] = &[
    "Woof!",
    "*wags tail*",
    "Is it dinner time?",
    "Throw the ball!",
    "*rolls over*",
    "I missed you!",
];

const REPLY_DELAY: Duration = Duration::from_millis(400);

/// Start the offline transport: a pet that answers every line.
pub fn spawn_simulated(local: &str) -> std::io::Result<ChatLink> {
    let rt = runtime::get()?;
    let (in_tx, in_rx) = mpsc::channel();
    let (out_tx, mut out_rx) = unbounded_channel::<String>();

    rt.spawn(async move {
        let mut rng = StdRng::from_entropy();
        if in_tx.send(ChatLine::new("pet", "Hi! Say something.")).is_err() {
            return;
        }
        while out_rx.recv().await.is_some() {
            time::sleep(REPLY_DELAY).await;
            let reply = PET_REPLIES.choose(&mut rng).copied().unwrap_or("Woof!");
            if in_tx.send(ChatLine::new("pet", reply)).is_err() {
                break;
            }
        }
        debug!("simulated chat stopped");
    });

    info!("simulated chat started");
    Ok(ChatLink::new(in_rx, out_tx, local))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::Sender;
    use std::thread;
    use std::time::Instant;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn link() -> (ChatLink, Sender<ChatLine>, UnboundedReceiver<String>) {
        let (in_tx, in_rx) = mpsc::channel();
        let (out_tx, out_rx) = unbounded_channel();
        (ChatLink::new(in_rx, out_tx, "me"), in_tx, out_rx)
    }

    #[test]
    fn outgoing_is_echoed_and_forwarded() {
        let (mut l, _in_tx, mut out_rx) = link();
        l.enqueue_outgoing("hello".into());
        assert_eq!(out_rx.try_recv().unwrap(), "hello");
        assert_eq!(l.poll_incoming(), &[ChatLine::new("me", "hello")]);
    }

    #[test]
    fn history_is_capped() {
        let (mut l, in_tx, _out_rx) = link();
        for i in 0..HISTORY_MAX + 5 {
            in_tx.send(ChatLine::new("bob", i.to_string())).unwrap();
        }
        let lines = l.poll_incoming();
        assert_eq!(lines.len(), HISTORY_MAX);
        assert_eq!(lines[0].text, "5");
    }

    #[test]
    fn dead_worker_reports_error() {
        let (mut l, _in_tx, out_rx) = link();
        drop(out_rx);
        l.enqueue_outgoing("anyone?".into());
        let lines = l.poll_incoming();
        assert_eq!(lines.last().map(|l| l.author.as_str()), Some("error"));
    }

    #[test]
    fn simulated_pet_replies() {
        let mut l = spawn_simulated("me").unwrap();
        l.enqueue_outgoing("hi".into());
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let lines = l.poll_incoming();
            if lines.iter().filter(|l| l.author == "pet").count() >= 2 {
                break;
            }
            assert!(Instant::now() < deadline, "no reply from pet");
            thread::sleep(Duration::from_millis(20));
        }
    }
}
