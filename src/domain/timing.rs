/// Fixed-interval gate for time-driven screens.
///
/// `now` is the time since program start. A fresh gate fires on the
/// first call; after that it fires once `interval` has elapsed since the
/// last firing.

use std::time::Duration;

#[derive(Clone, Debug)]
pub struct TickGate {
    interval: Duration,
    last: Option<Duration>,
}

impl TickGate {
    pub fn new(interval: Duration) -> Self {
        TickGate { interval, last: None }
    }

    /// Returns true and records `now` when the interval has elapsed.
    pub fn ready(&mut self, now: Duration) -> bool {
        match self.last {
            Some(last) if now.saturating_sub(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }

    /// Next call to `ready` fires immediately.
    pub fn rearm(&mut self) {
        self.last = None;
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}
