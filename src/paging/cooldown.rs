use std::time::Duration;

use tokio::time::Instant;

/// Sliding trigger window used to drop bursts of "load more" requests.
///
/// Every trigger restarts the window, whether or not it was accepted, so a burst of triggers
/// spaced closer than the window only lets the first one through.
#[derive(Debug, Clone)]
pub struct Cooldown {
    window: Duration,
    last_trigger: Option<Instant>,
}

impl Cooldown {
    /// Create a cooldown with the given minimum interval between triggers.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_trigger: None,
        }
    }

    /// Record a trigger and report whether the window since the previous trigger had elapsed.
    pub fn trigger(&mut self) -> bool {
        let now = Instant::now();
        let elapsed = match self.last_trigger {
            Some(previous) => now.duration_since(previous) >= self.window,
            None => true,
        };
        self.last_trigger = Some(now);
        elapsed
    }

    /// Forget the previous trigger so the next one is accepted.
    pub fn clear(&mut self) {
        self.last_trigger = None;
    }

    /// Configured window.
    pub fn window(&self) -> Duration {
        self.window
    }
}
