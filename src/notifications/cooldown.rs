use crate::events::Timestamp;
use chrono::Duration;

/// Debounce timer owned by a single notification rule instance
///
/// Each rule carries its own `Cooldown`; the fired-at state is deliberately
/// per-instance so two rules can never share a window. The check and the
/// stamp are one step, so a duplicate evaluation of the same instant cannot
/// fire twice.
#[derive(Debug)]
pub struct Cooldown {
    /// Minimum spacing between fires
    interval: Duration,
    /// When the rule last committed to firing, `None` before the first fire
    last_fired_at: Option<Timestamp>,
    /// Previous stamp, kept so a failed evaluation can be rolled back
    previous: Option<Timestamp>,
}

impl Cooldown {
    /// Create a cooldown that allows an immediate first fire
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_fired_at: None,
            previous: None,
        }
    }

    /// Whether the window has elapsed at `now`
    pub fn is_elapsed(&self, now: Timestamp) -> bool {
        match self.last_fired_at {
            None => true,
            Some(last) => now - last > self.interval,
        }
    }

    /// Check-and-stamp: returns `true` and records `now` as the fire time
    /// when the window has elapsed
    pub fn fire(&mut self, now: Timestamp) -> bool {
        if !self.is_elapsed(now) {
            return false;
        }
        self.previous = self.last_fired_at;
        self.last_fired_at = Some(now);
        true
    }

    /// Roll the last stamp back, re-opening the window it consumed
    pub fn retract(&mut self) {
        self.last_fired_at = self.previous;
    }

    /// When the rule last committed to firing
    pub fn last_fired_at(&self) -> Option<Timestamp> {
        self.last_fired_at
    }
}
