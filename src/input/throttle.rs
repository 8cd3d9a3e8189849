use std::time::{Duration, Instant};

/// Leading-edge rate limiter: the first call in a window passes, the rest of
/// the window is dropped, and nothing fires when the window closes.
#[derive(Clone, Debug, Default)]
pub struct Throttle {
    interval: Duration,
    window_start: Option<Instant>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self { Throttle { interval, window_start: None } }

    pub fn is_enabled(&self) -> bool { !self.interval.is_zero() }

    /// Whether a dispatch at `now` may proceed. A passing call opens a new window.
    pub fn try_acquire(&mut self, now: Instant) -> bool {
        if !self.is_enabled() {
            return true;
        }
        if let Some(start) = self.window_start
            && now.saturating_duration_since(start) < self.interval
        {
            return false;
        }
        self.window_start = Some(now);
        true
    }

    /// Closes the open window so the next call passes immediately.
    pub fn cancel(&mut self) { self.window_start = None; }

    /// Whether a window opened by an earlier call is still running at `now`.
    pub fn is_pending(&self, now: Instant) -> bool {
        self.window_start.is_some_and(|start| now.saturating_duration_since(start) < self.interval)
    }
}
