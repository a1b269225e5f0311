//! Trailing-edge throttle
//!
//! The first value after a quiet period passes straight through. Values
//! arriving inside the interval are coalesced; the newest is released by
//! `poll` once the interval has elapsed. Nothing offered is lost for good,
//! only superseded.
//!
//! Time is passed in explicitly so callers can drive it from their own tick.

use std::time::{Duration, Instant};

/// Reference interval for visual feedback recomputation
pub const DEFAULT_FEEDBACK_INTERVAL: Duration = Duration::from_millis(30);

#[derive(Debug, Clone)]
pub struct Throttle<T> {
    interval: Duration,
    last_emit: Option<Instant>,
    pending: Option<T>,
}

impl<T> Throttle<T> {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_emit: None,
            pending: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    fn ready(&self, now: Instant) -> bool {
        match self.last_emit {
            Some(last) => now.saturating_duration_since(last) >= self.interval,
            None => true,
        }
    }

    /// Offer a new value; returns it immediately if the interval has passed
    pub fn offer(&mut self, value: T, now: Instant) -> Option<T> {
        if self.ready(now) {
            self.last_emit = Some(now);
            self.pending = None;
            Some(value)
        } else {
            self.pending = Some(value);
            None
        }
    }

    /// Release the coalesced value once the interval has elapsed
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        if self.pending.is_some() && self.ready(now) {
            self.last_emit = Some(now);
            self.pending.take()
        } else {
            None
        }
    }

    /// When the pending value becomes releasable, if any
    pub fn deadline(&self) -> Option<Instant> {
        match (&self.pending, self.last_emit) {
            (Some(_), Some(last)) => Some(last + self.interval),
            _ => None,
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl<T> Default for Throttle<T> {
    fn default() -> Self {
        Self::new(DEFAULT_FEEDBACK_INTERVAL)
    }
}
