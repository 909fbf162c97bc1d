//! Active-time bookkeeping.
//!
//! Elapsed time reported with each sample is wall-clock time since the start
//! of acquisition minus every interval spent paused.

use std::time::Duration;
use tokio::time::Instant;

/// Tracks acquisition start, cumulative paused time and the open pause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveClock {
    start: Instant,
    paused_total: Duration,
    pause_started: Option<Instant>,
}

impl ActiveClock {
    /// Start counting at `start`.
    pub fn new(start: Instant) -> Self {
        Self {
            start,
            paused_total: Duration::ZERO,
            pause_started: None,
        }
    }

    /// Acquisition start.
    pub fn start(&self) -> Instant {
        self.start
    }

    /// Begin a pause at `now`. Returns false if already paused.
    pub fn pause(&mut self, now: Instant) -> bool {
        if self.pause_started.is_some() {
            return false;
        }
        self.pause_started = Some(now);
        true
    }

    /// End the open pause at `now` and return its length.
    pub fn resume(&mut self, now: Instant) -> Option<Duration> {
        let began = self.pause_started.take()?;
        let span = now.saturating_duration_since(began);
        self.paused_total += span;
        Some(span)
    }

    /// Whether a pause is open.
    pub fn is_paused(&self) -> bool {
        self.pause_started.is_some()
    }

    /// Total closed pause time.
    pub fn paused_total(&self) -> Duration {
        self.paused_total
    }

    /// Active time at `now`. Frozen while a pause is open.
    pub fn elapsed(&self, now: Instant) -> Duration {
        let open_pause = self
            .pause_started
            .map_or(Duration::ZERO, |began| now.saturating_duration_since(began));

        now.saturating_duration_since(self.start)
            .saturating_sub(self.paused_total)
            .saturating_sub(open_pause)
    }
}
