//! Frame ticker for the playback loop.
//!
//! A cooperative, animation-frame style driver. The ticker is a resource:
//! it is acquired when playback starts and released the instant playback
//! stops or the engine is disposed. While released, no activation fires.
//!
//! Activations report the full real time since the previous one. A host
//! that stalls for 30 s gets 30 s of playback on its next frame.

use std::time::{Duration, Instant};

/// Periodic activation source reporting elapsed time between frames.
#[derive(Debug, Clone)]
pub struct FrameTicker {
    frame_interval: Duration,
    /// Time of the previous activation; `Some` while acquired
    last_activation: Option<Instant>,
}

impl FrameTicker {
    /// Create a released ticker targeting `frame_rate` activations per second.
    pub fn new(frame_rate: u32) -> Self {
        let frame_rate = frame_rate.max(1);
        Self {
            frame_interval: Duration::from_nanos(1_000_000_000 / u64::from(frame_rate)),
            last_activation: None,
        }
    }

    /// Target time between activations.
    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    /// Whether the ticker currently holds an activation schedule.
    pub fn is_active(&self) -> bool {
        self.last_activation.is_some()
    }

    /// Start scheduling activations from `now`. Acquiring twice keeps the first schedule.
    pub fn acquire(&mut self, now: Instant) {
        if self.last_activation.is_none() {
            tracing::trace!("ticker acquired");
            self.last_activation = Some(now);
        }
    }

    /// Stop scheduling activations.
    pub fn release(&mut self) {
        if self.last_activation.take().is_some() {
            tracing::trace!("ticker released");
        }
    }

    /// Fire an activation at `now` if one is due.
    ///
    /// Returns the elapsed milliseconds since the previous activation, or
    /// `None` when released or when called again within the same frame.
    pub fn activate(&mut self, now: Instant) -> Option<f64> {
        let last = self.last_activation?;
        let elapsed = now.saturating_duration_since(last);
        // Tolerate hosts whose frames arrive slightly early
        if elapsed + self.frame_interval / 4 < self.frame_interval {
            return None;
        }
        self.last_activation = Some(now);
        Some(elapsed.as_secs_f64() * 1000.0)
    }
}

impl Default for FrameTicker {
    fn default() -> Self {
        Self::new(60)
    }
}
