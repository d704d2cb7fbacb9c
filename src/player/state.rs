//! Player state management
//!
//! Contains the central `PlaybackState` struct that holds slot position,
//! play state and speed, the play/pause transitions, and the snapshot
//! types published on each observation surface.

use serde::{Deserialize, Serialize};

use crate::bounds::Bounds;
use crate::player::{clamp_speed, LIVE_THRESHOLD_SLOTS, SLOT_END_MS, STALE_THRESHOLD_SLOTS};

/// How playback behaves at the end of a slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackMode {
    /// Advance across slot boundaries automatically
    #[default]
    Continuous,
    /// Stop at the end of every slot
    Single,
}

/// Why playback is paused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PauseReason {
    /// The viewer paused
    Manual,
    /// Playback hit the data frontier or the end of a single-mode slot
    Boundary,
}

/// Position on the slot timeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotPosition {
    pub current_slot: u64,
    /// Milliseconds into the current slot, in `[0, SLOT_DURATION_MS)`
    pub progress_ms: f64,
}

/// Play/pause state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayState {
    pub is_playing: bool,
    pub mode: PlaybackMode,
    /// Only `Some` while paused
    pub pause_reason: Option<PauseReason>,
}

/// A discrete notification produced by a transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackEvent {
    /// `current_slot` took a new value
    SlotChanged(u64),
    /// Playing flag or pause reason changed
    PlayStateChanged {
        is_playing: bool,
        pause_reason: Option<PauseReason>,
    },
}

/// Slot and play state surface (low frequency).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotState {
    /// Current slot; 0 until bounds resolve
    pub current_slot: u64,
    pub is_playing: bool,
    pub mode: PlaybackMode,
    pub is_stale: bool,
    pub stale_behind_slots: u64,
    pub is_live: bool,
    pub pause_reason: Option<PauseReason>,
}

/// Configuration surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigState {
    pub speed: f64,
    pub min_slot: Option<u64>,
    pub max_slot: Option<u64>,
}

/// Bounds resolution surface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaState {
    pub is_loading: bool,
    pub error: Option<String>,
}

/// Central playback state.
///
/// Every field changes only through the transitions on this type and the
/// functions in `player::playback`, which keep these invariants:
/// `min_slot <= current_slot <= max_slot`, `0 <= progress_ms < SLOT_DURATION_MS`,
/// `MIN_SPEED <= speed <= MAX_SPEED`, and `pause_reason` is `None` while playing.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    /// Resolved bounds; `None` gates all playback
    pub(crate) bounds: Option<Bounds>,
    pub(crate) position: SlotPosition,
    pub(crate) play: PlayState,
    pub(crate) speed: f64,
}

impl PlaybackState {
    /// Create a paused state with no bounds yet.
    pub fn new(mode: PlaybackMode, speed: f64) -> Self {
        Self {
            bounds: None,
            position: SlotPosition {
                current_slot: 0,
                progress_ms: 0.0,
            },
            play: PlayState {
                is_playing: false,
                mode,
                pause_reason: None,
            },
            speed: clamp_speed(speed),
        }
    }

    /// Whether bounds have resolved and playback is possible.
    pub fn is_ready(&self) -> bool {
        self.bounds.is_some()
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    pub fn position(&self) -> SlotPosition {
        self.position
    }

    pub fn play_state(&self) -> PlayState {
        self.play
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Start or resume playback.
    ///
    /// A finished single-mode slot restarts from its beginning.
    pub fn play(&mut self, events: &mut Vec<PlaybackEvent>) {
        if !self.is_ready() {
            return;
        }
        if self.play.mode == PlaybackMode::Single && self.position.progress_ms >= SLOT_END_MS {
            self.position.progress_ms = 0.0;
        }
        self.set_play_state(true, None, events);
    }

    /// Pause playback at the viewer's request.
    pub fn pause(&mut self, events: &mut Vec<PlaybackEvent>) {
        if !self.is_ready() {
            return;
        }
        self.set_play_state(false, Some(PauseReason::Manual), events);
    }

    /// Pause if playing, otherwise play.
    pub fn toggle(&mut self, events: &mut Vec<PlaybackEvent>) {
        if self.play.is_playing {
            self.pause(events);
        } else {
            self.play(events);
        }
    }

    /// Switch between continuous and single-slot playback.
    pub fn set_mode(&mut self, mode: PlaybackMode) {
        self.play.mode = mode;
    }

    /// Set the speed multiplier, clamped to [0.1, 10].
    pub fn set_speed(&mut self, speed: f64) {
        self.speed = clamp_speed(speed);
    }

    /// Pause because a slot edge was reached.
    pub(crate) fn pause_at_boundary(&mut self, events: &mut Vec<PlaybackEvent>) {
        self.set_play_state(false, Some(PauseReason::Boundary), events);
    }

    pub(crate) fn set_play_state(
        &mut self,
        is_playing: bool,
        pause_reason: Option<PauseReason>,
        events: &mut Vec<PlaybackEvent>,
    ) {
        if self.play.is_playing == is_playing && self.play.pause_reason == pause_reason {
            return;
        }
        self.play.is_playing = is_playing;
        self.play.pause_reason = pause_reason;
        tracing::debug!(
            is_playing,
            ?pause_reason,
            slot = self.position.current_slot,
            "play state changed"
        );
        events.push(PlaybackEvent::PlayStateChanged {
            is_playing,
            pause_reason,
        });
    }

    /// Move to `slot` (already clamped), notifying only on a real change.
    pub(crate) fn set_slot(&mut self, slot: u64, events: &mut Vec<PlaybackEvent>) {
        if self.position.current_slot == slot {
            return;
        }
        self.position.current_slot = slot;
        events.push(PlaybackEvent::SlotChanged(slot));
    }

    /// Snapshot of the slot/play surface with derived live and stale flags.
    pub fn slot_state(&self, wall_clock_slot: u64) -> SlotState {
        let current_slot = self.position.current_slot;
        let (is_live, stale_behind_slots) = match self.bounds {
            Some(bounds) => (
                current_slot.saturating_add(LIVE_THRESHOLD_SLOTS) >= bounds.max_slot(),
                wall_clock_slot.saturating_sub(current_slot),
            ),
            None => (false, 0),
        };
        SlotState {
            current_slot,
            is_playing: self.play.is_playing,
            mode: self.play.mode,
            is_stale: stale_behind_slots > STALE_THRESHOLD_SLOTS,
            stale_behind_slots,
            is_live,
            pause_reason: self.play.pause_reason,
        }
    }

    /// Snapshot of the configuration surface.
    pub fn config_state(&self) -> ConfigState {
        ConfigState {
            speed: self.speed,
            min_slot: self.bounds.map(|b| b.min_slot()),
            max_slot: self.bounds.map(|b| b.max_slot()),
        }
    }
}
