//! Slot playback engine
//!
//! Scrubs through a bounded timeline of fixed-duration slots the way a
//! video player scrubs through frames: play, pause, step between slots,
//! seek within a slot, change speed, and stop automatically at the
//! frontier of available data.
//!
//! # Architecture
//!
//! The player is organized into submodules:
//! - `state`: PlaybackState struct, play/pause transitions, and the snapshot types
//! - `playback/`: tick advancement, seeking, navigation, and bounds application
//! - `ticker`: the frame ticker resource (acquired while playing)
//! - `observe`: independent publish/subscribe topics for each observation surface
//! - `engine`: `SlotPlayer` and the stable `PlaybackControls` command handle
//! - `driver`: a blocking frame loop for hosts without their own animation loop
//!
//! # Usage
//!
//! ```
//! use slotplay::bounds::Bounds;
//! use slotplay::clock::FixedWallClock;
//! use slotplay::player::{EngineOptions, SlotPlayer};
//!
//! let player = SlotPlayer::new(EngineOptions::default(), FixedWallClock(510));
//! player.apply_bounds(Bounds::new(0, 500));
//!
//! let controls = player.controls().clone();
//! controls.jump_to_live();
//! player.tick(16.0);
//!
//! assert_eq!(player.slot_state().current_slot, 498);
//! assert!(player.slot_state().is_playing);
//! ```

pub mod driver;
pub mod engine;
pub mod observe;
pub(crate) mod playback;
pub mod state;
pub mod ticker;

pub use engine::{EngineOptions, PlaybackControls, SlotPlayer};
pub use observe::Subscription;
pub use state::{
    ConfigState, MetaState, PauseReason, PlayState, PlaybackEvent, PlaybackMode, PlaybackState,
    SlotPosition, SlotState,
};
pub use ticker::FrameTicker;

/// Real-world duration of one slot in milliseconds
pub const SLOT_DURATION_MS: f64 = 12_000.0;

/// Gap kept below `SLOT_DURATION_MS` when holding at the end of a slot
pub const SLOT_END_EPSILON_MS: f64 = 0.001;

/// Progress value that represents "end of the current slot"
pub const SLOT_END_MS: f64 = SLOT_DURATION_MS - SLOT_END_EPSILON_MS;

/// A slot within this many slots of `max_slot` counts as live
pub const LIVE_THRESHOLD_SLOTS: u64 = 2;

/// Playback is stale when more than this many slots behind the wall clock
pub const STALE_THRESHOLD_SLOTS: u64 = 10;

/// Slowest playback speed
pub const MIN_SPEED: f64 = 0.1;

/// Fastest playback speed
pub const MAX_SPEED: f64 = 10.0;

/// Clamp a speed multiplier into `[MIN_SPEED, MAX_SPEED]`. NaN maps to the minimum.
pub fn clamp_speed(speed: f64) -> f64 {
    if speed.is_nan() {
        return MIN_SPEED;
    }
    speed.clamp(MIN_SPEED, MAX_SPEED)
}

/// Clamp a progress value into `[0, SLOT_END_MS]`. NaN maps to zero.
pub fn clamp_progress(progress_ms: f64) -> f64 {
    if progress_ms.is_nan() {
        return 0.0;
    }
    progress_ms.clamp(0.0, SLOT_END_MS)
}
