//! Slot playback engine
//!
//! A video-player style controller for a timeline of fixed-duration
//! (12 second) blockchain slots. It reconciles a continuous, wall-clock
//! driven frame loop with a discrete, bounded slot index:
//!
//! - `player`: the playback state machine, frame ticker, observation surfaces and command API
//! - `bounds`: slot ranges reported by the data streams, fetched off the frame loop
//! - `clock`: the wall-clock slot used to detect stale playback
//! - `config`: TOML configuration for initial playback settings

pub mod bounds;
pub mod clock;
pub mod config;
pub mod player;

pub use bounds::{Bounds, BoundsError, BoundsSource, StreamBounds, StreamId};
pub use clock::{FixedWallClock, GenesisClock, WallClock};
pub use config::Config;
pub use player::{
    EngineOptions, PauseReason, PlaybackControls, PlaybackMode, SlotPlayer, SlotState,
    SLOT_DURATION_MS,
};
