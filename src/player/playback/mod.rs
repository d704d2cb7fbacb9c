//! Playback logic for the slot player.
//!
//! This module handles tick advancement, seeking and slot navigation, and
//! applying refreshed bounds. All functions mutate a `PlaybackState` and
//! append the events they produced.

mod advance;
mod refresh;
mod seeking;

pub use advance::advance;
pub use refresh::apply_bounds;
pub use seeking::{
    fast_forward, go_to_slot, jump_to_live, next_slot, previous_slot, rewind, seek_to_time,
};
