//! Seeking and slot navigation.
//!
//! Every function clamps its argument instead of rejecting it, and does
//! nothing until bounds have resolved.

use crate::player::state::{PlaybackEvent, PlaybackState};
use crate::player::{clamp_progress, SLOT_END_MS};

/// Seek to `ms` within the current slot, clamped to the slot.
pub fn seek_to_time(state: &mut PlaybackState, ms: f64) {
    if !state.is_ready() {
        return;
    }
    state.position.progress_ms = clamp_progress(ms);
}

/// Seek to the start of the current slot.
pub fn rewind(state: &mut PlaybackState) {
    seek_to_time(state, 0.0);
}

/// Seek to the end of the current slot.
///
/// Does not cross into the next slot; the next tick (if playing) does.
pub fn fast_forward(state: &mut PlaybackState) {
    seek_to_time(state, SLOT_END_MS);
}

/// Jump to `slot`, clamped to the bounds, at the start of the slot.
///
/// Jumping to the current slot is a no-op and keeps the progress.
pub fn go_to_slot(state: &mut PlaybackState, slot: u64, events: &mut Vec<PlaybackEvent>) {
    let Some(bounds) = state.bounds else {
        return;
    };
    let target = bounds.clamp(slot);
    if target == state.position.current_slot {
        return;
    }
    tracing::debug!(from = state.position.current_slot, to = target, "go to slot");
    state.set_slot(target, events);
    state.position.progress_ms = 0.0;
}

/// Step to the following slot; no-op at `max_slot`.
pub fn next_slot(state: &mut PlaybackState, events: &mut Vec<PlaybackEvent>) {
    let target = state.position.current_slot.saturating_add(1);
    go_to_slot(state, target, events);
}

/// Step to the preceding slot; no-op at `min_slot`.
pub fn previous_slot(state: &mut PlaybackState, events: &mut Vec<PlaybackEvent>) {
    let target = state.position.current_slot.saturating_sub(1);
    go_to_slot(state, target, events);
}

/// Jump to the live edge (`max_slot - 2`) and start playing from its beginning.
pub fn jump_to_live(state: &mut PlaybackState, events: &mut Vec<PlaybackEvent>) {
    let Some(bounds) = state.bounds else {
        return;
    };
    state.set_slot(bounds.live_edge(), events);
    state.position.progress_ms = 0.0;
    state.play(events);
}
