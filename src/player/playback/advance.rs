//! Tick advancement.
//!
//! Converts elapsed real time into progress through the current slot and
//! walks across slot boundaries one slot at a time.

use crate::player::state::{PlaybackEvent, PlaybackMode, PlaybackState};
use crate::player::{SLOT_DURATION_MS, SLOT_END_MS};

/// Advance playback by `elapsed_ms` of real time.
///
/// The elapsed time is scaled by the speed multiplier. Every slot crossed is
/// reported in increasing order, so no slot is skipped even at 10x.
///
/// Playback pauses with `PauseReason::Boundary` when:
/// - the next slot would be past `max_slot` (holds at the end of the last slot)
/// - single mode reaches the end of a slot (rewinds to the slot start)
/// - continuous mode enters `max_slot`, the unconfirmed data frontier
///
/// Does nothing while paused, before bounds resolve, or for non-positive
/// or non-finite elapsed times.
pub fn advance(state: &mut PlaybackState, elapsed_ms: f64, events: &mut Vec<PlaybackEvent>) {
    let Some(bounds) = state.bounds else {
        return;
    };
    if !state.play.is_playing || !elapsed_ms.is_finite() || elapsed_ms <= 0.0 {
        return;
    }

    let mut progress = state.position.progress_ms + elapsed_ms * state.speed;

    while progress >= SLOT_DURATION_MS {
        progress -= SLOT_DURATION_MS;
        let candidate = state.position.current_slot.saturating_add(1);

        if candidate > bounds.max_slot() || candidate == state.position.current_slot {
            state.position.progress_ms = SLOT_END_MS;
            state.pause_at_boundary(events);
            return;
        }

        if state.play.mode == PlaybackMode::Single {
            state.position.progress_ms = 0.0;
            state.pause_at_boundary(events);
            return;
        }

        state.set_slot(candidate, events);

        if candidate == bounds.max_slot() {
            tracing::debug!(slot = candidate, "reached data frontier");
            state.position.progress_ms = 0.0;
            state.pause_at_boundary(events);
            return;
        }
    }

    tracing::trace!(
        slot = state.position.current_slot,
        progress_ms = progress,
        "advanced"
    );
    state.position.progress_ms = progress;
}
