//! Applying resolved bounds to playback state.

use crate::bounds::Bounds;
use crate::player::state::{PlaybackEvent, PlaybackState};

/// Install freshly resolved bounds.
///
/// The first resolution places the playhead at `initial_slot` (clamped) or,
/// without one, at the live edge. Later refreshes keep the position unless
/// the range no longer contains it, in which case the slot is clamped back
/// in and progress restarts at the beginning of that slot.
///
/// Returns true when this was the first resolution.
pub fn apply_bounds(
    state: &mut PlaybackState,
    bounds: Bounds,
    initial_slot: Option<u64>,
    events: &mut Vec<PlaybackEvent>,
) -> bool {
    let first = state.bounds.is_none();
    state.bounds = Some(bounds);

    if first {
        let slot = initial_slot
            .map(|slot| bounds.clamp(slot))
            .unwrap_or_else(|| bounds.live_edge());
        state.position.current_slot = slot;
        state.position.progress_ms = 0.0;
        events.push(PlaybackEvent::SlotChanged(slot));
        tracing::debug!(
            min_slot = bounds.min_slot(),
            max_slot = bounds.max_slot(),
            slot,
            "bounds resolved"
        );
        return true;
    }

    let clamped = bounds.clamp(state.position.current_slot);
    if clamped != state.position.current_slot {
        tracing::debug!(
            from = state.position.current_slot,
            to = clamped,
            "re-clamping slot after bounds refresh"
        );
        state.set_slot(clamped, events);
        state.position.progress_ms = 0.0;
    }
    false
}
