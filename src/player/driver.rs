//! Blocking frame loop.
//!
//! For hosts without their own animation loop (tests, headless tools):
//! pumps [`SlotPlayer::on_frame`] at the ticker's frame interval while the
//! engine has work to do.

use std::thread;
use std::time::Instant;

use crate::player::engine::SlotPlayer;

/// Why the frame loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// Not playing and no bounds fetch in flight
    Idle,
    /// The stop predicate asked to stop
    Stopped,
    /// The engine was disposed
    Disposed,
}

/// Whether the engine still needs frames.
fn is_busy(player: &SlotPlayer) -> bool {
    player.is_ticking() || player.meta().is_loading
}

/// Pump frames until the engine goes idle.
pub fn run_until_idle(player: &SlotPlayer) -> LoopExit {
    run_until(player, || false)
}

/// Pump frames until the engine goes idle or `stop` returns true.
///
/// `stop` is checked once per frame, before the frame runs.
pub fn run_until(player: &SlotPlayer, mut stop: impl FnMut() -> bool) -> LoopExit {
    let interval = player.frame_interval();
    let mut frames: u64 = 0;
    let exit = loop {
        if player.is_disposed() {
            break LoopExit::Disposed;
        }
        if stop() {
            break LoopExit::Stopped;
        }
        player.on_frame(Instant::now());
        frames += 1;
        if player.is_disposed() {
            break LoopExit::Disposed;
        }
        if !is_busy(player) {
            break LoopExit::Idle;
        }
        thread::sleep(interval);
    };
    tracing::debug!(frames, ?exit, "frame loop finished");
    exit
}
