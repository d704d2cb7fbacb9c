//! Integration tests for bounds resolution through a background source

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use slotplay::player::driver::{run_until_idle, LoopExit};
use slotplay::{
    Bounds, BoundsError, BoundsSource, EngineOptions, FixedWallClock, SlotPlayer, StreamBounds,
    StreamId,
};

use crate::helpers::{pump_until, record_events, slow_source};

fn streams(names: &[&str]) -> Vec<StreamId> {
    names.iter().map(|name| name.to_string()).collect()
}

#[test]
fn bounds_resolve_through_worker() {
    let source = slow_source(Duration::from_millis(10), 1_000, 2_000);
    let player = SlotPlayer::with_source(EngineOptions::default(), FixedWallClock(2_000), source);
    let log = record_events(&player);

    player.set_streams(streams(&["blocks"]));
    assert!(player.meta().is_loading);

    assert_eq!(run_until_idle(&player), LoopExit::Idle);

    let meta = player.meta();
    assert!(!meta.is_loading);
    assert_eq!(meta.error, None);
    assert_eq!(player.config_state().min_slot, Some(1_000));
    assert_eq!(player.config_state().max_slot, Some(2_000));
    assert_eq!(player.slot_state().current_slot, 1_998);
    assert_eq!(log.borrow().slots, vec![1_998]);
}

#[test]
fn source_aggregates_rows_per_stream() {
    let source: Arc<dyn BoundsSource> = Arc::new(|streams: &[StreamId]| {
        let rows: Vec<StreamBounds> = streams
            .iter()
            .enumerate()
            .map(|(i, stream)| StreamBounds {
                stream: stream.clone(),
                min_slot: 100 + i as u64 * 10,
                max_slot: 500 + i as u64 * 10,
            })
            .collect();
        Bounds::aggregate(&rows)
    });
    let player = SlotPlayer::with_source(EngineOptions::default(), FixedWallClock(0), source);

    player.set_streams(streams(&["blocks", "attestations", "blobs"]));
    run_until_idle(&player);

    assert_eq!(player.config_state().min_slot, Some(100));
    assert_eq!(player.config_state().max_slot, Some(520));
}

#[test]
fn source_failure_surfaces_error_and_gates_playback() {
    let source: Arc<dyn BoundsSource> = Arc::new(|_: &[StreamId]| -> Result<Bounds, BoundsError> {
        Err(BoundsError::source_failed("query timed out"))
    });
    let player = SlotPlayer::with_source(EngineOptions::default(), FixedWallClock(0), source);

    player.set_streams(streams(&["blocks"]));
    run_until_idle(&player);

    let meta = player.meta();
    assert!(!meta.is_loading);
    assert_eq!(
        meta.error.as_deref(),
        Some("Bounds source failed: query timed out")
    );

    player.controls().play();
    assert!(!player.slot_state().is_playing);
}

#[test]
fn superseded_stream_set_is_ignored() {
    let source: Arc<dyn BoundsSource> = Arc::new(|streams: &[StreamId]| {
        if streams.len() == 1 {
            thread::sleep(Duration::from_millis(50));
            Bounds::new(0, 100)
        } else {
            Bounds::new(0, 900)
        }
    });
    let player = SlotPlayer::with_source(EngineOptions::default(), FixedWallClock(0), source);

    player.set_streams(streams(&["blocks"]));
    player.set_streams(streams(&["blocks", "blobs"]));
    run_until_idle(&player);

    // Give the superseded fetch time to land, then pump again
    thread::sleep(Duration::from_millis(60));
    player.on_frame(Instant::now());

    assert_eq!(player.config_state().max_slot, Some(900));
    assert_eq!(player.slot_state().current_slot, 898);
}

#[test]
fn stream_change_keeps_position() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let source: Arc<dyn BoundsSource> = Arc::new(move |_: &[StreamId]| {
        let n = counter.fetch_add(1, Ordering::SeqCst) as u64;
        Bounds::new(0, 500 + n * 100)
    });
    let player = SlotPlayer::with_source(EngineOptions::default(), FixedWallClock(0), source);

    player.set_streams(streams(&["blocks"]));
    run_until_idle(&player);
    player.controls().go_to_slot(250);

    player.set_streams(streams(&["blocks", "blobs"]));
    run_until_idle(&player);

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(player.config_state().max_slot, Some(600));
    assert_eq!(player.slot_state().current_slot, 250);
}

#[test]
fn autoplay_starts_once_bounds_arrive() {
    let options = EngineOptions {
        autoplay: true,
        ..EngineOptions::default()
    };
    let source = slow_source(Duration::from_millis(5), 0, 500);
    let player = SlotPlayer::with_source(options, FixedWallClock(0), source);

    player.set_streams(streams(&["blocks"]));
    pump_until(&player, |p| p.config_state().max_slot.is_some());

    assert!(player.slot_state().is_playing);
    assert!(player.is_ticking());
}

#[test]
fn late_result_after_dispose_is_dropped() {
    let source = slow_source(Duration::from_millis(50), 0, 500);
    let player = SlotPlayer::with_source(EngineOptions::default(), FixedWallClock(0), source);

    player.set_streams(streams(&["blocks"]));
    player.dispose();
    thread::sleep(Duration::from_millis(80));
    player.on_frame(Instant::now());

    assert!(player.is_disposed());
    assert_eq!(player.config_state().max_slot, None);
}

#[test]
fn dropping_player_mid_fetch_does_not_block() {
    let source = slow_source(Duration::from_millis(200), 0, 500);
    let player = SlotPlayer::with_source(EngineOptions::default(), FixedWallClock(0), source);
    player.set_streams(streams(&["blocks"]));

    let started = Instant::now();
    drop(player);

    assert!(started.elapsed() < Duration::from_millis(150));
}
