//! Property tests: invariants hold after any sequence of commands and ticks

use std::cell::RefCell;
use std::rc::Rc;

use proptest::prelude::*;

use slotplay::player::{MAX_SPEED, MIN_SPEED, SLOT_DURATION_MS};
use slotplay::{Bounds, PlaybackMode, SlotPlayer};

use crate::helpers::player_at;

#[derive(Debug, Clone)]
enum Op {
    Play,
    Pause,
    Toggle,
    SetMode(PlaybackMode),
    Next,
    Previous,
    Rewind,
    FastForward,
    JumpToLive,
    GoToSlot(u64),
    Seek(f64),
    Speed(f64),
    Tick(f64),
    Refresh(u64, u64),
}

fn arb_simple_op() -> impl Strategy<Value = Op> {
    (0u8..10).prop_map(|n| match n {
        0 => Op::Play,
        1 => Op::Pause,
        2 => Op::Toggle,
        3 => Op::SetMode(PlaybackMode::Continuous),
        4 => Op::SetMode(PlaybackMode::Single),
        5 => Op::Next,
        6 => Op::Previous,
        7 => Op::Rewind,
        8 => Op::FastForward,
        _ => Op::JumpToLive,
    })
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => arb_simple_op(),
        1 => (0u64..400).prop_map(Op::GoToSlot),
        1 => (-20_000.0f64..40_000.0).prop_map(Op::Seek),
        1 => (-5.0f64..50.0).prop_map(Op::Speed),
        3 => (0.0f64..200_000.0).prop_map(Op::Tick),
        1 => (0u64..300, 0u64..300).prop_map(|(a, b)| Op::Refresh(a.min(b), a.max(b))),
    ]
}

fn apply(player: &SlotPlayer, op: &Op) {
    let controls = player.controls();
    match *op {
        Op::Play => controls.play(),
        Op::Pause => controls.pause(),
        Op::Toggle => controls.toggle(),
        Op::SetMode(mode) => controls.set_mode(mode),
        Op::Next => controls.next_slot(),
        Op::Previous => controls.previous_slot(),
        Op::Rewind => controls.rewind(),
        Op::FastForward => controls.fast_forward(),
        Op::JumpToLive => controls.jump_to_live(),
        Op::GoToSlot(slot) => controls.go_to_slot(slot),
        Op::Seek(ms) => controls.seek_to_time(ms),
        Op::Speed(speed) => controls.set_playback_speed(speed),
        Op::Tick(elapsed_ms) => player.tick(elapsed_ms),
        Op::Refresh(min_slot, max_slot) => player.apply_bounds(Bounds::new(min_slot, max_slot)),
    }
}

fn check_invariants(player: &SlotPlayer) -> Result<(), TestCaseError> {
    let state = player.snapshot();
    let position = state.position();
    let play = state.play_state();

    if let Some(bounds) = state.bounds() {
        prop_assert!(bounds.min_slot() <= position.current_slot);
        prop_assert!(position.current_slot <= bounds.max_slot());
    }
    prop_assert!(position.progress_ms >= 0.0);
    prop_assert!(position.progress_ms < SLOT_DURATION_MS);
    prop_assert!(state.speed() >= MIN_SPEED && state.speed() <= MAX_SPEED);
    if play.is_playing {
        prop_assert_eq!(play.pause_reason, None);
    }
    prop_assert_eq!(player.is_ticking(), play.is_playing);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    #[test]
    fn invariants_hold_after_every_operation(
        ops in prop::collection::vec(arb_op(), 1..60)
    ) {
        let player = player_at(100, 200, 150);
        let slots = Rc::new(RefCell::new(vec![150u64]));
        let seen = Rc::clone(&slots);
        player.on_slot_change(move |slot| seen.borrow_mut().push(slot));

        for op in &ops {
            apply(&player, op);
            check_invariants(&player)?;
        }

        // Each notification reports a new value
        let slots = slots.borrow();
        for pair in slots.windows(2) {
            prop_assert_ne!(pair[0], pair[1]);
        }
        prop_assert_eq!(
            slots.last().copied(),
            Some(player.slot_state().current_slot)
        );
    }

    #[test]
    fn seek_round_trips_inside_slot(ms in 0.0f64..11_999.0) {
        let player = player_at(100, 200, 150);
        player.controls().seek_to_time(ms);
        prop_assert_eq!(player.progress_ms(), ms);
    }

    #[test]
    fn pause_twice_equals_pause_once(ops in prop::collection::vec(arb_op(), 0..20)) {
        let player = player_at(100, 200, 150);
        for op in &ops {
            apply(&player, op);
        }
        player.controls().pause();
        let once = player.snapshot();
        player.controls().pause();
        prop_assert_eq!(player.snapshot(), once);
    }

    #[test]
    fn go_to_current_slot_is_noop(ops in prop::collection::vec(arb_op(), 0..20)) {
        let player = player_at(100, 200, 150);
        for op in &ops {
            apply(&player, op);
        }
        let before = player.snapshot();
        player.controls().go_to_slot(before.position().current_slot);
        prop_assert_eq!(player.snapshot(), before);
    }
}
