//! The slot playback engine.
//!
//! `SlotPlayer` owns one state cell holding the playback state, the frame
//! ticker, the bounds worker, and the wall clock. Every transition (frame,
//! tick, bounds delivery, command) borrows the cell, runs to completion,
//! releases it, and only then notifies observers.
//!
//! The engine is single-threaded (`!Send`). Hosts with several threads
//! must drive it from the one thread that owns it.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::bounds::{Bounds, BoundsError, BoundsSource, BoundsWorker, StreamId};
use crate::clock::{GenesisClock, WallClock};
use crate::config::Config;
use crate::player::observe::{Observers, Subscription, Surfaces};
use crate::player::playback;
use crate::player::state::{
    ConfigState, MetaState, PauseReason, PlaybackEvent, PlaybackMode, PlaybackState, SlotState,
};
use crate::player::ticker::FrameTicker;

/// Options applied when an engine is created.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineOptions {
    pub speed: f64,
    pub mode: PlaybackMode,
    /// Start playing when bounds first resolve
    pub autoplay: bool,
    /// Starting slot; defaults to the live edge
    pub initial_slot: Option<u64>,
    /// Target ticker activations per second
    pub frame_rate: u32,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            speed: 1.0,
            mode: PlaybackMode::Continuous,
            autoplay: false,
            initial_slot: None,
            frame_rate: 60,
        }
    }
}

impl From<&Config> for EngineOptions {
    fn from(config: &Config) -> Self {
        Self {
            speed: config.playback.speed,
            mode: config.playback.mode,
            autoplay: config.playback.autoplay,
            initial_slot: config.playback.initial_slot,
            frame_rate: config.ticker.frame_rate,
        }
    }
}

/// Everything mutated by a transition.
struct Core {
    state: PlaybackState,
    ticker: FrameTicker,
    worker: Option<BoundsWorker>,
    streams: Vec<StreamId>,
    meta: MetaState,
    wall_clock: Box<dyn WallClock>,
    options: EngineOptions,
    disposed: bool,
}

impl Core {
    /// Hold the ticker exactly while playing.
    fn sync_ticker(&mut self, now: Instant) {
        if self.state.play_state().is_playing && !self.disposed {
            self.ticker.acquire(now);
        } else {
            self.ticker.release();
        }
    }

    fn apply_bounds_result(
        &mut self,
        result: Result<Bounds, BoundsError>,
        events: &mut Vec<PlaybackEvent>,
    ) {
        self.meta.is_loading = false;
        match result {
            Ok(bounds) => {
                self.meta.error = None;
                let initial_slot = self.options.initial_slot;
                let first = playback::apply_bounds(&mut self.state, bounds, initial_slot, events);
                if first && self.options.autoplay {
                    self.state.play(events);
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "bounds resolution failed");
                self.meta.error = Some(e.to_string());
            }
        }
    }

    fn poll_worker(&mut self, events: &mut Vec<PlaybackEvent>) {
        let response = match self.worker.as_ref() {
            Some(worker) if self.meta.is_loading => worker.poll(),
            _ => None,
        };
        if let Some(response) = response {
            self.apply_bounds_result(response.result, events);
        }
    }

    fn slot_state(&self) -> SlotState {
        self.state.slot_state(self.wall_clock.current_slot())
    }
}

struct Shared {
    core: RefCell<Core>,
    observers: Observers,
}

impl Shared {
    /// Run one transition and publish its results.
    fn transition(&self, now: Instant, f: impl FnOnce(&mut Core, &mut Vec<PlaybackEvent>)) {
        let events = {
            let Ok(mut core) = self.core.try_borrow_mut() else {
                tracing::warn!("transition requested while another is running; ignored");
                return;
            };
            if core.disposed {
                return;
            }
            let mut events = Vec::new();
            f(&mut *core, &mut events);
            core.sync_ticker(now);
            events
        };
        self.publish(&events);
    }

    /// Notify observers of `events`, then of every surface that changed.
    ///
    /// Surfaces are read when the delivery queue reaches them, after any
    /// command issued by an earlier callback has run.
    fn publish(&self, events: &[PlaybackEvent]) {
        self.observers.deliver(events, || {
            self.read(|core| Surfaces {
                progress_ms: core.state.position().progress_ms,
                slot: core.slot_state(),
                config: core.state.config_state(),
                meta: core.meta.clone(),
            })
        });
    }

    fn read<R>(&self, f: impl FnOnce(&Core) -> R) -> Option<R> {
        let core = self.core.try_borrow().ok()?;
        Some(f(&*core))
    }

    fn command(&self, f: impl FnOnce(&mut PlaybackState, &mut Vec<PlaybackEvent>)) {
        self.transition(Instant::now(), |core, events| f(&mut core.state, events));
    }
}

/// The slot playback engine.
///
/// Dropping the player disposes it.
pub struct SlotPlayer {
    shared: Rc<Shared>,
    controls: PlaybackControls,
}

impl SlotPlayer {
    /// Create an engine whose bounds are delivered by the host via
    /// [`SlotPlayer::apply_bounds`].
    pub fn new(options: EngineOptions, wall_clock: impl WallClock + 'static) -> Self {
        Self::build(options, Box::new(wall_clock), None)
    }

    /// Create an engine that resolves bounds from `source` on a background thread.
    pub fn with_source(
        options: EngineOptions,
        wall_clock: impl WallClock + 'static,
        source: Arc<dyn BoundsSource>,
    ) -> Self {
        Self::build(options, Box::new(wall_clock), Some(BoundsWorker::spawn(source)))
    }

    /// Create an engine from a loaded configuration and a bounds source.
    pub fn from_config(config: &Config, source: Arc<dyn BoundsSource>) -> Self {
        Self::with_source(
            EngineOptions::from(config),
            GenesisClock::from_unix_secs(config.clock.genesis_unix_secs),
            source,
        )
    }

    fn build(
        options: EngineOptions,
        wall_clock: Box<dyn WallClock>,
        worker: Option<BoundsWorker>,
    ) -> Self {
        let core = Core {
            state: PlaybackState::new(options.mode, options.speed),
            ticker: FrameTicker::new(options.frame_rate),
            worker,
            streams: Vec::new(),
            meta: MetaState::default(),
            wall_clock,
            options,
            disposed: false,
        };
        let shared = Rc::new(Shared {
            core: RefCell::new(core),
            observers: Observers::new(),
        });
        let controls = PlaybackControls {
            shared: Rc::downgrade(&shared),
        };
        Self { shared, controls }
    }

    /// The command surface. Clone it freely; clones stay valid for the
    /// lifetime of the engine and become no-ops afterwards.
    pub fn controls(&self) -> &PlaybackControls {
        &self.controls
    }

    /// Select the data streams whose bounds drive playback.
    ///
    /// With a bounds source this schedules a fetch; results for earlier
    /// stream sets are ignored. Without one the host must follow up with
    /// [`SlotPlayer::apply_bounds`].
    pub fn set_streams(&self, streams: Vec<StreamId>) {
        self.shared.transition(Instant::now(), |core, _| {
            if streams.is_empty() {
                core.meta.is_loading = false;
                core.meta.error = Some(BoundsError::NoStreams.to_string());
                core.streams = streams;
                return;
            }
            core.meta.is_loading = true;
            core.meta.error = None;
            if let Some(worker) = core.worker.as_mut() {
                if let Err(e) = worker.request(streams.clone()) {
                    tracing::warn!(error = %e, "could not schedule bounds fetch");
                    core.meta.is_loading = false;
                    core.meta.error = Some(e.to_string());
                }
            }
            core.streams = streams;
        });
    }

    /// Streams most recently passed to [`SlotPlayer::set_streams`].
    pub fn streams(&self) -> Vec<StreamId> {
        self.shared.core.borrow().streams.clone()
    }

    /// Deliver a bounds resolution directly.
    pub fn apply_bounds(&self, result: Result<Bounds, BoundsError>) {
        self.shared.transition(Instant::now(), |core, events| {
            core.apply_bounds_result(result, events);
        });
    }

    /// Animation-frame entry point.
    ///
    /// Picks up finished bounds fetches and, when playing and a frame is
    /// due, advances playback by the real time since the previous frame.
    ///
    /// Every call republishes the slot surface, so `is_stale` and
    /// `stale_behind_slots` follow the wall clock while paused as long as
    /// the host keeps calling it. [`run_until_idle`] stops pumping once the
    /// engine is paused; hosts that show staleness keep their own loop.
    ///
    /// [`run_until_idle`]: crate::player::driver::run_until_idle
    pub fn on_frame(&self, now: Instant) {
        self.shared.transition(now, |core, events| {
            core.poll_worker(events);
            if let Some(elapsed_ms) = core.ticker.activate(now) {
                playback::advance(&mut core.state, elapsed_ms, events);
            }
        });
    }

    /// Advance playback by exactly `elapsed_ms` of real time.
    pub fn tick(&self, elapsed_ms: f64) {
        self.shared.transition(Instant::now(), |core, events| {
            playback::advance(&mut core.state, elapsed_ms, events);
        });
    }

    /// Replace the wall clock used for staleness.
    pub fn set_wall_clock(&self, wall_clock: impl WallClock + 'static) {
        self.shared.transition(Instant::now(), |core, _| {
            core.wall_clock = Box::new(wall_clock);
        });
    }

    /// Tear the engine down.
    ///
    /// Releases the ticker, abandons any in-flight bounds fetch, and turns
    /// every later command and frame into a no-op.
    pub fn dispose(&self) {
        let Ok(mut core) = self.shared.core.try_borrow_mut() else {
            return;
        };
        if core.disposed {
            return;
        }
        core.disposed = true;
        core.ticker.release();
        if let Some(mut worker) = core.worker.take() {
            worker.shutdown();
        }
        tracing::debug!("slot player disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.shared.core.borrow().disposed
    }

    /// Whether the frame ticker is currently held.
    pub fn is_ticking(&self) -> bool {
        self.shared.core.borrow().ticker.is_active()
    }

    pub fn frame_interval(&self) -> Duration {
        self.shared.core.borrow().ticker.frame_interval()
    }

    // === Observation surfaces ===

    /// Current progress within the slot in milliseconds.
    pub fn progress_ms(&self) -> f64 {
        self.shared.core.borrow().state.position().progress_ms
    }

    pub fn slot_state(&self) -> SlotState {
        self.shared.core.borrow().slot_state()
    }

    pub fn config_state(&self) -> ConfigState {
        self.shared.core.borrow().state.config_state()
    }

    pub fn meta(&self) -> MetaState {
        self.shared.core.borrow().meta.clone()
    }

    /// A copy of the full playback state.
    pub fn snapshot(&self) -> PlaybackState {
        self.shared.core.borrow().state.clone()
    }

    pub fn subscribe_progress(&self, callback: impl FnMut(f64) + 'static) -> Subscription {
        self.shared.observers.subscribe_progress(callback)
    }

    pub fn subscribe_slot_state(&self, callback: impl FnMut(&SlotState) + 'static) -> Subscription {
        self.shared.observers.subscribe_slot_state(callback)
    }

    pub fn subscribe_config(&self, callback: impl FnMut(&ConfigState) + 'static) -> Subscription {
        self.shared.observers.subscribe_config(callback)
    }

    pub fn subscribe_meta(&self, callback: impl FnMut(&MetaState) + 'static) -> Subscription {
        self.shared.observers.subscribe_meta(callback)
    }

    /// Called once for every distinct slot reached, in order.
    pub fn on_slot_change(&self, callback: impl FnMut(u64) + 'static) -> Subscription {
        self.shared.observers.on_slot_change(callback)
    }

    /// Called on every play/pause transition, including boundary pauses.
    pub fn on_play_state_change(
        &self,
        callback: impl FnMut(bool, Option<PauseReason>) + 'static,
    ) -> Subscription {
        self.shared.observers.on_play_state_change(callback)
    }

    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        self.shared.observers.unsubscribe(subscription)
    }
}

impl Drop for SlotPlayer {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for SlotPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.shared.core.try_borrow() {
            Ok(core) => f
                .debug_struct("SlotPlayer")
                .field("state", &core.state)
                .field("meta", &core.meta)
                .field("disposed", &core.disposed)
                .finish(),
            Err(_) => f.debug_struct("SlotPlayer").finish_non_exhaustive(),
        }
    }
}

/// The command API.
///
/// Bound once to its engine; the same handle works across every state
/// change, so it can be handed to UI callbacks without re-binding. All
/// arguments are clamped, never rejected.
#[derive(Clone)]
pub struct PlaybackControls {
    shared: Weak<Shared>,
}

impl PlaybackControls {
    fn command(&self, f: impl FnOnce(&mut PlaybackState, &mut Vec<PlaybackEvent>)) {
        if let Some(shared) = self.shared.upgrade() {
            shared.command(f);
        }
    }

    pub fn play(&self) {
        self.command(|state, events| state.play(events));
    }

    pub fn pause(&self) {
        self.command(|state, events| state.pause(events));
    }

    pub fn toggle(&self) {
        self.command(|state, events| state.toggle(events));
    }

    pub fn set_mode(&self, mode: PlaybackMode) {
        self.command(|state, _| state.set_mode(mode));
    }

    pub fn go_to_slot(&self, slot: u64) {
        self.command(|state, events| playback::go_to_slot(state, slot, events));
    }

    pub fn next_slot(&self) {
        self.command(playback::next_slot);
    }

    pub fn previous_slot(&self) {
        self.command(playback::previous_slot);
    }

    pub fn rewind(&self) {
        self.command(|state, _| playback::rewind(state));
    }

    pub fn fast_forward(&self) {
        self.command(|state, _| playback::fast_forward(state));
    }

    pub fn seek_to_time(&self, ms: f64) {
        self.command(|state, _| playback::seek_to_time(state, ms));
    }

    pub fn set_playback_speed(&self, speed: f64) {
        self.command(|state, _| state.set_speed(speed));
    }

    pub fn jump_to_live(&self) {
        self.command(playback::jump_to_live);
    }
}

impl std::fmt::Debug for PlaybackControls {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackControls")
            .field("attached", &(self.shared.strong_count() > 0))
            .finish()
    }
}
