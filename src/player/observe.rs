//! Observation surfaces.
//!
//! Each surface is its own topic with its own subscriber list, so a
//! progress tick only wakes progress subscribers. State topics publish
//! only when their snapshot actually changed; event topics fire on every
//! emission.
//!
//! Subscribers run on the engine's thread after the transition that
//! produced the value has completed, so they may issue commands. Delivery
//! is serialized through one queue: a command issued from a callback
//! queues its notifications behind the ones still pending, and they are
//! delivered, to every subscriber including the one that issued it, once
//! that callback returns. Surface snapshots are read when their turn in
//! the queue comes, so the last value a state subscriber sees is always
//! the engine's current one.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use crate::player::state::{ConfigState, MetaState, PauseReason, PlaybackEvent, SlotState};

/// Handle returned by every subscribe call, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

type Callback<T> = Rc<RefCell<dyn FnMut(&T)>>;

/// One publish/subscribe channel.
pub(crate) struct Topic<T> {
    last: RefCell<Option<T>>,
    subscribers: RefCell<Vec<(u64, Callback<T>)>>,
}

impl<T: Clone + PartialEq> Topic<T> {
    fn new() -> Self {
        Self {
            last: RefCell::new(None),
            subscribers: RefCell::new(Vec::new()),
        }
    }

    fn subscribe(&self, id: u64, callback: Callback<T>) {
        self.subscribers.borrow_mut().push((id, callback));
    }

    fn unsubscribe(&self, id: u64) -> bool {
        let mut subscribers = self.subscribers.borrow_mut();
        let before = subscribers.len();
        subscribers.retain(|(sub_id, _)| *sub_id != id);
        subscribers.len() != before
    }

    /// Publish `value` if it differs from the last published value.
    fn publish(&self, value: T) {
        {
            let mut last = self.last.borrow_mut();
            if last.as_ref() == Some(&value) {
                return;
            }
            *last = Some(value.clone());
        }
        self.emit(&value);
    }

    /// Notify every subscriber unconditionally.
    fn emit(&self, value: &T) {
        // Snapshot the list so callbacks may subscribe or unsubscribe
        let callbacks: Vec<Callback<T>> = self
            .subscribers
            .borrow()
            .iter()
            .map(|(_, callback)| Rc::clone(callback))
            .collect();
        for callback in callbacks {
            // A running callback is never re-entered
            if let Ok(mut callback) = callback.try_borrow_mut() {
                (*callback)(value);
            }
        }
    }
}

/// A play/pause transition as delivered to `on_play_state_change`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PlayStateChange {
    pub is_playing: bool,
    pub pause_reason: Option<PauseReason>,
}

/// Values of every state surface at one instant.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Surfaces {
    pub progress_ms: f64,
    pub slot: SlotState,
    pub config: ConfigState,
    pub meta: MetaState,
}

/// One queued delivery.
#[derive(Debug, Clone, Copy)]
enum Notice {
    Event(PlaybackEvent),
    /// Read and publish every state surface
    Surfaces,
}

/// Clears the delivering flag even if a callback panics.
struct DeliveryGuard<'a>(&'a Cell<bool>);

impl Drop for DeliveryGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// All observation surfaces of one engine.
pub(crate) struct Observers {
    next_id: Cell<u64>,
    pending: RefCell<VecDeque<Notice>>,
    delivering: Cell<bool>,
    progress: Topic<f64>,
    slot: Topic<SlotState>,
    config: Topic<ConfigState>,
    meta: Topic<MetaState>,
    slot_changes: Topic<u64>,
    play_state_changes: Topic<PlayStateChange>,
}

impl Observers {
    pub fn new() -> Self {
        Self {
            next_id: Cell::new(0),
            pending: RefCell::new(VecDeque::new()),
            delivering: Cell::new(false),
            progress: Topic::new(),
            slot: Topic::new(),
            config: Topic::new(),
            meta: Topic::new(),
            slot_changes: Topic::new(),
            play_state_changes: Topic::new(),
        }
    }

    fn next_id(&self) -> u64 {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        id
    }

    pub fn subscribe_progress(&self, mut callback: impl FnMut(f64) + 'static) -> Subscription {
        let id = self.next_id();
        self.progress
            .subscribe(id, Rc::new(RefCell::new(move |ms: &f64| callback(*ms))));
        Subscription(id)
    }

    pub fn subscribe_slot_state(
        &self,
        callback: impl FnMut(&SlotState) + 'static,
    ) -> Subscription {
        let id = self.next_id();
        self.slot.subscribe(id, Rc::new(RefCell::new(callback)));
        Subscription(id)
    }

    pub fn subscribe_config(&self, callback: impl FnMut(&ConfigState) + 'static) -> Subscription {
        let id = self.next_id();
        self.config.subscribe(id, Rc::new(RefCell::new(callback)));
        Subscription(id)
    }

    pub fn subscribe_meta(&self, callback: impl FnMut(&MetaState) + 'static) -> Subscription {
        let id = self.next_id();
        self.meta.subscribe(id, Rc::new(RefCell::new(callback)));
        Subscription(id)
    }

    pub fn on_slot_change(&self, mut callback: impl FnMut(u64) + 'static) -> Subscription {
        let id = self.next_id();
        self.slot_changes
            .subscribe(id, Rc::new(RefCell::new(move |slot: &u64| callback(*slot))));
        Subscription(id)
    }

    pub fn on_play_state_change(
        &self,
        mut callback: impl FnMut(bool, Option<PauseReason>) + 'static,
    ) -> Subscription {
        let id = self.next_id();
        self.play_state_changes.subscribe(
            id,
            Rc::new(RefCell::new(move |change: &PlayStateChange| {
                callback(change.is_playing, change.pause_reason)
            })),
        );
        Subscription(id)
    }

    /// Remove a subscription from whichever topic holds it.
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        let id = subscription.0;
        self.progress.unsubscribe(id)
            || self.slot.unsubscribe(id)
            || self.config.unsubscribe(id)
            || self.meta.unsubscribe(id)
            || self.slot_changes.unsubscribe(id)
            || self.play_state_changes.unsubscribe(id)
    }

    /// Queue one transition's events followed by a surface refresh, then
    /// deliver everything queued unless a delivery is already running
    /// further up the stack.
    ///
    /// `read` supplies the current surfaces; it returns `None` when the
    /// engine state is unavailable.
    pub fn deliver(&self, events: &[PlaybackEvent], read: impl Fn() -> Option<Surfaces>) {
        {
            let mut pending = self.pending.borrow_mut();
            pending.extend(events.iter().copied().map(Notice::Event));
            pending.push_back(Notice::Surfaces);
        }
        if self.delivering.replace(true) {
            return;
        }
        let _guard = DeliveryGuard(&self.delivering);
        loop {
            let next = self.pending.borrow_mut().pop_front();
            match next {
                Some(Notice::Event(event)) => self.emit_event(event),
                Some(Notice::Surfaces) => {
                    if let Some(surfaces) = read() {
                        self.publish_surfaces(surfaces);
                    }
                }
                None => break,
            }
        }
    }

    fn emit_event(&self, event: PlaybackEvent) {
        match event {
            PlaybackEvent::SlotChanged(slot) => self.slot_changes.emit(&slot),
            PlaybackEvent::PlayStateChanged {
                is_playing,
                pause_reason,
            } => self.play_state_changes.emit(&PlayStateChange {
                is_playing,
                pause_reason,
            }),
        }
    }

    fn publish_surfaces(&self, surfaces: Surfaces) {
        self.progress.publish(surfaces.progress_ms);
        self.slot.publish(surfaces.slot);
        self.config.publish(surfaces.config);
        self.meta.publish(surfaces.meta);
    }
}

impl std::fmt::Debug for Observers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers")
            .field("next_id", &self.next_id.get())
            .finish_non_exhaustive()
    }
}
