//! Wall-clock slot sources
//!
//! Staleness is measured against the slot implied by real time. The engine
//! does not own that clock; it asks a [`WallClock`] whenever it recomputes
//! the derived live/stale flags.

use chrono::{DateTime, TimeZone, Utc};

use crate::player::SLOT_DURATION_MS;

/// Ethereum mainnet beacon chain genesis (2020-12-01 12:00:23 UTC).
pub const MAINNET_GENESIS_UNIX_SECS: i64 = 1_606_824_023;

/// Reports the slot implied by the current real time.
pub trait WallClock {
    fn current_slot(&self) -> u64;
}

/// Derives the wall-clock slot from a chain genesis time.
#[derive(Debug, Clone, Copy)]
pub struct GenesisClock {
    genesis: DateTime<Utc>,
}

impl GenesisClock {
    pub fn new(genesis: DateTime<Utc>) -> Self {
        Self { genesis }
    }

    /// Build from a unix timestamp; out-of-range values fall back to mainnet.
    pub fn from_unix_secs(secs: i64) -> Self {
        let genesis = Utc
            .timestamp_opt(secs, 0)
            .single()
            .or_else(|| Utc.timestamp_opt(MAINNET_GENESIS_UNIX_SECS, 0).single())
            .unwrap_or_default();
        Self { genesis }
    }

    pub fn mainnet() -> Self {
        Self::from_unix_secs(MAINNET_GENESIS_UNIX_SECS)
    }

    /// Slot containing the instant `at`. Instants before genesis map to slot 0.
    pub fn slot_at(&self, at: DateTime<Utc>) -> u64 {
        let elapsed_ms = at.signed_duration_since(self.genesis).num_milliseconds();
        if elapsed_ms <= 0 {
            return 0;
        }
        elapsed_ms as u64 / SLOT_DURATION_MS as u64
    }

    /// Start instant of `slot`.
    pub fn slot_start(&self, slot: u64) -> DateTime<Utc> {
        let offset_ms = slot.saturating_mul(SLOT_DURATION_MS as u64);
        let offset = chrono::Duration::milliseconds(offset_ms.min(i64::MAX as u64) as i64);
        self.genesis
            .checked_add_signed(offset)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

impl Default for GenesisClock {
    fn default() -> Self {
        Self::mainnet()
    }
}

impl WallClock for GenesisClock {
    fn current_slot(&self) -> u64 {
        self.slot_at(Utc::now())
    }
}

/// A wall clock pinned to a caller-supplied slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixedWallClock(pub u64);

impl WallClock for FixedWallClock {
    fn current_slot(&self) -> u64 {
        self.0
    }
}
