//! Slot bounds for a set of data streams
//!
//! The playback engine never fetches analytical rows itself. It only needs to
//! know the `[min_slot, max_slot]` range for which data exists, which a
//! [`BoundsSource`] collaborator reports per stream. This module provides:
//!
//! - `Bounds`: the aggregated range, with the `min <= max` invariant enforced
//! - `StreamBounds`: one stream's range, deserializable from query rows
//! - `BoundsSource`: the collaborator contract
//! - `worker`: background fetching with stale-result suppression

mod error;
pub mod worker;

use serde::{Deserialize, Serialize};

pub use error::BoundsError;
pub use worker::{BoundsResponse, BoundsWorker};

/// Identifier of a logical data stream (e.g. `"beacon_api_eth_v1_events_block"`).
pub type StreamId = String;

/// The range of slots for which data currently exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    min_slot: u64,
    max_slot: u64,
}

impl Bounds {
    /// Create bounds, rejecting an inverted range.
    pub fn new(min_slot: u64, max_slot: u64) -> Result<Self, BoundsError> {
        if min_slot > max_slot {
            return Err(BoundsError::InvertedRange { min_slot, max_slot });
        }
        Ok(Self { min_slot, max_slot })
    }

    pub fn min_slot(&self) -> u64 {
        self.min_slot
    }

    pub fn max_slot(&self) -> u64 {
        self.max_slot
    }

    /// Clamp a slot into `[min_slot, max_slot]`.
    pub fn clamp(&self, slot: u64) -> u64 {
        slot.clamp(self.min_slot, self.max_slot)
    }

    /// The live edge: `max_slot - 2`, never below `min_slot`.
    pub fn live_edge(&self) -> u64 {
        self.max_slot
            .saturating_sub(crate::player::LIVE_THRESHOLD_SLOTS)
            .max(self.min_slot)
    }

    /// Aggregate per-stream ranges: earliest minimum and latest maximum.
    pub fn aggregate<'a, I>(streams: I) -> Result<Self, BoundsError>
    where
        I: IntoIterator<Item = &'a StreamBounds>,
    {
        let mut range: Option<(u64, u64)> = None;
        for stream in streams {
            let bounds = Bounds::new(stream.min_slot, stream.max_slot)?;
            range = Some(match range {
                None => (bounds.min_slot, bounds.max_slot),
                Some((min, max)) => (min.min(bounds.min_slot), max.max(bounds.max_slot)),
            });
        }
        let (min_slot, max_slot) = range.ok_or(BoundsError::NoStreams)?;
        Bounds::new(min_slot, max_slot)
    }

    /// Parse a JSON array of per-stream rows and aggregate them.
    ///
    /// Rows look like `{"stream": "...", "minSlot": 1, "maxSlot": 2}`, the shape
    /// returned by the analytical query client.
    pub fn from_json_rows(json: &str) -> Result<Self, BoundsError> {
        let rows: Vec<StreamBounds> = serde_json::from_str(json)?;
        Self::aggregate(&rows)
    }
}

/// Slot range of a single named stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamBounds {
    pub stream: StreamId,
    pub min_slot: u64,
    pub max_slot: u64,
}

/// A collaborator that reports slot bounds for a set of streams.
///
/// Implementations may be slow and may fail; they run on the
/// [`BoundsWorker`] thread, never on the tick loop. Retrying is the
/// implementation's responsibility.
pub trait BoundsSource: Send + Sync {
    /// Fetch the aggregated bounds for `streams`.
    fn fetch_bounds(&self, streams: &[StreamId]) -> Result<Bounds, BoundsError>;
}

impl<F> BoundsSource for F
where
    F: Fn(&[StreamId]) -> Result<Bounds, BoundsError> + Send + Sync,
{
    fn fetch_bounds(&self, streams: &[StreamId]) -> Result<Bounds, BoundsError> {
        self(streams)
    }
}
