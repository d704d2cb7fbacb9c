//! Background worker for bounds resolution
//!
//! Bounds fetches run on a dedicated thread so a slow source never stalls
//! the tick loop. Each request carries a generation number; the engine only
//! accepts the response whose generation matches the latest request, so a
//! fetch for a superseded stream set is silently discarded.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;

use super::{Bounds, BoundsError, BoundsSource, StreamId};

/// A pending fetch for one stream set.
struct BoundsRequest {
    generation: u64,
    streams: Vec<StreamId>,
}

/// Result of a background fetch.
#[derive(Debug)]
pub struct BoundsResponse {
    /// Generation of the request that produced this response
    pub generation: u64,
    /// The fetched bounds, or why they could not be fetched
    pub result: Result<Bounds, BoundsError>,
}

/// Worker loop that processes bounds requests.
///
/// Receives requests from `request_rx`, calls the source for each one,
/// and sends a `BoundsResponse` back via `result_tx`. Exits when the
/// request channel is closed (all senders dropped).
fn worker_loop(
    request_rx: Receiver<BoundsRequest>,
    result_tx: Sender<BoundsResponse>,
    source: Arc<dyn BoundsSource>,
) {
    while let Ok(request) = request_rx.recv() {
        let result = source.fetch_bounds(&request.streams);
        // Ignore send errors (engine may have been disposed)
        let _ = result_tx.send(BoundsResponse {
            generation: request.generation,
            result,
        });
    }
}

/// Handle to the background bounds thread.
///
/// Dropping the handle closes the request channel; the thread exits after
/// finishing any fetch in progress, and that fetch's result is discarded.
pub struct BoundsWorker {
    request_tx: Option<Sender<BoundsRequest>>,
    result_rx: Receiver<BoundsResponse>,
    generation: u64,
}

impl BoundsWorker {
    /// Spawn the worker thread for `source`.
    pub fn spawn(source: Arc<dyn BoundsSource>) -> Self {
        let (request_tx, request_rx) = mpsc::channel();
        let (result_tx, result_rx) = mpsc::channel();

        // Detached on purpose: a fetch stuck in the source must not block teardown.
        let spawned = thread::Builder::new()
            .name("slotplay-bounds".to_string())
            .spawn(move || worker_loop(request_rx, result_tx, source));

        let request_tx = match spawned {
            Ok(_) => Some(request_tx),
            Err(e) => {
                tracing::warn!(error = %e, "failed to spawn bounds worker");
                None
            }
        };

        Self {
            request_tx,
            result_rx,
            generation: 0,
        }
    }

    /// Queue a fetch for `streams` and return its generation.
    ///
    /// Any earlier request is superseded.
    pub fn request(&mut self, streams: Vec<StreamId>) -> Result<u64, BoundsError> {
        self.generation += 1;
        let generation = self.generation;
        let tx = self.request_tx.as_ref().ok_or(BoundsError::WorkerGone)?;
        tx.send(BoundsRequest {
            generation,
            streams,
        })
        .map_err(|_| BoundsError::WorkerGone)?;
        tracing::debug!(generation, "bounds fetch requested");
        Ok(generation)
    }

    /// Generation of the most recent request.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Take the newest finished response for the current generation.
    ///
    /// Never blocks. Responses for superseded generations are dropped.
    pub fn poll(&self) -> Option<BoundsResponse> {
        let mut latest = None;
        loop {
            match self.result_rx.try_recv() {
                Ok(response) if response.generation == self.generation => {
                    latest = Some(response);
                }
                Ok(response) => {
                    tracing::debug!(
                        generation = response.generation,
                        current = self.generation,
                        "discarding stale bounds response"
                    );
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        latest
    }

    /// Close the request channel so the thread winds down.
    pub fn shutdown(&mut self) {
        self.request_tx = None;
    }
}

impl std::fmt::Debug for BoundsWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundsWorker")
            .field("generation", &self.generation)
            .field("running", &self.request_tx.is_some())
            .finish()
    }
}
