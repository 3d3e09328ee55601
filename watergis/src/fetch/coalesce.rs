//! Request coalescing for tile fetches.
//!
//! When several parts of the view request the same tile at once (overlap
//! between pan events, duplicate entries across grids), only one fetch
//! runs against the provider; the other requesters subscribe to that
//! fetch's result. This enforces at most one outstanding fetch per
//! [`TileCoord`] and, together with the cache insert happening inside the
//! owning fetch, single-writer-per-key discipline.
//!
//! The in-flight map is guarded by a synchronous mutex; the critical
//! sections never await, and the synchronous unlock lets an abandoned
//! fetch clean up from a `Drop` impl.

use crate::coord::TileCoord;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::debug;

/// The outcome of one tile request.
#[derive(Debug, Clone)]
pub struct TileResponse {
    /// Encoded image bytes, validated decodable at the expected size.
    pub data: Arc<Vec<u8>>,
    /// Whether the bytes came from the cache.
    pub cache_hit: bool,
    /// Whether a placeholder was substituted for a failed fetch.
    pub placeholder: bool,
    /// Time from request to completion.
    pub duration: Duration,
}

/// Statistics for monitoring coalescing effectiveness.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoalescerStats {
    /// Total requests received.
    pub total_requests: u64,
    /// Requests that waited on an existing fetch.
    pub coalesced_requests: u64,
    /// Requests that triggered a new fetch.
    pub new_requests: u64,
}

impl CoalescerStats {
    /// Fraction of requests served by piggybacking on another fetch.
    pub fn coalescing_ratio(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.coalesced_requests as f64 / self.total_requests as f64
        }
    }
}

/// Result of attempting to register a request.
pub enum CoalesceResult {
    /// First request for the tile; the caller must fetch and then call
    /// [`RequestCoalescer::complete`] (or [`RequestCoalescer::abandon`]).
    NewRequest,
    /// Another fetch is in flight; wait on this receiver for its result.
    Coalesced(broadcast::Receiver<TileResponse>),
}

impl CoalesceResult {
    /// Whether this registration owns the fetch.
    pub fn is_new_request(&self) -> bool {
        matches!(self, Self::NewRequest)
    }
}

/// Tracks in-flight fetches so duplicate requests share one download.
pub struct RequestCoalescer {
    /// In-flight fetches: tile -> broadcast sender for the result.
    in_flight: Mutex<HashMap<TileCoord, broadcast::Sender<TileResponse>>>,
    stats: Mutex<CoalescerStats>,
}

impl RequestCoalescer {
    pub fn new() -> Self {
        Self {
            in_flight: Mutex::new(HashMap::new()),
            stats: Mutex::new(CoalescerStats::default()),
        }
    }

    /// Registers a request for the given tile.
    pub fn register(&self, tile: TileCoord) -> CoalesceResult {
        let mut in_flight = self.in_flight.lock();
        let mut stats = self.stats.lock();

        stats.total_requests += 1;

        if let Some(tx) = in_flight.get(&tile) {
            stats.coalesced_requests += 1;
            debug!(tile = %tile, "coalescing request onto in-flight fetch");
            CoalesceResult::Coalesced(tx.subscribe())
        } else {
            // Capacity 16: a handful of waiters is the typical worst case
            let (tx, _rx) = broadcast::channel(16);
            in_flight.insert(tile, tx);
            stats.new_requests += 1;
            CoalesceResult::NewRequest
        }
    }

    /// Completes a fetch, broadcasting the result to all waiters.
    pub fn complete(&self, tile: TileCoord, response: TileResponse) {
        let tx = self.in_flight.lock().remove(&tile);
        if let Some(tx) = tx {
            let waiters = tx.receiver_count();
            // Send errors just mean every waiter already went away
            let _ = tx.send(response);
            if waiters > 0 {
                debug!(tile = %tile, waiters = waiters, "broadcast fetch result to waiters");
            }
        }
    }

    /// Abandons a fetch without a result, e.g. when the owning task was
    /// cancelled mid-download.
    ///
    /// Waiters observe the closed channel and fall back on their own;
    /// the next request for the tile starts a fresh fetch.
    pub fn abandon(&self, tile: TileCoord) {
        if self.in_flight.lock().remove(&tile).is_some() {
            debug!(tile = %tile, "abandoned in-flight fetch");
        }
    }

    /// Number of currently in-flight fetches.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.lock().len()
    }

    /// Snapshot of the current statistics.
    pub fn stats(&self) -> CoalescerStats {
        *self.stats.lock()
    }
}

impl Default for RequestCoalescer {
    fn default() -> Self {
        Self::new()
    }
}
