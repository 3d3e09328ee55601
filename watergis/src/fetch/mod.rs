//! Tile retrieval: cache-backed, coalesced, bounded, cancellable
//!
//! The prototypes this engine replaces each carried their own copy of the
//! fetch-and-cache loop. Here that logic lives once, in [`TileService`]:
//!
//! ```text
//! get_tile ──► cache ──hit──► bytes
//!                │miss
//!                ▼
//!          RequestCoalescer ──in flight──► wait for broadcast
//!                │owner
//!                ▼
//!          FetchLimiter permit ──► provider fetch ──► validate ──► cache
//!                                        │failure
//!                                        ▼
//!                                  placeholder tile
//! ```
//!
//! Every failure path ends in a placeholder of the expected tile size;
//! callers of the service never see an error.

mod coalesce;
mod limiter;
mod placeholder;
mod service;

pub use coalesce::{CoalesceResult, CoalescerStats, RequestCoalescer, TileResponse};
pub use limiter::{default_concurrency, FetchLimiter, FetchPermit};
pub use placeholder::{
    default_placeholder, generate_placeholder, placeholder_for_size, validate_tile_or_placeholder,
};
pub use service::{FetchConfig, TileService};
