//! Tile fetch service.
//!
//! `TileService` is the single tile-retrieval abstraction the rest of the
//! system uses: one cache, one provider behind the [`TileProvider`] seam,
//! request coalescing, bounded download concurrency, and placeholder
//! substitution for every failure mode. Callers never see a fetch error;
//! they always receive image bytes of the expected tile size.

use crate::cache::TileCache;
use crate::coord::TileCoord;
use crate::fetch::coalesce::{CoalesceResult, CoalescerStats, RequestCoalescer, TileResponse};
use crate::fetch::limiter::{default_concurrency, FetchLimiter};
use crate::fetch::placeholder::{placeholder_for_size, validate_tile_or_placeholder};
use crate::provider::TileProvider;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Tunables for the fetch service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchConfig {
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Retries after a failed download (0 = single attempt).
    pub max_retries: u32,
    /// Maximum concurrent downloads.
    pub max_concurrent: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            max_retries: 2,
            max_concurrent: default_concurrency(),
        }
    }
}

/// Removes the coalescer entry if the owning fetch never completed, so a
/// cancelled download does not wedge its tile.
struct AbandonGuard<'a> {
    coalescer: &'a RequestCoalescer,
    tile: TileCoord,
    armed: bool,
}

impl Drop for AbandonGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.coalescer.abandon(self.tile);
        }
    }
}

/// Tile retrieval service combining cache, coalescing, and bounded
/// concurrent downloads over a pluggable provider.
pub struct TileService<P: TileProvider> {
    provider: P,
    cache: Arc<TileCache>,
    coalescer: RequestCoalescer,
    limiter: FetchLimiter,
    config: FetchConfig,
    /// Cancellation token for the current view generation.
    current_view: Mutex<CancellationToken>,
}

impl<P: TileProvider> TileService<P> {
    pub fn new(provider: P, cache: Arc<TileCache>, config: FetchConfig) -> Self {
        Self {
            provider,
            cache,
            coalescer: RequestCoalescer::new(),
            limiter: FetchLimiter::new(config.max_concurrent.max(1)),
            config,
            current_view: Mutex::new(CancellationToken::new()),
        }
    }

    /// The provider backing this service.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// The shared tile cache.
    pub fn cache(&self) -> &Arc<TileCache> {
        &self.cache
    }

    /// Coalescing statistics for diagnostics.
    pub fn coalescer_stats(&self) -> CoalescerStats {
        self.coalescer.stats()
    }

    /// Starts a new view generation, cancelling the previous one.
    ///
    /// Call on every pan/zoom/resize that changes the needed tile set;
    /// in-flight fetches belonging to the superseded generation stop, and
    /// the returned token scopes the next [`fetch_grid`](Self::fetch_grid).
    pub fn retarget(&self) -> CancellationToken {
        let fresh = CancellationToken::new();
        let previous = {
            let mut slot = self.current_view.lock();
            std::mem::replace(&mut *slot, fresh.clone())
        };
        previous.cancel();
        debug!("view retargeted, previous generation cancelled");
        fresh
    }

    /// The cancellation token of the current view generation.
    pub fn current_view_token(&self) -> CancellationToken {
        self.current_view.lock().clone()
    }

    /// Retrieves one tile: cache hit, coalesced wait, or a new download.
    ///
    /// Infallible by design: any failure (out-of-range tile, HTTP error,
    /// timeout, undecodable body) yields a placeholder of the provider's
    /// tile size, logged but never surfaced as an error.
    pub async fn get_tile(&self, tile: TileCoord) -> TileResponse {
        let started = Instant::now();
        let size = self.provider.tile_size();

        if !tile.is_in_range() {
            warn!(tile = %tile, "tile outside grid requested, substituting placeholder");
            return placeholder_response(size, started);
        }

        if let Some(data) = self.cache.get(&tile).await {
            return TileResponse {
                data,
                cache_hit: true,
                placeholder: false,
                duration: started.elapsed(),
            };
        }

        match self.coalescer.register(tile) {
            CoalesceResult::Coalesced(mut rx) => match rx.recv().await {
                Ok(mut response) => {
                    response.duration = started.elapsed();
                    response
                }
                Err(_) => {
                    // The owning fetch was cancelled mid-flight; this
                    // request's view generation may be gone too, so fall
                    // back rather than restarting the download.
                    debug!(tile = %tile, "in-flight fetch abandoned, substituting placeholder");
                    placeholder_response(size, started)
                }
            },
            CoalesceResult::NewRequest => {
                let mut guard = AbandonGuard {
                    coalescer: &self.coalescer,
                    tile,
                    armed: true,
                };

                let response = self.download_validated(tile, started).await;

                // Single-writer-per-key: only the owning fetch inserts,
                // and only real imagery is cached so a transient failure
                // can succeed on a later request.
                if !response.placeholder {
                    self.cache.insert(tile, Arc::clone(&response.data)).await;
                }

                guard.armed = false;
                self.coalescer.complete(tile, response.clone());
                response
            }
        }
    }

    /// Resolves a whole tile set with bounded parallelism.
    ///
    /// Tiles whose fetches are cancelled via `token` are simply absent
    /// from the result map. Failed fetches are present, carrying
    /// placeholder bytes.
    pub async fn fetch_grid(
        &self,
        tiles: Vec<TileCoord>,
        token: &CancellationToken,
    ) -> HashMap<TileCoord, TileResponse> {
        use futures::stream::{self, StreamExt};

        let results: Vec<Option<(TileCoord, TileResponse)>> = stream::iter(tiles)
            .map(|tile| {
                let token = token.clone();
                async move {
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => None,
                        response = self.get_tile(tile) => Some((tile, response)),
                    }
                }
            })
            .buffer_unordered(self.config.max_concurrent.max(1))
            .collect()
            .await;

        results.into_iter().flatten().collect()
    }

    /// Downloads one tile with permit, timeout, and retries, validating
    /// the body. Any failure yields a placeholder response.
    async fn download_validated(&self, tile: TileCoord, started: Instant) -> TileResponse {
        let size = self.provider.tile_size();
        let _permit = self.limiter.acquire().await;

        for attempt in 0..=self.config.max_retries {
            match tokio::time::timeout(
                self.config.request_timeout,
                self.provider.fetch_tile(&tile),
            )
            .await
            {
                Ok(Ok(bytes)) => {
                    let (data, substituted) =
                        validate_tile_or_placeholder(bytes, size, self.provider.name());
                    return TileResponse {
                        data: Arc::new(data),
                        cache_hit: false,
                        placeholder: substituted,
                        duration: started.elapsed(),
                    };
                }
                Ok(Err(e)) => {
                    warn!(
                        tile = %tile,
                        provider = self.provider.name(),
                        attempt = attempt,
                        error = %e,
                        "tile fetch failed"
                    );
                }
                Err(_) => {
                    warn!(
                        tile = %tile,
                        provider = self.provider.name(),
                        attempt = attempt,
                        timeout = ?self.config.request_timeout,
                        "tile fetch timed out"
                    );
                }
            }
        }

        warn!(tile = %tile, "all fetch attempts failed, substituting placeholder");
        placeholder_response(size, started)
    }
}

fn placeholder_response(size: u32, started: Instant) -> TileResponse {
    TileResponse {
        data: Arc::new(placeholder_for_size(size)),
        cache_hit: false,
        placeholder: true,
        duration: started.elapsed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Test-double provider with a canned response and call counting.
    struct MockProvider {
        response: Result<Vec<u8>, ProviderError>,
        delay: Option<Duration>,
        calls: AtomicUsize,
    }

    impl MockProvider {
        fn ok(bytes: Vec<u8>) -> Self {
            Self {
                response: Ok(bytes),
                delay: None,
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                response: Err(ProviderError::HttpError(
                    "HTTP 404 Not Found from https://tiles.test/10/385/194".to_string(),
                )),
                delay: None,
                calls: AtomicUsize::new(0),
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl TileProvider for MockProvider {
        async fn fetch_tile(&self, _tile: &TileCoord) -> Result<Vec<u8>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.response.clone()
        }

        fn name(&self) -> &str {
            "Mock"
        }

        fn min_zoom(&self) -> u8 {
            0
        }

        fn max_zoom(&self) -> u8 {
            19
        }
    }

    /// A valid 256x256 PNG distinguishable from the yellow placeholder.
    fn blue_tile() -> Vec<u8> {
        let image =
            image::RgbaImage::from_pixel(256, 256, image::Rgba([0, 0, 255, 255]));
        let mut buffer = Vec::new();
        image
            .write_to(&mut std::io::Cursor::new(&mut buffer), image::ImageFormat::Png)
            .unwrap();
        buffer
    }

    fn quick_config() -> FetchConfig {
        FetchConfig {
            request_timeout: Duration::from_secs(5),
            max_retries: 2,
            max_concurrent: 4,
        }
    }

    fn service(provider: MockProvider) -> TileService<MockProvider> {
        TileService::new(provider, Arc::new(TileCache::new()), quick_config())
    }

    fn tile(x: u32, y: u32) -> TileCoord {
        TileCoord::new(x, y, 10)
    }

    #[tokio::test]
    async fn test_fetch_then_cache_hit() {
        let service = service(MockProvider::ok(blue_tile()));
        let coord = tile(194, 385);

        let first = service.get_tile(coord).await;
        assert!(!first.cache_hit);
        assert!(!first.placeholder);

        let second = service.get_tile(coord).await;
        assert!(second.cache_hit);
        assert_eq!(second.data, first.data);
        assert_eq!(service.provider().calls(), 1);
    }

    #[tokio::test]
    async fn test_http_failure_yields_placeholder() {
        let service = service(MockProvider::failing());

        let response = service.get_tile(tile(194, 385)).await;
        assert!(response.placeholder);
        assert!(!response.cache_hit);

        // The placeholder decodes at the provider's tile size
        let decoded = image::load_from_memory(&response.data).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (256, 256));

        // One initial attempt plus max_retries
        assert_eq!(service.provider().calls(), 3);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let service = service(MockProvider::failing());
        let coord = tile(194, 385);

        let _ = service.get_tile(coord).await;
        assert_eq!(service.cache().entry_count(), 0);

        // A later request tries the provider again
        let _ = service.get_tile(coord).await;
        assert_eq!(service.provider().calls(), 6);
    }

    #[tokio::test]
    async fn test_undecodable_body_yields_placeholder() {
        let service = service(MockProvider::ok(vec![0xAB; 100]));

        let response = service.get_tile(tile(194, 385)).await;
        assert!(response.placeholder);
        assert_eq!(service.cache().entry_count(), 0);
    }

    #[tokio::test]
    async fn test_out_of_range_tile_never_fetched() {
        let service = service(MockProvider::ok(blue_tile()));

        let response = service.get_tile(TileCoord::new(5000, 0, 10)).await;
        assert!(response.placeholder);
        assert_eq!(service.provider().calls(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_requests_coalesce_to_one_download() {
        let service = service(
            MockProvider::ok(blue_tile()).with_delay(Duration::from_millis(20)),
        );
        let coord = tile(194, 385);

        let (a, b, c) = tokio::join!(
            service.get_tile(coord),
            service.get_tile(coord),
            service.get_tile(coord)
        );

        assert_eq!(service.provider().calls(), 1);
        assert_eq!(a.data, b.data);
        assert_eq!(b.data, c.data);
        assert_eq!(service.cache().entry_count(), 1);

        let stats = service.coalescer_stats();
        assert_eq!(stats.new_requests, 1);
        assert_eq!(stats.coalesced_requests, 2);
    }

    #[tokio::test]
    async fn test_fetch_grid_resolves_all_tiles() {
        let service = service(MockProvider::ok(blue_tile()));
        let tiles: Vec<TileCoord> = (0..12).map(|x| tile(x, 0)).collect();

        let token = service.current_view_token();
        let results = service.fetch_grid(tiles.clone(), &token).await;

        assert_eq!(results.len(), 12);
        for coord in &tiles {
            assert!(!results[coord].placeholder);
        }
    }

    #[tokio::test]
    async fn test_fetch_grid_with_cancelled_token_fetches_nothing() {
        let service = service(MockProvider::ok(blue_tile()));
        let tiles: Vec<TileCoord> = (0..12).map(|x| tile(x, 0)).collect();

        let token = CancellationToken::new();
        token.cancel();

        let results = service.fetch_grid(tiles, &token).await;
        assert!(results.is_empty());
        assert_eq!(service.provider().calls(), 0);
    }

    #[tokio::test]
    async fn test_retarget_cancels_in_flight_generation() {
        let service = service(
            MockProvider::ok(blue_tile()).with_delay(Duration::from_millis(500)),
        );
        let tiles: Vec<TileCoord> = (0..6).map(|x| tile(x, 0)).collect();

        let token = service.retarget();
        let (results, _) = tokio::join!(service.fetch_grid(tiles, &token), async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            service.retarget();
        });

        // Every fetch was still sleeping when the view changed
        assert!(results.is_empty());
        // Abandoned downloads left no stale in-flight entries behind
        let coord = tile(0, 0);
        let response = service.get_tile(coord).await;
        assert!(!response.placeholder);
    }

    #[tokio::test]
    async fn test_fetch_grid_mixed_with_cache() {
        let service = service(MockProvider::ok(blue_tile()));
        let coord = tile(3, 0);

        let _ = service.get_tile(coord).await;

        let tiles: Vec<TileCoord> = (0..6).map(|x| tile(x, 0)).collect();
        let token = service.current_view_token();
        let results = service.fetch_grid(tiles, &token).await;

        assert_eq!(results.len(), 6);
        assert!(results[&coord].cache_hit);
    }
}
