//! OpenStreetMap standard tile layer provider.
//!
//! Street-map raster tiles from the OSM standard layer, useful as a
//! non-imagery base layer for network overlays.
//!
//! # URL Pattern
//!
//! `https://tile.openstreetmap.org/{z}/{x}/{y}.png`
//!
//! # Usage Policy
//!
//! The public OSM tile servers are run on donated resources. Heavy or
//! bulk use is not acceptable; requests must carry an identifying
//! User-Agent (the HTTP client sets one). See
//! <https://operations.osmfoundation.org/policies/tiles/>

use super::http::AsyncHttpClient;
use super::types::{ProviderError, TileProvider};
use crate::coord::TileCoord;

/// Base URL for OpenStreetMap standard layer tiles.
const OSM_BASE_URL: &str = "https://tile.openstreetmap.org";

/// Minimum zoom level supported by the standard layer.
const MIN_ZOOM: u8 = 0;

/// Maximum zoom level supported by the standard layer.
const MAX_ZOOM: u8 = 19;

/// OpenStreetMap standard layer tile provider.
pub struct OsmProvider<C: AsyncHttpClient> {
    http_client: C,
}

impl<C: AsyncHttpClient> OsmProvider<C> {
    /// Creates a new OpenStreetMap provider.
    pub fn new(http_client: C) -> Self {
        Self { http_client }
    }

    /// Builds the tile URL: `{base}/{z}/{x}/{y}.png`.
    fn build_url(&self, tile: &TileCoord) -> String {
        format!("{}/{}/{}/{}.png", OSM_BASE_URL, tile.zoom, tile.x, tile.y)
    }
}

impl<C: AsyncHttpClient> TileProvider for OsmProvider<C> {
    async fn fetch_tile(&self, tile: &TileCoord) -> Result<Vec<u8>, ProviderError> {
        if !self.supports_zoom(tile.zoom) {
            return Err(ProviderError::UnsupportedZoom(tile.zoom));
        }
        if !tile.is_in_range() {
            return Err(ProviderError::UnsupportedCoordinates {
                x: tile.x,
                y: tile.y,
                zoom: tile.zoom,
            });
        }

        let url = self.build_url(tile);
        self.http_client.get(&url).await
    }

    fn name(&self) -> &str {
        "OpenStreetMap"
    }

    fn min_zoom(&self) -> u8 {
        MIN_ZOOM
    }

    fn max_zoom(&self) -> u8 {
        MAX_ZOOM
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::http::tests::MockHttpClient;

    #[test]
    fn test_provider_name_and_zoom_range() {
        let provider = OsmProvider::new(MockHttpClient { response: Ok(vec![0]) });
        assert_eq!(provider.name(), "OpenStreetMap");
        assert_eq!(provider.min_zoom(), 0);
        assert_eq!(provider.max_zoom(), 19);
    }

    #[test]
    fn test_url_construction() {
        let provider = OsmProvider::new(MockHttpClient { response: Ok(vec![0]) });
        // Note x before y, unlike the ArcGIS-style services
        let url = provider.build_url(&TileCoord::new(194, 385, 10));
        assert_eq!(url, "https://tile.openstreetmap.org/10/194/385.png");
    }

    #[tokio::test]
    async fn test_fetch_tile_unsupported_zoom() {
        let provider = OsmProvider::new(MockHttpClient { response: Ok(vec![0]) });
        let result = provider.fetch_tile(&TileCoord::new(0, 0, 20)).await;
        assert_eq!(result.unwrap_err(), ProviderError::UnsupportedZoom(20));
    }

    #[tokio::test]
    async fn test_fetch_tile_success() {
        let provider = OsmProvider::new(MockHttpClient {
            response: Ok(vec![1, 2, 3]),
        });
        let result = provider.fetch_tile(&TileCoord::new(194, 385, 10)).await;
        assert_eq!(result.unwrap(), vec![1, 2, 3]);
    }
}
