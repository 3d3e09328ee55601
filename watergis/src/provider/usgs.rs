//! USGS (United States Geological Survey) imagery provider.
//!
//! Provides free access to USGS orthoimagery via the National Map tile
//! services. This is the default provider; the water-distribution models
//! this engine was built for are US networks.
//!
//! # URL Pattern
//!
//! `https://basemap.nationalmap.gov/arcgis/rest/services/USGSImageryOnly/MapServer/tile/{z}/{y}/{x}`
//!
//! - Standard XYZ tile coordinates (y=row, x=col)
//! - No authentication required
//! - Free for all uses
//!
//! # Coverage
//!
//! - United States only (continental US, Alaska, Hawaii, territories)
//! - Tiles outside US coverage return errors or blank tiles

use super::http::AsyncHttpClient;
use super::types::{ProviderError, TileProvider};
use crate::coord::TileCoord;

/// Base URL for USGS imagery tiles.
const USGS_BASE_URL: &str =
    "https://basemap.nationalmap.gov/arcgis/rest/services/USGSImageryOnly/MapServer/tile";

/// Minimum zoom level supported by USGS.
const MIN_ZOOM: u8 = 0;

/// Maximum zoom level supported by USGS.
const MAX_ZOOM: u8 = 16;

/// USGS US Imagery tile provider.
///
/// No API key or authentication required. Coverage is limited to the
/// United States; requests for tiles outside US territory may return
/// errors or blank tiles.
pub struct UsgsProvider<C: AsyncHttpClient> {
    http_client: C,
}

impl<C: AsyncHttpClient> UsgsProvider<C> {
    /// Creates a new USGS imagery provider.
    pub fn new(http_client: C) -> Self {
        Self { http_client }
    }

    /// Builds the tile URL: `{base}/{z}/{y}/{x}`.
    fn build_url(&self, tile: &TileCoord) -> String {
        format!("{}/{}/{}/{}", USGS_BASE_URL, tile.zoom, tile.y, tile.x)
    }
}

impl<C: AsyncHttpClient> TileProvider for UsgsProvider<C> {
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
        "USGS"
    }

    fn min_zoom(&self) -> u8 {
        MIN_ZOOM
    }

    fn max_zoom(&self) -> u8 {
        MAX_ZOOM
    }
}
