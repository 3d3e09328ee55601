//! ArcGIS World Imagery provider.
//!
//! Provides access to Esri's World Imagery basemap: high-resolution
//! satellite and aerial imagery with global coverage.
//!
//! # URL Pattern
//!
//! `https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}`
//!
//! - Standard XYZ tile coordinates (y=row, x=col)
//! - No authentication required for the public tier
//! - Free for non-commercial and limited commercial use
//!
//! # Terms of Use
//!
//! The World Imagery basemap is provided by Esri and is subject to their
//! terms of use. See: <https://www.esri.com/en-us/legal/terms/full-master-agreement>

use super::http::AsyncHttpClient;
use super::types::{ProviderError, TileProvider};
use crate::coord::TileCoord;

/// Base URL for ArcGIS World Imagery tiles.
const ARCGIS_BASE_URL: &str =
    "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile";

/// Minimum zoom level supported by ArcGIS World Imagery.
const MIN_ZOOM: u8 = 0;

/// Maximum zoom level supported by ArcGIS World Imagery.
/// Imagery is available up to zoom level 19 in most areas.
const MAX_ZOOM: u8 = 19;

/// ArcGIS World Imagery tile provider.
///
/// Global coverage with varying resolution; the highest zoom levels
/// (17-19) may not be available in all regions. No API key required for
/// the public tier.
pub struct ArcGisProvider<C: AsyncHttpClient> {
    http_client: C,
}

impl<C: AsyncHttpClient> ArcGisProvider<C> {
    /// Creates a new ArcGIS World Imagery provider.
    pub fn new(http_client: C) -> Self {
        Self { http_client }
    }

    /// Builds the tile URL: `{base}/{z}/{y}/{x}`.
    fn build_url(&self, tile: &TileCoord) -> String {
        format!("{}/{}/{}/{}", ARCGIS_BASE_URL, tile.zoom, tile.y, tile.x)
    }
}

impl<C: AsyncHttpClient> TileProvider for ArcGisProvider<C> {
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
        "ArcGIS"
    }

    fn min_zoom(&self) -> u8 {
        MIN_ZOOM
    }

    fn max_zoom(&self) -> u8 {
        MAX_ZOOM
    }
}
