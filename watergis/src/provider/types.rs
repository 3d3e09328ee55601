//! Provider types and traits

use crate::coord::TileCoord;
use std::fmt;
use std::future::Future;

/// Edge length in pixels of the raster tiles served by the supported
/// providers.
pub const TILE_SIZE_PX: u32 = 256;

/// Errors that can occur during provider operations.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// HTTP request failed
    HttpError(String),
    /// Tile indices outside the grid for the requested zoom
    UnsupportedCoordinates { x: u32, y: u32, zoom: u8 },
    /// Zoom level not supported by this provider
    UnsupportedZoom(u8),
    /// Invalid response data from the provider
    InvalidResponse(String),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::HttpError(msg) => write!(f, "HTTP error: {}", msg),
            ProviderError::UnsupportedCoordinates { x, y, zoom } => {
                write!(
                    f,
                    "Tile ({}, {}) at zoom {} is outside the grid",
                    x, y, zoom
                )
            }
            ProviderError::UnsupportedZoom(zoom) => {
                write!(f, "Zoom level {} not supported by provider", zoom)
            }
            ProviderError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
        }
    }
}

impl std::error::Error for ProviderError {}

/// Trait for slippy-map tile providers.
///
/// Implementors fetch raster tiles from an external source addressed by
/// [`TileCoord`]. The fetch is asynchronous and non-blocking; test doubles
/// substitute canned responses through the same interface.
pub trait TileProvider: Send + Sync {
    /// Fetches one raster tile.
    ///
    /// # Arguments
    ///
    /// * `tile` - The tile to fetch
    ///
    /// # Returns
    ///
    /// Raw encoded image data (PNG or JPEG) or an error.
    fn fetch_tile(
        &self,
        tile: &TileCoord,
    ) -> impl Future<Output = Result<Vec<u8>, ProviderError>> + Send;

    /// Returns the provider's name for logging and identification.
    fn name(&self) -> &str;

    /// Returns the minimum supported zoom level.
    fn min_zoom(&self) -> u8;

    /// Returns the maximum supported zoom level.
    fn max_zoom(&self) -> u8;

    /// Edge length in pixels of the tiles this provider serves.
    fn tile_size(&self) -> u32 {
        TILE_SIZE_PX
    }

    /// Checks if this provider supports the given zoom level.
    fn supports_zoom(&self, zoom: u8) -> bool {
        zoom >= self.min_zoom() && zoom <= self.max_zoom()
    }
}
