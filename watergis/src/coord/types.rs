//! Coordinate type definitions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Web Mercator valid latitude range
pub const MIN_LAT: f64 = -85.05112878;
pub const MAX_LAT: f64 = 85.05112878;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Zoom levels addressable by the tile grid
pub const MIN_ZOOM: u8 = 0;
pub const MAX_ZOOM: u8 = 19;

/// Half the Web Mercator circumference in metres (EPSG:3857 extent).
pub const MERCATOR_EXTENT_M: f64 = 20_037_508.34;

/// A geographic point in degrees.
///
/// Latitude is only meaningful within the Web Mercator validity range
/// ([`MIN_LAT`], [`MAX_LAT`]); use [`clamp_latitude`](super::clamp_latitude)
/// before projecting points that may fall outside it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees, positive north
    pub lat: f64,
    /// Longitude in degrees, positive east
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.5}, {:.5})", self.lat, self.lon)
    }
}

/// Tile coordinates in the Web Mercator / slippy map system.
///
/// Addresses one raster tile (typically 256×256 pixels) by column,
/// row, and zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    /// X coordinate (east-west), 0 at the antimeridian
    pub x: u32,
    /// Y coordinate (north-south), 0 at the north edge
    pub y: u32,
    /// Zoom level
    pub zoom: u8,
}

impl TileCoord {
    pub fn new(x: u32, y: u32, zoom: u8) -> Self {
        Self { x, y, zoom }
    }

    /// Largest valid tile index at the given zoom level (`2^zoom - 1`).
    #[inline]
    pub fn max_index(zoom: u8) -> u32 {
        if zoom >= 32 {
            u32::MAX
        } else {
            (1u32 << zoom) - 1
        }
    }

    /// Whether both indices fall inside the grid for this tile's zoom.
    ///
    /// Out-of-range tiles must never be fetched; the grid resolver skips
    /// them and the fetch service substitutes a placeholder as a backstop.
    #[inline]
    pub fn is_in_range(&self) -> bool {
        let max = Self::max_index(self.zoom);
        self.x <= max && self.y <= max
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// A geographic bounding box in degrees.
///
/// Corners are normalised on construction so that `lat_min <= lat_max`
/// and `lon_min <= lon_max` always hold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lon_min: f64,
    pub lat_max: f64,
    pub lon_max: f64,
}

impl BoundingBox {
    /// Creates a bounding box, swapping corners if they arrive reversed.
    pub fn new(lat_min: f64, lon_min: f64, lat_max: f64, lon_max: f64) -> Self {
        let (lat_min, lat_max) = if lat_min <= lat_max {
            (lat_min, lat_max)
        } else {
            (lat_max, lat_min)
        };
        let (lon_min, lon_max) = if lon_min <= lon_max {
            (lon_min, lon_max)
        } else {
            (lon_max, lon_min)
        };
        Self {
            lat_min,
            lon_min,
            lat_max,
            lon_max,
        }
    }

    /// Longitude extent of the box in degrees.
    #[inline]
    pub fn lon_span(&self) -> f64 {
        self.lon_max - self.lon_min
    }

    /// Latitude extent of the box in degrees.
    #[inline]
    pub fn lat_span(&self) -> f64 {
        self.lat_max - self.lat_min
    }

    /// The northwest corner (`lat_max`, `lon_min`).
    #[inline]
    pub fn northwest(&self) -> GeoPoint {
        GeoPoint::new(self.lat_max, self.lon_min)
    }

    /// The southeast corner (`lat_min`, `lon_max`).
    #[inline]
    pub fn southeast(&self) -> GeoPoint {
        GeoPoint::new(self.lat_min, self.lon_max)
    }
}

/// Errors that can occur during coordinate conversion.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordError {
    /// Latitude is outside the Web Mercator validity range
    InvalidLatitude(f64),
    /// Longitude is outside the valid range (-180.0 to 180.0)
    InvalidLongitude(f64),
    /// Zoom level is outside the addressable range
    InvalidZoom(u8),
}

impl fmt::Display for CoordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordError::InvalidLatitude(lat) => {
                write!(
                    f,
                    "Invalid latitude: {} (must be between {} and {})",
                    lat, MIN_LAT, MAX_LAT
                )
            }
            CoordError::InvalidLongitude(lon) => {
                write!(
                    f,
                    "Invalid longitude: {} (must be between {} and {})",
                    lon, MIN_LON, MAX_LON
                )
            }
            CoordError::InvalidZoom(zoom) => {
                write!(
                    f,
                    "Invalid zoom level: {} (must be between {} and {})",
                    zoom, MIN_ZOOM, MAX_ZOOM
                )
            }
        }
    }
}

impl std::error::Error for CoordError {}
