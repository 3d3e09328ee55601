//! Coordinate conversion module
//!
//! Provides conversions between geographic coordinates (latitude/longitude)
//! and Web Mercator tile coordinates used by slippy-map tile providers, and
//! from planar Web Mercator metres (EPSG:3857) back to geographic degrees.

mod types;

pub use types::{
    BoundingBox, CoordError, GeoPoint, TileCoord, MAX_LAT, MAX_LON, MAX_ZOOM, MERCATOR_EXTENT_M,
    MIN_LAT, MIN_LON, MIN_ZOOM,
};

use std::f64::consts::PI;

/// Clamps a latitude to the Web Mercator validity range.
///
/// The projection degenerates as latitude approaches ±90°; callers holding
/// arbitrary input (user clicks, network geometry) should clamp to
/// [`MIN_LAT`]..[`MAX_LAT`] before projecting.
#[inline]
pub fn clamp_latitude(lat: f64) -> f64 {
    lat.clamp(MIN_LAT, MAX_LAT)
}

/// Converts geographic coordinates to tile coordinates.
///
/// Uses the standard slippy-map formula: `n = 2^zoom`,
/// `x = floor((lon + 180) / 360 * n)`,
/// `y = floor((1 - asinh(tan lat) / pi) / 2 * n)`.
///
/// # Arguments
///
/// * `lon` - Longitude in degrees (-180.0 to 180.0)
/// * `lat` - Latitude in degrees (-85.05112878 to 85.05112878)
/// * `zoom` - Zoom level (0 to 19)
///
/// # Returns
///
/// A `Result` containing the tile coordinates or an error if inputs are
/// invalid. Indices at the extreme east/south edge are clamped into range,
/// so valid inputs always produce `x, y` in `[0, 2^zoom - 1]`.
#[inline]
pub fn lonlat_to_tile(lon: f64, lat: f64, zoom: u8) -> Result<TileCoord, CoordError> {
    if !(MIN_LAT..=MAX_LAT).contains(&lat) {
        return Err(CoordError::InvalidLatitude(lat));
    }
    if !(MIN_LON..=MAX_LON).contains(&lon) {
        return Err(CoordError::InvalidLongitude(lon));
    }
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }

    let n = 2.0_f64.powi(zoom as i32);
    let max_index = TileCoord::max_index(zoom);

    let x = (((lon + 180.0) / 360.0 * n) as u32).min(max_index);

    let lat_rad = lat.to_radians();
    let y = ((((1.0 - lat_rad.tan().asinh() / PI) / 2.0) * n) as u32).min(max_index);

    Ok(TileCoord { x, y, zoom })
}

/// Converts tile coordinates back to geographic coordinates.
///
/// Returns the `(lon, lat)` of the tile's northwest corner. The forward and
/// backward pair round-trips to within one tile's angular extent, not
/// bit-exactly, because tile indices are integer-floored.
#[inline]
pub fn tile_to_lonlat(tile: &TileCoord) -> (f64, f64) {
    let n = 2.0_f64.powi(tile.zoom as i32);

    let lon = tile.x as f64 / n * 360.0 - 180.0;

    let y = tile.y as f64 / n;
    let lat_rad = (PI * (1.0 - 2.0 * y)).sinh().atan();
    let lat = lat_rad.to_degrees();

    (lon, lat)
}

/// Converts planar Web Mercator metres (EPSG:3857) to geographic degrees.
///
/// Uses the spherical inverse formula with the half-circumference constant
/// [`MERCATOR_EXTENT_M`]: `lon = x * 180 / 20037508.34` and
/// `lat = 180/pi * (2 * atan(exp(y_deg * pi / 180)) - pi/2)` where `y_deg`
/// is the metre ordinate rescaled to degrees.
///
/// Returns `(lat, lon)`.
#[inline]
pub fn mercator_to_latlon(x_m: f64, y_m: f64) -> (f64, f64) {
    let lon = x_m * 180.0 / MERCATOR_EXTENT_M;

    let y_deg = y_m * 180.0 / MERCATOR_EXTENT_M;
    let lat = 180.0 / PI * (2.0 * (y_deg * PI / 180.0).exp().atan() - PI / 2.0);

    (lat, lon)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_salt_lake_valley_at_zoom_10() {
        // Reference value from the standard OSM slippy-map formula
        let tile = lonlat_to_tile(-111.5, 40.5, 10).unwrap();
        assert_eq!(tile.x, 194);
        assert_eq!(tile.y, 385);
        assert_eq!(tile.zoom, 10);
    }

    #[test]
    fn test_new_york_city_at_zoom_16() {
        // New York City: 40.7128°N, 74.0060°W
        let tile = lonlat_to_tile(-74.0060, 40.7128, 16).unwrap();
        assert_eq!(tile.x, 19295);
        assert_eq!(tile.y, 24640);
        assert_eq!(tile.zoom, 16);
    }

    #[test]
    fn test_origin_maps_to_grid_centre() {
        let tile = lonlat_to_tile(0.0, 0.0, 1).unwrap();
        assert_eq!((tile.x, tile.y), (1, 1));
    }

    #[test]
    fn test_invalid_latitude() {
        let result = lonlat_to_tile(0.0, 90.0, 10);
        assert!(matches!(result, Err(CoordError::InvalidLatitude(_))));
    }

    #[test]
    fn test_invalid_longitude() {
        let result = lonlat_to_tile(181.0, 0.0, 10);
        assert!(matches!(result, Err(CoordError::InvalidLongitude(_))));
    }

    #[test]
    fn test_invalid_zoom() {
        let result = lonlat_to_tile(0.0, 0.0, 20);
        assert!(matches!(result, Err(CoordError::InvalidZoom(20))));
    }

    #[test]
    fn test_east_edge_clamped_into_range() {
        // lon = 180 would floor to index n without the clamp
        let tile = lonlat_to_tile(180.0, 0.0, 10).unwrap();
        assert_eq!(tile.x, TileCoord::max_index(10));
    }

    #[test]
    fn test_south_edge_clamped_into_range() {
        let tile = lonlat_to_tile(0.0, MIN_LAT, 10).unwrap();
        assert_eq!(tile.y, TileCoord::max_index(10));
    }

    #[test]
    fn test_clamp_latitude() {
        assert_eq!(clamp_latitude(90.0), MAX_LAT);
        assert_eq!(clamp_latitude(-90.0), MIN_LAT);
        assert_eq!(clamp_latitude(40.5), 40.5);
    }

    #[test]
    fn test_tile_to_lonlat_northwest_corner() {
        let tile = TileCoord::new(19295, 24640, 16);
        let (lon, lat) = tile_to_lonlat(&tile);

        // Close to NYC but not exact (northwest corner of the tile)
        assert!((lat - 40.713).abs() < 0.01);
        assert!((lon - (-74.007)).abs() < 0.01);
    }

    #[test]
    fn test_tile_to_lonlat_at_equator() {
        let tile = TileCoord::new(512, 512, 10);
        let (lon, lat) = tile_to_lonlat(&tile);

        assert!(lat.abs() < 1.0, "should be near the equator");
        assert!(lon.abs() < 1.0, "should be near the prime meridian");
    }

    #[test]
    fn test_roundtrip_within_one_tile() {
        let lat = 40.5;
        let lon = -111.5;

        for zoom in [0, 5, 10, 15, 19] {
            let tile = lonlat_to_tile(lon, lat, zoom).unwrap();
            let (back_lon, back_lat) = tile_to_lonlat(&tile);

            // tile_to_lonlat returns the northwest corner, so the tolerance
            // is one tile's angular extent at this zoom
            let tile_span = 360.0 / 2.0_f64.powi(zoom as i32);
            assert!(
                (back_lat - lat).abs() < tile_span,
                "zoom {}: lat diff {} exceeds tile span {}",
                zoom,
                (back_lat - lat).abs(),
                tile_span
            );
            assert!(
                (back_lon - lon).abs() < tile_span,
                "zoom {}: lon diff {} exceeds tile span {}",
                zoom,
                (back_lon - lon).abs(),
                tile_span
            );
        }
    }

    #[test]
    fn test_mercator_to_latlon_origin() {
        let (lat, lon) = mercator_to_latlon(0.0, 0.0);
        assert!(lat.abs() < 1e-9);
        assert!(lon.abs() < 1e-9);
    }

    #[test]
    fn test_mercator_to_latlon_known_point() {
        // 40°N 100°W in EPSG:3857 metres
        let (lat, lon) = mercator_to_latlon(-11_131_949.0778, 4_865_942.2795);
        assert!((lat - 40.0).abs() < 1e-6, "lat was {}", lat);
        assert!((lon - (-100.0)).abs() < 1e-6, "lon was {}", lon);
    }

    #[test]
    fn test_mercator_to_latlon_extent() {
        let (lat, lon) = mercator_to_latlon(MERCATOR_EXTENT_M, MERCATOR_EXTENT_M);
        assert!((lon - 180.0).abs() < 1e-9);
        // Full-extent y lands at the Web Mercator latitude limit
        assert!((lat - 85.05112878).abs() < 1e-4, "lat was {}", lat);
    }

    // Property-based tests using proptest
    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_tile_coords_in_bounds(
                lat in -85.05..85.05_f64,
                lon in -180.0..180.0_f64,
                zoom in 0u8..=19
            ) {
                let tile = lonlat_to_tile(lon, lat, zoom)?;

                let max_tile = 2u32.pow(zoom as u32);
                prop_assert!(
                    tile.x < max_tile,
                    "x {} exceeds maximum {} at zoom {}",
                    tile.x, max_tile, zoom
                );
                prop_assert!(
                    tile.y < max_tile,
                    "y {} exceeds maximum {} at zoom {}",
                    tile.y, max_tile, zoom
                );
                prop_assert_eq!(tile.zoom, zoom);
            }

            #[test]
            fn test_roundtrip_property(
                lat in -85.05..85.05_f64,
                lon in -180.0..180.0_f64,
                zoom in 0u8..=19
            ) {
                let tile = lonlat_to_tile(lon, lat, zoom)?;
                let (back_lon, back_lat) = tile_to_lonlat(&tile);

                let tile_span = 360.0 / (2.0_f64.powi(zoom as i32));
                prop_assert!(
                    (back_lat - lat).abs() < tile_span,
                    "latitude roundtrip failed: {} -> {} (diff {}, tile span {})",
                    lat, back_lat, (back_lat - lat).abs(), tile_span
                );
                prop_assert!(
                    (back_lon - lon).abs() < tile_span,
                    "longitude roundtrip failed: {} -> {} (diff {}, tile span {})",
                    lon, back_lon, (back_lon - lon).abs(), tile_span
                );
            }

            #[test]
            fn test_longitude_monotonic(
                lat in 0.0..1.0_f64,
                lon1 in -180.0..-90.0_f64,
                lon2 in -90.0..0.0_f64,
                zoom in 10u8..=15
            ) {
                // For fixed latitude, increasing longitude must not decrease x
                let tile1 = lonlat_to_tile(lon1, lat, zoom)?;
                let tile2 = lonlat_to_tile(lon2, lat, zoom)?;

                prop_assert!(
                    tile1.x < tile2.x,
                    "longitude not monotonic: lon {} (x {}) >= lon {} (x {})",
                    lon1, tile1.x, lon2, tile2.x
                );
            }

            #[test]
            fn test_tile_to_lonlat_in_bounds(
                x_raw in 0u32..65536,
                y_raw in 0u32..65536,
                zoom in 0u8..=16
            ) {
                let max_coord = 2u32.pow(zoom as u32);
                let x = x_raw % max_coord;
                let y = y_raw % max_coord;

                let tile = TileCoord::new(x, y, zoom);
                let (lon, lat) = tile_to_lonlat(&tile);

                prop_assert!(
                    (MIN_LAT..=MAX_LAT).contains(&lat),
                    "latitude {} out of bounds [{}, {}]",
                    lat, MIN_LAT, MAX_LAT
                );
                prop_assert!(
                    (-180.0..=180.0).contains(&lon),
                    "longitude {} out of bounds [-180, 180]",
                    lon
                );
            }

            #[test]
            fn test_reject_invalid_latitude(
                lat in -90.0..-85.06_f64,
                lon in -180.0..180.0_f64,
                zoom in 0u8..=19
            ) {
                let result = lonlat_to_tile(lon, lat, zoom);
                prop_assert!(result.is_err());
                prop_assert!(matches!(result.unwrap_err(), CoordError::InvalidLatitude(_)));
            }

            #[test]
            fn test_reject_invalid_longitude(
                lat in -85.0..85.0_f64,
                lon in 180.01..360.0_f64,
                zoom in 0u8..=19
            ) {
                let result = lonlat_to_tile(lon, lat, zoom);
                prop_assert!(result.is_err());
                prop_assert!(matches!(result.unwrap_err(), CoordError::InvalidLongitude(_)));
            }

            #[test]
            fn test_mercator_inverse_in_bounds(
                x_m in -20_037_508.34..20_037_508.34_f64,
                y_m in -20_037_508.34..20_037_508.34_f64
            ) {
                let (lat, lon) = mercator_to_latlon(x_m, y_m);

                prop_assert!((-180.0..=180.0).contains(&lon));
                prop_assert!(lat > -85.06 && lat < 85.06);
            }
        }
    }
}
