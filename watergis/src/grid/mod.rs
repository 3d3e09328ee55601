//! Tile-grid resolution
//!
//! Determines which tiles must be fetched to cover a geographic bounding
//! box or a pixel viewport, with the zoom level chosen automatically from
//! the box size or supplied explicitly from zoom gestures.
//!
//! The zoom heuristic picks the coarsest zoom at which a reference number
//! of tiles spans the box's longitude extent. The reference count defaults
//! to 10; it is a tuning parameter carried over from the original map
//! experiments, kept configurable rather than hard-coded.

use crate::coord::{self, BoundingBox, GeoPoint, TileCoord, MAX_ZOOM};

/// Default number of tiles the zoom heuristic aims to span across a
/// bounding box's longitude extent.
pub const DEFAULT_REFERENCE_TILE_COUNT: u32 = 10;

/// Default raster tile edge length in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 256;

/// Tuning parameters for grid resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridConfig {
    /// Reference tile count for the automatic zoom heuristic.
    pub reference_tile_count: u32,
    /// Tile edge length in pixels, used for viewport coverage.
    pub tile_size: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            reference_tile_count: DEFAULT_REFERENCE_TILE_COUNT,
            tile_size: DEFAULT_TILE_SIZE,
        }
    }
}

impl GridConfig {
    pub fn new(reference_tile_count: u32, tile_size: u32) -> Self {
        Self {
            reference_tile_count: reference_tile_count.max(1),
            tile_size: tile_size.max(1),
        }
    }

    /// Set the reference tile count for the zoom heuristic.
    pub fn with_reference_tile_count(mut self, count: u32) -> Self {
        self.reference_tile_count = count.max(1);
        self
    }

    /// Set the tile edge length in pixels.
    pub fn with_tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = tile_size.max(1);
        self
    }

    /// Picks a zoom level for a bounding box.
    ///
    /// Chooses the coarsest zoom at which `reference_tile_count` tiles
    /// span the box's longitude extent, flooring ties, clamped to
    /// `[0, max_zoom]`. The result is a heuristic fit, not an exact one;
    /// it shrinks (or holds) as the longitude span grows.
    ///
    /// Degenerate spans (zero-width or non-finite boxes) resolve to
    /// `max_zoom`.
    pub fn zoom_for_bbox(&self, bbox: &BoundingBox, max_zoom: u8) -> u8 {
        let max_zoom = max_zoom.min(MAX_ZOOM);
        let lon_span = bbox.lon_span();

        if !lon_span.is_finite() || lon_span <= 0.0 {
            return max_zoom;
        }

        let zoom = (360.0 * self.reference_tile_count as f64 / lon_span)
            .log2()
            .floor();

        zoom.clamp(0.0, max_zoom as f64) as u8
    }

    /// Computes the tile set covering a bounding box at the given zoom.
    ///
    /// Projects the northwest and southeast corners independently and
    /// enumerates the inclusive rectangle between them. Latitudes are
    /// clamped to the Web Mercator range before projecting; indices that
    /// would fall outside `[0, 2^zoom - 1]` are skipped.
    pub fn tiles_for_bbox(&self, bbox: &BoundingBox, zoom: u8) -> Vec<TileCoord> {
        let zoom = zoom.min(MAX_ZOOM);

        let nw = project_clamped(bbox.northwest(), zoom);
        let se = project_clamped(bbox.southeast(), zoom);
        let (Some(nw), Some(se)) = (nw, se) else {
            return Vec::new();
        };

        let mut tiles =
            Vec::with_capacity((se.x - nw.x + 1) as usize * (se.y - nw.y + 1) as usize);
        for x in nw.x..=se.x {
            for y in nw.y..=se.y {
                let tile = TileCoord::new(x, y, zoom);
                if tile.is_in_range() {
                    tiles.push(tile);
                }
            }
        }
        tiles
    }

    /// Computes the tile set covering a pixel viewport centred on a point.
    ///
    /// Derives how many tiles fit across and down the viewport
    /// (`ceil(dimension / tile_size) + 2` for edge overdraw) and
    /// enumerates the index window centred on the centre tile, skipping
    /// indices outside `[0, 2^zoom - 1]`.
    pub fn tiles_for_viewport(
        &self,
        center: GeoPoint,
        viewport_px: (u32, u32),
        zoom: u8,
    ) -> Vec<TileCoord> {
        let zoom = zoom.min(MAX_ZOOM);

        let Some(center_tile) = project_clamped(center, zoom) else {
            return Vec::new();
        };

        let (width, height) = viewport_px;
        let across = width.div_ceil(self.tile_size) + 2;
        let down = height.div_ceil(self.tile_size) + 2;

        let start_x = center_tile.x as i64 - (across / 2) as i64;
        let start_y = center_tile.y as i64 - (down / 2) as i64;
        let max_index = TileCoord::max_index(zoom) as i64;

        let mut tiles = Vec::with_capacity((across * down) as usize);
        for x in start_x..start_x + across as i64 {
            if x < 0 || x > max_index {
                continue;
            }
            for y in start_y..start_y + down as i64 {
                if y < 0 || y > max_index {
                    continue;
                }
                tiles.push(TileCoord::new(x as u32, y as u32, zoom));
            }
        }
        tiles
    }
}

/// Projects a point after clamping its latitude into the Web Mercator
/// range and its longitude onto [-180, 180].
fn project_clamped(point: GeoPoint, zoom: u8) -> Option<TileCoord> {
    let lat = coord::clamp_latitude(point.lat);
    let lon = point.lon.clamp(coord::MIN_LON, coord::MAX_LON);
    coord::lonlat_to_tile(lon, lat, zoom).ok()
}
