//! Viewport state for the map view
//!
//! The prototypes this engine replaces kept the current zoom, centre, and
//! window size as ambient application state. Here that state is an explicit
//! context object passed to the grid resolver, so pan/zoom/resize events
//! mutate one value with a single consistent clamping policy.

use crate::coord::{self, GeoPoint, TileCoord, MAX_ZOOM, MIN_LON};
use crate::grid::GridConfig;
use serde::{Deserialize, Serialize};

/// Default zoom gesture limits, matching the original map view.
pub const DEFAULT_MIN_ZOOM: u8 = 1;
pub const DEFAULT_MAX_ZOOM: u8 = 18;

/// The current view of the map: centre, zoom, and pixel dimensions.
///
/// Zoom is an integer level; gestures step it by exactly one and clamp it
/// inclusively to `[min_zoom, max_zoom]`. Fractional zoom is not
/// representable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    center: GeoPoint,
    zoom: u8,
    width_px: u32,
    height_px: u32,
    min_zoom: u8,
    max_zoom: u8,
}

impl Viewport {
    /// Creates a viewport with the default zoom limits.
    ///
    /// The centre latitude is clamped to the Web Mercator range and the
    /// zoom to the limits.
    pub fn new(center: GeoPoint, zoom: u8, width_px: u32, height_px: u32) -> Self {
        let mut viewport = Self {
            center: GeoPoint::new(0.0, 0.0),
            zoom: DEFAULT_MIN_ZOOM,
            width_px,
            height_px,
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
        };
        viewport.set_center(center);
        viewport.set_zoom(zoom);
        viewport
    }

    pub fn center(&self) -> GeoPoint {
        self.center
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn size_px(&self) -> (u32, u32) {
        (self.width_px, self.height_px)
    }

    pub fn min_zoom(&self) -> u8 {
        self.min_zoom
    }

    pub fn max_zoom(&self) -> u8 {
        self.max_zoom
    }

    /// Sets the centre, clamping latitude into the Web Mercator range and
    /// longitude onto [-180, 180].
    pub fn set_center(&mut self, center: GeoPoint) {
        self.center = GeoPoint::new(
            coord::clamp_latitude(center.lat),
            center.lon.clamp(MIN_LON, coord::MAX_LON),
        );
    }

    /// Sets the zoom level, clamped to `[min_zoom, max_zoom]`.
    pub fn set_zoom(&mut self, zoom: u8) {
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
    }

    /// Sets the zoom limits and re-clamps the current zoom.
    ///
    /// Limits themselves are bounded by the grid's addressable range; a
    /// provider's supported range is the usual source for `max_zoom`.
    pub fn set_zoom_limits(&mut self, min_zoom: u8, max_zoom: u8) {
        let max_zoom = max_zoom.min(MAX_ZOOM);
        let min_zoom = min_zoom.min(max_zoom);
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self.zoom = self.zoom.clamp(min_zoom, max_zoom);
    }

    /// One discrete zoom-in gesture: increment by exactly one, clamped.
    pub fn zoom_in(&mut self) -> u8 {
        if self.zoom < self.max_zoom {
            self.zoom += 1;
        }
        self.zoom
    }

    /// One discrete zoom-out gesture: decrement by exactly one, clamped.
    pub fn zoom_out(&mut self) -> u8 {
        if self.zoom > self.min_zoom {
            self.zoom -= 1;
        }
        self.zoom
    }

    /// Resizes the viewport in pixels.
    pub fn resize(&mut self, width_px: u32, height_px: u32) {
        self.width_px = width_px;
        self.height_px = height_px;
    }

    /// Pans by a pixel offset.
    ///
    /// Positive `dx` moves the view east, positive `dy` moves it south.
    /// Uses the flat degrees-per-pixel model of the original view, which
    /// treats latitude like longitude; adequate for small pans at the
    /// zooms where panning happens.
    pub fn pan_by_pixels(&mut self, dx: f64, dy: f64, grid: &GridConfig) {
        let world_px = 2.0_f64.powi(self.zoom as i32) * grid.tile_size as f64;
        let degrees_per_pixel = 360.0 / world_px;

        self.set_center(GeoPoint::new(
            self.center.lat - dy * degrees_per_pixel,
            self.center.lon + dx * degrees_per_pixel,
        ));
    }

    /// The tile set covering this viewport, recomputed per gesture.
    pub fn visible_tiles(&self, grid: &GridConfig) -> Vec<TileCoord> {
        grid.tiles_for_viewport(self.center, (self.width_px, self.height_px), self.zoom)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(GeoPoint::new(0.0, 0.0), DEFAULT_MIN_ZOOM, 800, 600)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_clamps_inputs() {
        let viewport = Viewport::new(GeoPoint::new(90.0, 200.0), 25, 800, 600);
        assert_eq!(viewport.center().lat, coord::MAX_LAT);
        assert_eq!(viewport.center().lon, 180.0);
        assert_eq!(viewport.zoom(), DEFAULT_MAX_ZOOM);
    }

    #[test]
    fn test_zoom_gestures_step_by_one() {
        let mut viewport = Viewport::new(GeoPoint::new(40.5, -111.5), 10, 800, 600);

        assert_eq!(viewport.zoom_in(), 11);
        assert_eq!(viewport.zoom_out(), 10);
        assert_eq!(viewport.zoom_out(), 9);
    }

    #[test]
    fn test_zoom_clamps_at_limits() {
        let mut viewport = Viewport::new(GeoPoint::new(0.0, 0.0), 18, 800, 600);
        assert_eq!(viewport.zoom_in(), 18);

        viewport.set_zoom(1);
        assert_eq!(viewport.zoom_out(), 1);
    }

    #[test]
    fn test_set_zoom_limits_reclamps() {
        let mut viewport = Viewport::new(GeoPoint::new(0.0, 0.0), 16, 800, 600);
        viewport.set_zoom_limits(2, 12);
        assert_eq!(viewport.zoom(), 12);
        assert_eq!(viewport.max_zoom(), 12);

        // Provider-style limit above the grid range is bounded
        viewport.set_zoom_limits(0, 40);
        assert_eq!(viewport.max_zoom(), MAX_ZOOM);
    }

    #[test]
    fn test_pan_moves_center() {
        let grid = GridConfig::default();
        let mut viewport = Viewport::new(GeoPoint::new(40.5, -111.5), 10, 800, 600);

        // 360 / (2^10 * 256) degrees per pixel
        viewport.pan_by_pixels(256.0, 0.0, &grid);
        let expected_lon = -111.5 + 360.0 / 1024.0;
        assert!((viewport.center().lon - expected_lon).abs() < 1e-9);

        viewport.pan_by_pixels(0.0, -256.0, &grid);
        let expected_lat = 40.5 + 360.0 / 1024.0;
        assert!((viewport.center().lat - expected_lat).abs() < 1e-9);
    }

    #[test]
    fn test_pan_clamps_latitude() {
        let grid = GridConfig::default();
        let mut viewport = Viewport::new(GeoPoint::new(85.0, 0.0), 1, 800, 600);

        viewport.pan_by_pixels(0.0, -10_000.0, &grid);
        assert_eq!(viewport.center().lat, coord::MAX_LAT);
    }

    #[test]
    fn test_visible_tiles_matches_grid_resolver() {
        let grid = GridConfig::default();
        let viewport = Viewport::new(GeoPoint::new(40.5, -111.5), 10, 800, 600);

        let tiles = viewport.visible_tiles(&grid);
        assert_eq!(
            tiles,
            grid.tiles_for_viewport(GeoPoint::new(40.5, -111.5), (800, 600), 10)
        );
        assert_eq!(tiles.len(), 30);
    }

    #[test]
    fn test_resize_changes_coverage() {
        let grid = GridConfig::default();
        let mut viewport = Viewport::new(GeoPoint::new(40.5, -111.5), 10, 800, 600);
        let before = viewport.visible_tiles(&grid).len();

        viewport.resize(1600, 1200);
        let after = viewport.visible_tiles(&grid).len();
        assert!(after > before);
    }
}
