//! WATER-GIS map core
//!
//! This library is the slippy-map engine behind the WATER-GIS desktop
//! application, which overlays water-distribution network models (pipes,
//! junctions, tanks, valves, reservoirs) on map tile imagery. It covers
//! everything below the rendering surface:
//!
//! - [`coord`] - Web Mercator projection math: lat/lon to tile indices
//!   and back, and planar EPSG:3857 metres to degrees
//! - [`grid`] - resolving a bounding box or viewport to the tile set
//!   that covers it, with automatic zoom selection
//! - [`viewport`] - explicit map view state consuming pan/zoom gestures
//! - [`provider`] - HTTP tile sources (USGS, ArcGIS, OpenStreetMap)
//! - [`cache`] - the in-memory tile cache
//! - [`fetch`] - the tile retrieval service: coalesced, bounded,
//!   cancellable, with placeholder substitution on failure
//! - [`crs`] - EPSG code validation for loaded network models
//! - [`config`] / [`logging`] - configuration file and log bootstrap
//!
//! The GUI layer feeds pointer and wheel events into a
//! [`viewport::Viewport`], asks it for the visible tile set, and hands
//! that set to a [`fetch::TileService`]; the resulting coordinate-to-image
//! map is painted at offsets derived from the same grid.

pub mod cache;
pub mod config;
pub mod coord;
pub mod crs;
pub mod fetch;
pub mod grid;
pub mod logging;
pub mod provider;
pub mod viewport;
