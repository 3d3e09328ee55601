//! Slippy-map tile provider abstraction
//!
//! This module provides the trait and implementations for fetching raster
//! map tiles from external HTTP tile services (USGS US Imagery, ArcGIS
//! World Imagery, OpenStreetMap).
//!
//! Providers are generic over an [`AsyncHttpClient`] so tests can inject
//! mock transports; the fetch service composes a provider with the cache
//! and concurrency machinery in [`crate::fetch`].

mod arcgis;
mod http;
mod osm;
mod types;
mod usgs;

pub use arcgis::ArcGisProvider;
pub use http::{AsyncHttpClient, ReqwestClient};
pub use osm::OsmProvider;
pub use types::{ProviderError, TileProvider, TILE_SIZE_PX};
pub use usgs::UsgsProvider;

#[cfg(test)]
pub use http::tests::{MockHttpClient, RecordingHttpClient};
