//! Shared helpers for CLI commands.

use clap::ValueEnum;
use watergis::config::ConfigFile;
use watergis::coord::BoundingBox;

/// Imagery provider selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProviderKind {
    /// USGS US Imagery (no API key, United States only)
    Usgs,
    /// ArcGIS World Imagery (no API key, global)
    Arcgis,
    /// OpenStreetMap standard layer (street map, global)
    Osm,
}

/// Resolves the provider from the config file, falling back to USGS for
/// unrecognised names.
pub fn provider_from_config(config: &ConfigFile) -> ProviderKind {
    match config.provider.name.as_str() {
        "usgs" => ProviderKind::Usgs,
        "arcgis" => ProviderKind::Arcgis,
        "osm" => ProviderKind::Osm,
        other => {
            eprintln!("Warning: unknown provider '{}' in config, using usgs", other);
            ProviderKind::Usgs
        }
    }
}

/// Parses a bounding box from `lat_min,lon_min,lat_max,lon_max`.
pub fn parse_bbox(raw: &str) -> Result<BoundingBox, String> {
    let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
    if parts.len() != 4 {
        return Err(format!(
            "expected lat_min,lon_min,lat_max,lon_max but got {} values",
            parts.len()
        ));
    }

    let mut values = [0.0f64; 4];
    for (i, part) in parts.iter().enumerate() {
        values[i] = part
            .parse::<f64>()
            .map_err(|_| format!("'{}' is not a number", part))?;
        if !values[i].is_finite() {
            return Err(format!("'{}' is not a finite coordinate", part));
        }
    }

    let [lat_min, lon_min, lat_max, lon_max] = values;
    if lat_min < -90.0 || lat_max > 90.0 {
        return Err("latitudes must be within [-90, 90]".to_string());
    }
    if lon_min < -180.0 || lon_max > 180.0 {
        return Err("longitudes must be within [-180, 180]".to_string());
    }

    Ok(BoundingBox::new(lat_min, lon_min, lat_max, lon_max))
}
