//! Configuration file handling for ~/.watergis/config.ini.
//!
//! Loads and saves user configuration with sensible defaults. Every
//! section is optional; unknown sections and keys are ignored so configs
//! survive version skew in both directions.

use crate::crs;
use crate::grid::{DEFAULT_REFERENCE_TILE_COUNT, DEFAULT_TILE_SIZE};
use crate::viewport::{DEFAULT_MAX_ZOOM, DEFAULT_MIN_ZOOM};
use ini::Ini;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default retry count after a failed download.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read or parse the config file
    #[error("Failed to read config file: {0}")]
    Read(#[from] ini::Error),

    /// Failed to write the config file
    #[error("Failed to write config file: {0}")]
    Write(std::io::Error),

    /// Failed to create the config directory
    #[error("Failed to create config directory: {0}")]
    Directory(std::io::Error),

    /// A value could not be parsed or is out of range
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// An unknown `section.key` was passed to get/set
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),
}

/// Tile provider selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    /// Provider name: "usgs", "arcgis", or "osm".
    pub name: String,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            name: "usgs".to_string(),
        }
    }
}

/// Download behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchSettings {
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Retries after a failed download.
    pub max_retries: u32,
    /// Maximum concurrent downloads; 0 selects a CPU-based default.
    pub max_concurrent: usize,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            max_concurrent: 0,
        }
    }
}

/// Memory cache behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheSettings {
    /// Memory cache bound in bytes; 0 keeps the cache unbounded for the
    /// session.
    pub memory_size: u64,
}

/// Grid resolution tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSettings {
    /// Reference tile count for the automatic zoom heuristic.
    pub reference_tile_count: u32,
    /// Tile edge length in pixels.
    pub tile_size: u32,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            reference_tile_count: DEFAULT_REFERENCE_TILE_COUNT,
            tile_size: DEFAULT_TILE_SIZE,
        }
    }
}

/// Map view defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapSettings {
    /// EPSG code of the loaded network model, if any.
    pub crs: Option<String>,
    /// Lower zoom gesture limit.
    pub min_zoom: u8,
    /// Upper zoom gesture limit.
    pub max_zoom: u8,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            crs: None,
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
        }
    }
}

/// The complete configuration file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigFile {
    pub provider: ProviderSettings,
    pub fetch: FetchSettings,
    pub cache: CacheSettings,
    pub grid: GridSettings,
    pub map: MapSettings,
}

impl ConfigFile {
    /// Load configuration from the default path (~/.watergis/config.ini).
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        Self::parse_ini(&ini)
    }

    /// Save configuration to the default path.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    /// Save configuration to a specific path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigError::Directory)?;
        }

        let ini = self.to_ini();
        let mut buffer = Vec::new();
        ini.write_to(&mut buffer).map_err(ConfigError::Write)?;
        std::fs::write(path, buffer).map_err(ConfigError::Write)
    }

    /// Create the default config file if it doesn't exist, returning its
    /// path.
    pub fn ensure_exists() -> Result<PathBuf, ConfigError> {
        let path = config_file_path();
        if !path.exists() {
            Self::default().save_to(&path)?;
        }
        Ok(path)
    }

    fn parse_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(name) = get_str(ini, "provider", "name") {
            config.provider.name = name.to_lowercase();
        }

        if let Some(v) = get_parsed(ini, "fetch", "timeout_secs")? {
            config.fetch.timeout_secs = v;
        }
        if let Some(v) = get_parsed(ini, "fetch", "max_retries")? {
            config.fetch.max_retries = v;
        }
        if let Some(v) = get_parsed(ini, "fetch", "max_concurrent")? {
            config.fetch.max_concurrent = v;
        }

        if let Some(v) = get_parsed(ini, "cache", "memory_size")? {
            config.cache.memory_size = v;
        }

        if let Some(v) = get_parsed(ini, "grid", "reference_tile_count")? {
            config.grid.reference_tile_count = v;
        }
        if let Some(v) = get_parsed(ini, "grid", "tile_size")? {
            config.grid.tile_size = v;
        }

        // Invalid CRS codes are reported, not fatal
        if let Some(code) = get_str(ini, "map", "crs") {
            if code.is_empty() {
                config.map.crs = None;
            } else if crs::is_valid_epsg(&code) {
                config.map.crs = Some(code);
            } else {
                warn!(crs = %code, "ignoring invalid EPSG code in config");
                config.map.crs = None;
            }
        }
        if let Some(v) = get_parsed(ini, "map", "min_zoom")? {
            config.map.min_zoom = v;
        }
        if let Some(v) = get_parsed(ini, "map", "max_zoom")? {
            config.map.max_zoom = v;
        }
        if config.map.min_zoom > config.map.max_zoom {
            warn!(
                min_zoom = config.map.min_zoom,
                max_zoom = config.map.max_zoom,
                "swapping reversed zoom limits in config"
            );
            std::mem::swap(&mut config.map.min_zoom, &mut config.map.max_zoom);
        }

        Ok(config)
    }

    fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();

        ini.with_section(Some("provider"))
            .set("name", self.provider.name.clone());

        ini.with_section(Some("fetch"))
            .set("timeout_secs", self.fetch.timeout_secs.to_string())
            .set("max_retries", self.fetch.max_retries.to_string())
            .set("max_concurrent", self.fetch.max_concurrent.to_string());

        ini.with_section(Some("cache"))
            .set("memory_size", self.cache.memory_size.to_string());

        ini.with_section(Some("grid"))
            .set(
                "reference_tile_count",
                self.grid.reference_tile_count.to_string(),
            )
            .set("tile_size", self.grid.tile_size.to_string());

        ini.with_section(Some("map"))
            .set("crs", self.map.crs.clone().unwrap_or_default())
            .set("min_zoom", self.map.min_zoom.to_string())
            .set("max_zoom", self.map.max_zoom.to_string());

        ini
    }

    /// All known `section.key` pairs with their current values.
    pub fn entries(&self) -> Vec<(String, String)> {
        vec![
            ("provider.name".into(), self.provider.name.clone()),
            ("fetch.timeout_secs".into(), self.fetch.timeout_secs.to_string()),
            ("fetch.max_retries".into(), self.fetch.max_retries.to_string()),
            (
                "fetch.max_concurrent".into(),
                self.fetch.max_concurrent.to_string(),
            ),
            ("cache.memory_size".into(), self.cache.memory_size.to_string()),
            (
                "grid.reference_tile_count".into(),
                self.grid.reference_tile_count.to_string(),
            ),
            ("grid.tile_size".into(), self.grid.tile_size.to_string()),
            ("map.crs".into(), self.map.crs.clone().unwrap_or_default()),
            ("map.min_zoom".into(), self.map.min_zoom.to_string()),
            ("map.max_zoom".into(), self.map.max_zoom.to_string()),
        ]
    }

    /// Looks up a value by dotted `section.key`.
    pub fn get_key(&self, key: &str) -> Option<String> {
        self.entries()
            .into_iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Sets a value by dotted `section.key`, validating it.
    pub fn set_key(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |reason: &str| {
            let (section, name) = key.split_once('.').unwrap_or(("", key));
            ConfigError::InvalidValue {
                section: section.to_string(),
                key: name.to_string(),
                value: value.to_string(),
                reason: reason.to_string(),
            }
        };

        match key {
            "provider.name" => {
                let name = value.to_lowercase();
                if !matches!(name.as_str(), "usgs" | "arcgis" | "osm") {
                    return Err(invalid("expected one of: usgs, arcgis, osm"));
                }
                self.provider.name = name;
            }
            "fetch.timeout_secs" => {
                self.fetch.timeout_secs = parse_value(key, value)?;
            }
            "fetch.max_retries" => {
                self.fetch.max_retries = parse_value(key, value)?;
            }
            "fetch.max_concurrent" => {
                self.fetch.max_concurrent = parse_value(key, value)?;
            }
            "cache.memory_size" => {
                self.cache.memory_size = parse_value(key, value)?;
            }
            "grid.reference_tile_count" => {
                let count: u32 = parse_value(key, value)?;
                if count == 0 {
                    return Err(invalid("must be at least 1"));
                }
                self.grid.reference_tile_count = count;
            }
            "grid.tile_size" => {
                let size: u32 = parse_value(key, value)?;
                if size == 0 {
                    return Err(invalid("must be at least 1"));
                }
                self.grid.tile_size = size;
            }
            "map.crs" => {
                if value.is_empty() {
                    self.map.crs = None;
                } else if crs::is_valid_epsg(value) {
                    self.map.crs = Some(value.trim().to_string());
                } else {
                    return Err(invalid("not a valid EPSG code"));
                }
            }
            "map.min_zoom" => {
                let zoom: u8 = parse_value(key, value)?;
                if zoom > self.map.max_zoom {
                    return Err(invalid("min_zoom cannot exceed max_zoom"));
                }
                self.map.min_zoom = zoom;
            }
            "map.max_zoom" => {
                let zoom: u8 = parse_value(key, value)?;
                if zoom < self.map.min_zoom {
                    return Err(invalid("max_zoom cannot be below min_zoom"));
                }
                self.map.max_zoom = zoom;
            }
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }

        Ok(())
    }
}

fn get_str(ini: &Ini, section: &str, key: &str) -> Option<String> {
    ini.section(Some(section))
        .and_then(|s| s.get(key))
        .map(|v| v.trim().to_string())
}

fn get_parsed<T: FromStr>(ini: &Ini, section: &str, key: &str) -> Result<Option<T>, ConfigError> {
    match get_str(ini, section, key) {
        None => Ok(None),
        Some(raw) if raw.is_empty() => Ok(None),
        Some(raw) => raw.parse::<T>().map(Some).map_err(|_| {
            ConfigError::InvalidValue {
                section: section.to_string(),
                key: key.to_string(),
                value: raw,
                reason: format!("expected a {}", std::any::type_name::<T>()),
            }
        }),
    }
}

fn parse_value<T: FromStr>(dotted: &str, value: &str) -> Result<T, ConfigError> {
    let (section, key) = dotted.split_once('.').unwrap_or(("", dotted));
    value.trim().parse::<T>().map_err(|_| ConfigError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: format!("expected a {}", std::any::type_name::<T>()),
    })
}

/// Path to the config directory (~/.watergis).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".watergis")
}

/// Path to the config file (~/.watergis/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}
