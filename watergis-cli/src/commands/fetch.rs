//! Bounding-box imagery fetch.
//!
//! Resolves a geographic bounding box to a tile grid, downloads the tiles
//! through the coalescing fetch service, and stitches them into a single
//! image. Failed tiles appear as yellow placeholders in the output rather
//! than failing the run.

use super::common::{self, ProviderKind};
use clap::Args;
use image::RgbaImage;
use indicatif::ProgressBar;
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use watergis::cache::TileCache;
use watergis::config::ConfigFile;
use watergis::coord::{BoundingBox, TileCoord};
use watergis::fetch::{default_concurrency, FetchConfig, TileResponse, TileService};
use watergis::grid::GridConfig;
use watergis::provider::{ArcGisProvider, OsmProvider, ReqwestClient, TileProvider, UsgsProvider};

#[derive(Args)]
pub struct FetchArgs {
    /// Bounding box as lat_min,lon_min,lat_max,lon_max (degrees)
    #[arg(long)]
    bbox: String,

    /// Output image path (format from extension, e.g. .png)
    #[arg(long)]
    output: PathBuf,

    /// Explicit zoom level (default: chosen from the bounding box size)
    #[arg(long)]
    zoom: Option<u8>,

    /// Imagery provider (default: from the config file)
    #[arg(long, value_enum)]
    provider: Option<ProviderKind>,

    /// Print a JSON summary to stdout
    #[arg(long)]
    json: bool,
}

/// JSON summary of a fetch run.
#[derive(Serialize)]
struct FetchSummary {
    provider: String,
    zoom: u8,
    tile_count: usize,
    fetched: usize,
    placeholders: usize,
    placeholder_tiles: Vec<TileCoord>,
    output: PathBuf,
}

pub fn run(args: FetchArgs) -> i32 {
    let _logging_guard = match watergis::logging::init_logging(
        watergis::logging::default_log_dir(),
        watergis::logging::default_log_file(),
    ) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: failed to initialise logging: {}", e);
            None
        }
    };

    let config = match ConfigFile::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            return 1;
        }
    };

    let bbox = match common::parse_bbox(&args.bbox) {
        Ok(bbox) => bbox,
        Err(e) => {
            eprintln!("Error: invalid bounding box: {}", e);
            return 1;
        }
    };

    let kind = args
        .provider
        .unwrap_or_else(|| common::provider_from_config(&config));

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: failed to create async runtime: {}", e);
            return 1;
        }
    };

    let http_client = match ReqwestClient::with_timeout(config.fetch.timeout_secs) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error: failed to create HTTP client: {}", e);
            return 1;
        }
    };

    runtime.block_on(async {
        match kind {
            ProviderKind::Usgs => {
                fetch_and_stitch(UsgsProvider::new(http_client), &config, &bbox, &args).await
            }
            ProviderKind::Arcgis => {
                fetch_and_stitch(ArcGisProvider::new(http_client), &config, &bbox, &args).await
            }
            ProviderKind::Osm => {
                fetch_and_stitch(OsmProvider::new(http_client), &config, &bbox, &args).await
            }
        }
    })
}

async fn fetch_and_stitch<P: TileProvider>(
    provider: P,
    config: &ConfigFile,
    bbox: &BoundingBox,
    args: &FetchArgs,
) -> i32 {
    let grid = GridConfig::new(config.grid.reference_tile_count, config.grid.tile_size);

    let zoom = match args.zoom {
        Some(zoom) => {
            if zoom > provider.max_zoom() {
                eprintln!(
                    "Warning: zoom {} exceeds {} maximum, clamping to {}",
                    zoom,
                    provider.name(),
                    provider.max_zoom()
                );
            }
            zoom.min(provider.max_zoom())
        }
        None => grid.zoom_for_bbox(bbox, provider.max_zoom()),
    };

    let tiles = grid.tiles_for_bbox(bbox, zoom);
    if tiles.is_empty() {
        eprintln!("Error: no tiles cover the requested area");
        return 1;
    }

    let provider_name = provider.name().to_string();
    let tile_size = provider.tile_size();
    println!(
        "Fetching {} tiles at zoom {} from {}",
        tiles.len(),
        zoom,
        provider_name
    );

    let cache = if config.cache.memory_size > 0 {
        Arc::new(TileCache::with_max_size_bytes(config.cache.memory_size))
    } else {
        Arc::new(TileCache::new())
    };

    let fetch_config = FetchConfig {
        request_timeout: Duration::from_secs(config.fetch.timeout_secs),
        max_retries: config.fetch.max_retries,
        max_concurrent: if config.fetch.max_concurrent > 0 {
            config.fetch.max_concurrent
        } else {
            default_concurrency()
        },
    };

    let service = TileService::new(provider, cache, fetch_config);
    let token = service.retarget();

    let interrupt_token = token.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        eprintln!("\nInterrupted, cancelling in-flight downloads...");
        interrupt_token.cancel();
    }) {
        tracing::warn!(error = %e, "could not install interrupt handler");
    }

    // Fetch row by row so the progress bar tracks real completions
    let progress = ProgressBar::new(tiles.len() as u64);
    let mut rows: HashMap<u32, Vec<TileCoord>> = HashMap::new();
    for tile in &tiles {
        rows.entry(tile.y).or_default().push(*tile);
    }
    let mut row_keys: Vec<u32> = rows.keys().copied().collect();
    row_keys.sort_unstable();

    let mut fetched: HashMap<TileCoord, TileResponse> = HashMap::new();
    for y in row_keys {
        if token.is_cancelled() {
            break;
        }
        let row = rows.remove(&y).unwrap_or_default();
        let results = service.fetch_grid(row, &token).await;
        progress.inc(results.len() as u64);
        fetched.extend(results);
    }
    progress.finish_and_clear();

    if token.is_cancelled() {
        eprintln!("Fetch cancelled after {} of {} tiles", fetched.len(), tiles.len());
        return 130;
    }

    let placeholder_tiles: Vec<TileCoord> = {
        let mut failed: Vec<TileCoord> = fetched
            .iter()
            .filter(|(_, response)| response.placeholder)
            .map(|(tile, _)| *tile)
            .collect();
        failed.sort_unstable_by_key(|t| (t.y, t.x));
        failed
    };

    if let Err(e) = stitch_and_save(&fetched, tile_size, &args.output) {
        eprintln!("Error: failed to write {}: {}", args.output.display(), e);
        return 1;
    }

    println!(
        "Wrote {} ({} tiles, {} placeholders)",
        args.output.display(),
        fetched.len(),
        placeholder_tiles.len()
    );

    if args.json {
        let summary = FetchSummary {
            provider: provider_name,
            zoom,
            tile_count: tiles.len(),
            fetched: fetched.len(),
            placeholders: placeholder_tiles.len(),
            placeholder_tiles,
            output: args.output.clone(),
        };
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Warning: could not serialise summary: {}", e),
        }
    }

    0
}

/// Pastes each tile at its grid offset and saves the composite image.
fn stitch_and_save(
    fetched: &HashMap<TileCoord, TileResponse>,
    tile_size: u32,
    output: &std::path::Path,
) -> Result<(), String> {
    let x_min = fetched.keys().map(|t| t.x).min().unwrap_or(0);
    let x_max = fetched.keys().map(|t| t.x).max().unwrap_or(0);
    let y_min = fetched.keys().map(|t| t.y).min().unwrap_or(0);
    let y_max = fetched.keys().map(|t| t.y).max().unwrap_or(0);

    let width = (x_max - x_min + 1) * tile_size;
    let height = (y_max - y_min + 1) * tile_size;
    let mut canvas = RgbaImage::new(width, height);

    for (tile, response) in fetched {
        let decoded = match image::load_from_memory(&response.data) {
            Ok(decoded) => decoded.to_rgba8(),
            Err(e) => {
                tracing::warn!(tile = %tile, error = %e, "skipping undecodable tile in composite");
                continue;
            }
        };
        let px = ((tile.x - x_min) * tile_size) as i64;
        let py = ((tile.y - y_min) * tile_size) as i64;
        image::imageops::replace(&mut canvas, &decoded, px, py);
    }

    canvas.save(output).map_err(|e| e.to_string())
}
