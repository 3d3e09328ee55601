//! Coordinate to tile address conversion.

use clap::Args;
use watergis::coord::{lonlat_to_tile, tile_to_lonlat, TileCoord};

#[derive(Args)]
pub struct LocateArgs {
    /// Latitude in decimal degrees
    #[arg(long)]
    lat: f64,

    /// Longitude in decimal degrees
    #[arg(long)]
    lon: f64,

    /// Zoom level
    #[arg(long, default_value = "15")]
    zoom: u8,
}

pub fn run(args: LocateArgs) -> i32 {
    let tile = match lonlat_to_tile(args.lon, args.lat, args.zoom) {
        Ok(tile) => tile,
        Err(e) => {
            eprintln!("Error converting coordinates: {}", e);
            return 1;
        }
    };

    let (nw_lon, nw_lat) = tile_to_lonlat(&tile);
    let max_index = TileCoord::max_index(args.zoom);

    println!("Location:  {}, {}", args.lat, args.lon);
    println!("Zoom:      {} ({} x {} tile grid)", args.zoom, max_index as u64 + 1, max_index as u64 + 1);
    println!("Tile:      x={}, y={}", tile.x, tile.y);
    println!("NW corner: {:.6}, {:.6}", nw_lat, nw_lon);

    0
}
