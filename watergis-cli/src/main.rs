//! WATER-GIS CLI - Command-line interface
//!
//! This binary provides a command-line interface to the WATER-GIS map
//! core library: fetching stitched basemap imagery for a bounding box,
//! converting coordinates to tile addresses, and managing configuration.

mod commands;

use clap::{Parser, Subcommand};
use std::process;

#[derive(Parser)]
#[command(name = "watergis")]
#[command(version)]
#[command(about = "Slippy-map tile engine for water-distribution network models", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch the tiles covering a bounding box and stitch them into one image
    Fetch(commands::fetch::FetchArgs),
    /// Convert a geographic coordinate to its tile address
    Locate(commands::locate::LocateArgs),
    /// Manage the configuration file
    Config(commands::config::ConfigArgs),
}

fn main() {
    let cli = Cli::parse();

    let exit_code = match cli.command {
        Command::Fetch(args) => commands::fetch::run(args),
        Command::Locate(args) => commands::locate::run(args),
        Command::Config(args) => commands::config::run(args),
    };

    process::exit(exit_code);
}
