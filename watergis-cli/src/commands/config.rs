//! Configuration management commands.

use clap::{Args, Subcommand};
use watergis::config::{config_file_path, ConfigFile};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    action: ConfigAction,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print one configuration value
    Get {
        /// Dotted key, e.g. provider.name
        key: String,
    },
    /// Set a configuration value and save the file
    Set {
        /// Dotted key, e.g. provider.name
        key: String,
        /// New value
        value: String,
    },
    /// List all configuration values
    List,
    /// Print the configuration file path
    Path,
}

pub fn run(args: ConfigArgs) -> i32 {
    match args.action {
        ConfigAction::Get { key } => get(&key),
        ConfigAction::Set { key, value } => set(&key, &value),
        ConfigAction::List => list(),
        ConfigAction::Path => {
            println!("{}", config_file_path().display());
            0
        }
    }
}

fn get(key: &str) -> i32 {
    let config = match ConfigFile::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            return 1;
        }
    };

    match config.get_key(key) {
        Some(value) => {
            println!("{}", value);
            0
        }
        None => {
            eprintln!("Unknown configuration key: {}", key);
            1
        }
    }
}

fn set(key: &str, value: &str) -> i32 {
    let mut config = match ConfigFile::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            return 1;
        }
    };

    if let Err(e) = config.set_key(key, value) {
        eprintln!("Error: {}", e);
        return 1;
    }

    if let Err(e) = config.save() {
        eprintln!("Error saving configuration: {}", e);
        return 1;
    }

    println!("{} = {}", key, value);
    0
}

fn list() -> i32 {
    let config = match ConfigFile::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            return 1;
        }
    };

    for (key, value) in config.entries() {
        println!("{} = {}", key, value);
    }
    0
}
