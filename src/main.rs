//! pillfinder - Sketch-based pill identification
//!
//! Draw a pill's outline and imprint on a canvas; the tool estimates the
//! silhouette shape, extracts the imprint text via cloud OCR, and searches
//! the national drug identification service for matching pills.

mod config;
mod lookup;
mod search;
mod ui;
mod vision;

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::config::{AppConfig, LookupTransport};

/// pillfinder - Draw-to-search pill identification
#[derive(Parser, Debug)]
#[command(name = "pillfinder")]
#[command(about = "Sketch a pill's shape and imprint to search the national drug database")]
struct Args {
    /// Path to a configuration file (defaults to the per-user config dir)
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Override the lookup transport (rest or soap)
    #[arg(short, long)]
    transport: Option<String>,

    /// Print the resolved configuration file path and exit
    #[arg(long)]
    show_config_path: bool,
}

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => config::config_dir()?.join("config.toml"),
    };

    if args.show_config_path {
        println!("{}", config_path.display());
        return Ok(());
    }

    info!("pillfinder starting...");

    let mut config = load_or_create_config(&config_path);

    if let Some(transport) = &args.transport {
        config.lookup.transport = match transport.to_ascii_lowercase().as_str() {
            "rest" => LookupTransport::Rest,
            "soap" => LookupTransport::Soap,
            other => anyhow::bail!("unknown transport '{}' (expected rest or soap)", other),
        };
        info!("Transport overridden to {:?}", config.lookup.transport);
    }

    if let Err(e) = ui::run_app(config) {
        tracing::error!("UI error: {}", e);
    }

    info!("pillfinder shutdown complete");

    Ok(())
}

/// Load configuration from file, or write and use the defaults
fn load_or_create_config(path: &std::path::Path) -> AppConfig {
    if path.exists() {
        if let Ok(config) = config::load_config(path) {
            info!("Loaded configuration from {:?}", path);
            return config;
        }
    }

    let config = AppConfig::default();
    // Persist the defaults so the user has a file to put their keys into
    if let Err(e) = config::save_config(&config, path) {
        tracing::warn!("Could not write default configuration to {:?}: {}", path, e);
    } else {
        info!("Wrote default configuration to {:?}", path);
    }
    config
}
