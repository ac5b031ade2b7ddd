//! mt32bridge - inspect MT-32 / CM-32L ROM installations.
//!
//! Shows where ROMs are searched for, which models are present in each
//! directory and which model the bridge would load.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- --list               # Model × directory matrix
//! cargo run -- --model mt32_1_07    # Check a specific model
//! RUST_LOG=debug cargo run          # Trace resolution
//! ```

use anyhow::{Context, Result};
use mt32bridge::rom::{search_order, FilenameProbe, Platform, SearchEnv};
use mt32bridge::{BridgeConfig, BridgeError, ModelCatalog, ModelSelector};
use std::path::PathBuf;

/// Width used for the listing when the terminal size is unknown.
const DEFAULT_TERM_WIDTH: usize = 80;

/// Command-line options for the application.
struct CliOptions {
    /// Overrides the configured model.
    model: Option<String>,
    /// Overrides the configured ROM directory.
    romdir: Option<String>,
    /// JSON configuration file.
    config: Option<PathBuf>,
    /// Print the directory search order.
    dirs: bool,
    /// Print the model × directory matrix.
    list: bool,
}

impl CliOptions {
    /// Parses command-line arguments.
    ///
    /// Supports:
    /// - `--model NAME` or `-m NAME`: Model to select (`auto` by default)
    /// - `--romdir DIR` or `-r DIR`: Directory searched before the standard ones
    /// - `--config FILE` or `-c FILE`: Load settings from a JSON file
    /// - `--dirs`: Print the search order
    /// - `--list` or `-l`: Print which models are present where
    /// - `--help` or `-h`: Print help and exit
    fn parse() -> Result<Self> {
        let args: Vec<String> = std::env::args().collect();
        let mut options = Self {
            model: None,
            romdir: None,
            config: None,
            dirs: false,
            list: false,
        };
        let mut i = 1;

        let value = |i: usize, flag: &str| -> Result<String> {
            args.get(i)
                .cloned()
                .with_context(|| format!("{} requires an argument", flag))
        };

        while i < args.len() {
            match args[i].as_str() {
                "--model" | "-m" => {
                    i += 1;
                    options.model = Some(value(i, "--model")?);
                }
                "--romdir" | "-r" => {
                    i += 1;
                    options.romdir = Some(value(i, "--romdir")?);
                }
                "--config" | "-c" => {
                    i += 1;
                    options.config = Some(PathBuf::from(value(i, "--config")?));
                }
                "--dirs" => options.dirs = true,
                "--list" | "-l" => options.list = true,
                "--help" | "-h" => {
                    eprintln!("mt32bridge - MT-32 / CM-32L ROM inspector");
                    eprintln!();
                    eprintln!(
                        "Usage: {} [OPTIONS]",
                        args.first().map_or("mt32bridge", String::as_str)
                    );
                    eprintln!();
                    eprintln!("Options:");
                    eprintln!("  -m, --model NAME    Model to select, or 'auto' (default)");
                    eprintln!("  -r, --romdir DIR    Search DIR before the standard locations");
                    eprintln!("  -c, --config FILE   Load settings from a JSON file");
                    eprintln!("      --dirs          Print the ROM directory search order");
                    eprintln!("  -l, --list          List the models present in each directory");
                    eprintln!("  -h, --help          Print this help message");
                    eprintln!();
                    eprintln!("Set RUST_LOG=debug to trace model resolution.");
                    std::process::exit(0);
                }
                other => {
                    eprintln!("Unknown option: {}", other);
                    eprintln!("Use --help for usage information");
                    std::process::exit(1);
                }
            }
            i += 1;
        }

        Ok(options)
    }

    /// Builds the effective configuration: file first, flags on top.
    fn bridge_config(&self) -> Result<BridgeConfig> {
        let mut config = match &self.config {
            Some(path) => BridgeConfig::load(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => BridgeConfig::default(),
        };
        if let Some(model) = &self.model {
            config.model = ModelSelector::from(model.clone());
        }
        if let Some(romdir) = &self.romdir {
            config.romdir = romdir.clone();
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = CliOptions::parse()?;

    // Initialize tracing for debugging (logs go to stderr)
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let catalog = ModelCatalog::builtin().context("Failed to build model catalog")?;
    let config = cli.bridge_config()?;
    config
        .validate(&catalog)
        .with_context(|| format!("Valid models: auto, {}", catalog.names().collect::<Vec<_>>().join(", ")))?;

    let dirs = search_order(Platform::current(), &SearchEnv::from_process(), &config.romdir);
    let probe = FilenameProbe::from_catalog(&catalog);

    if cli.dirs {
        println!("ROM search order:");
        for dir in &dirs {
            println!("  {}", dir);
        }
        println!();
    }

    if cli.list {
        print!(
            "{}",
            mt32bridge::rom::render_listing(&catalog, &probe, &config.model, &dirs, DEFAULT_TERM_WIDTH)
        );
        println!();
    }

    // Same order as the handler: models by priority, then directories.
    let found = catalog
        .models()
        .iter()
        .filter(|model| config.model.accepts(model))
        .find_map(|model| {
            dirs.iter()
                .find(|dir| model.is_present_in(&probe, dir))
                .map(|dir| (model, dir))
        });

    match found {
        Some((model, dir)) => {
            println!("Model {} would be loaded from {}", model.name(), dir);
            Ok(())
        }
        None => Err(BridgeError::ConfigurationNotFound {
            selector: config.model.to_string(),
            search_order: dirs,
        }
        .into()),
    }
}
