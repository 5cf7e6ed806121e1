//! frame-rest CLI server
//!
//! ```sh
//! # Run with default config (~/.config/frame-rest/config.toml)
//! frame-rest
//!
//! # Custom config path
//! frame-rest --config /etc/frame-rest/config.toml
//!
//! # Try it without any data files
//! frame-rest --demo --port 8080
//!
//! # Validate config without starting
//! frame-rest --check
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};

use frame_rest::config::{AppConfig, CONFIG_ENV_VAR};
use frame_rest::server::{init_tracing, ServerHandle, ServerOptions, DEMO_DATASET};

/// REST CRUD resources over in-memory tables.
#[derive(Parser, Debug)]
#[command(
    name = "frame-rest",
    version,
    about = "Serve in-memory tables as paginated REST resources",
    long_about = "frame-rest exposes tables loaded from JSON files as CRUD resources \
                  with limit/offset pagination.\n\n\
                  Default config: ~/.config/frame-rest/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,

    /// Override the listen port.
    #[arg(short, long)]
    port: Option<u16>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Validate the configuration file and exit without starting the server.
    #[arg(long)]
    check: bool,

    /// Register a built-in sample dataset.
    #[arg(long)]
    demo: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config_path = cli.config.unwrap_or_else(frame_rest::default_config_path);

    let loaded = AppConfig::load(&config_path);
    if cli.check {
        let config = loaded?;
        println!("Configuration is valid");
        println!("   Config file : {}", config_path.display());
        println!("   Address     : {}", config.server.address());
        println!("   Log level   : {}", config.logging.level);
        println!("   Datasets    : {}", config.datasets.len());
        for dataset in &config.datasets {
            println!(
                "     - {} ({}, actions: {})",
                dataset.name,
                dataset.format,
                dataset.actions.join(", ")
            );
        }
        return Ok(());
    }

    let mut config = match loaded {
        Ok(mut cfg) => {
            if let Some(ref level) = cli.log_level {
                cfg.logging.level = level.clone();
            }
            init_tracing(&cfg);
            info!("Configuration loaded from {}", config_path.display());
            cfg
        }
        Err(e) => {
            let mut cfg = AppConfig::default();
            if let Some(ref level) = cli.log_level {
                cfg.logging.level = level.clone();
            }
            init_tracing(&cfg);
            error!("Failed to load config from {}: {}", config_path.display(), e);
            error!("Using default configuration.");
            cfg
        }
    };

    if let Some(port) = cli.port {
        info!("CLI override: port = {}", port);
        config.server.port = port;
    }
    if cli.demo {
        info!("Registering demo dataset '{}'", DEMO_DATASET);
    }

    let handle = ServerHandle::start(ServerOptions {
        config,
        demo: cli.demo,
    })
    .await?;

    handle.install_signal_handler();
    info!("Press Ctrl+C to shut down gracefully.");

    handle.shutdown_signal().wait().await;
    handle.wait().await;

    Ok(())
}
