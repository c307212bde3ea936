//! Frontplug Web Server
//!
//! Serves plugin assets and the authorization-scoped bootstrap pages.

use anyhow::Context;
use clap::Parser;
use frontplug_core::init_logging;
use frontplug_web::{FrontplugServerBuilder, WebConfig};
use std::path::PathBuf;
use tracing::info;

/// Frontplug - plugin asset gateway and bootstrap page server
#[derive(Parser)]
#[command(name = "frontplug")]
#[command(about = "Serves plugin assets and bootstrap pages")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server host to bind to
    #[arg(long)]
    host: Option<String>,

    /// Server port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Plugin bundle directory
    #[arg(long)]
    assets_dir: Option<PathBuf>,

    /// JSON file backing the configuration store
    #[arg(long)]
    store: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,

    /// Enable development mode
    #[arg(long)]
    dev: bool,
}

impl Args {
    fn apply(self, config: &mut WebConfig) {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(assets_dir) = self.assets_dir {
            config.assets_dir = assets_dir;
        }
        if let Some(store) = self.store {
            config.store_path = Some(store);
        }
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
        if self.dev {
            config.dev_mode = true;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load environment variables
    dotenvy::dotenv().ok();

    let mut config =
        WebConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    args.apply(&mut config);

    init_logging(&config.logging)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!(
        address = %config.address(),
        dev_mode = config.dev_mode,
        store = ?config.store_path,
        "Starting frontplug"
    );

    let server = FrontplugServerBuilder::from_config(config)
        .build()
        .await
        .context("Failed to build server")?;

    server.start().await.context("Server error")?;

    Ok(())
}
