//! Perpetual futures smart-alert bot - entry point.

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Perpetual futures ticker smart-alert bot
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via PERPWATCH_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    perpwatch_bot::logging::init_logging();

    info!("Starting perpwatch bot v{}", env!("CARGO_PKG_VERSION"));

    // Config path: CLI arg > PERPWATCH_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("PERPWATCH_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    info!(config_path = %config_path, "Loading configuration");
    let config = perpwatch_bot::AppConfig::load_or_default(&config_path)?;
    info!(rest_url = %config.rest_url, alerts = config.alerts.len(), "Configuration loaded");

    let app = perpwatch_bot::Application::new(config)?;
    app.run().await?;

    Ok(())
}
