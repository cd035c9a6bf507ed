//! Binary crate for the `multiweather` HTTP service.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Loading configuration and building the provider set
//! - Serving the HTTP routes

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use multiweather_core::Config;
use tracing_subscriber::EnvFilter;

mod routes;

#[derive(Debug, Parser)]
#[command(name = "multiweather-server", version, about = "Aggregating weather HTTP service")]
struct Args {
    /// Path to a TOML config file; defaults to the platform config directory.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Port to listen on; overrides the config file.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let port = args.port.or(config.listen_port).unwrap_or(8080);

    let state = Arc::new(routes::AppState::from_config(&config)?);
    tracing::info!(
        port,
        providers = state.aggregator.provider_count(),
        "starting multiweather server"
    );

    warp::serve(routes::api(state)).run(([0, 0, 0, 0], port)).await;

    Ok(())
}
