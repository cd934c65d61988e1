//! Asset Safe API Server
//!
//! Run with: cargo run --bin assetsafe
//!
//! # Configuration
//!
//! Settings are read from `--config <path>` or the default config locations,
//! then overridden by `ASSETSAFE_*` environment variables. `RUST_LOG` takes
//! precedence over the configured log level.

use anyhow::Context;
use assetsafe::api::{serve, AppState};
use assetsafe::config::{Config, LoggingConfig};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "assetsafe")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Asset Safe API server")]
struct Args {
    /// Config file (default: search the standard locations)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_with_env(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => Config::load_default(),
    };

    init_tracing(&config.logging);

    tracing::info!("Starting Asset Safe API server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Data directory: {:?}", config.data_dir());
    tracing::info!(
        follow_up_secs = config.assistant.follow_up_secs,
        max_sessions = config.assistant.max_sessions,
        "Assistant configured"
    );

    let state = AppState::from_config(&config).context("Failed to initialize services")?;
    let api_config = state.config.as_ref().clone();

    serve(state, &api_config).await?;

    tracing::info!("Asset Safe shutdown complete");
    Ok(())
}

/// Install the global subscriber: pretty or JSON lines, filtered by `RUST_LOG`
/// or the configured level
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "assetsafe={},tower_http=info",
            logging.level
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);

    if logging.format.eq_ignore_ascii_case("json") {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
