//! Quill API server binary.
//!
//! Usage:
//!   quill --config quill.toml
//!   quill --port 8080 --bind 0.0.0.0
//!
//! # Environment Variables
//!
//! - `QUILL_API_KEY` - API authentication key (recommended)
//! - `QUILL_CONFIG` - Path to the config file
//! - `OPENAI_API_KEY` / `ANTHROPIC_API_KEY` - Completion provider keys
//! - `TAVILY_API_KEY` - Web search key

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use quill_api::{ApiKeyConfig, AppState, QuillConfig, serve};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "quill", version, about = "Quill research and generation API server")]
struct Cli {
    /// Path to quill.toml
    #[arg(short, long, env = "QUILL_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on (overrides the config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Bind address (overrides the config file)
    #[arg(short, long, env = "QUILL_BIND_ADDR")]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,quill_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => {
            info!(path = %path.display(), "Loading configuration");
            QuillConfig::from_file(path)?
        }
        None => {
            info!("Using default configuration");
            QuillConfig::default()
        }
    };

    let host = cli.bind.unwrap_or_else(|| config.server.bind.clone());
    let port = cli.port.unwrap_or(config.server.port);

    if host == "0.0.0.0" {
        warn!(
            "Server binding to 0.0.0.0 exposes the API to all network interfaces. \
             Ensure QUILL_API_KEY is set and a firewall is in place."
        );
    }

    let mut state = AppState::from_config(&config)?;

    match ApiKeyConfig::from_env() {
        Some(api_key) => {
            state = state.with_api_key(api_key);
            info!("API key authentication enabled");
        }
        None => warn!(
            "QUILL_API_KEY not set. The API will run without authentication, \
             which is acceptable for local development only."
        ),
    }

    let addr: SocketAddr = format!("{host}:{port}").parse()?;
    serve(Arc::new(state), addr).await
}
