use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use monas_p256_account::config::AccountConfig;
use monas_p256_account::presentation;

/// Account service CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "monas-p256-account")]
#[command(about = "Monas account service with pluggable public key types")]
struct Args {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// HTTP listen address, overrides the configuration file.
    #[arg(short = 'l', long)]
    listen: Option<SocketAddr>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .init();

    let mut config = match &args.config {
        Some(path) => AccountConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => AccountConfig::default(),
    };
    if let Some(listen) = args.listen {
        config.server.listen = listen;
    }

    let addr = config.server.listen;
    tracing::info!(
        "Supported key types: {}",
        config
            .supported_key_types
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );

    let app = presentation::create_router(config);

    tracing::info!("monas-p256-account server listening on http://{}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
