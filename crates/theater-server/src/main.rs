//! Theater matchmaking server.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use theater_server::config::Settings;
use theater_server::server;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "theater-server", about = "Theater matchmaking server")]
struct Cli {
    /// Settings file; missing means defaults.
    #[arg(short, long, default_value = "theater.toml")]
    config: PathBuf,

    /// Theater port, overrides the file and THEATER_PORT.
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let mut settings = Settings::load(&cli.config)?;
    settings.apply_env()?;
    if let Some(port) = cli.port {
        settings.theater.port = port;
    }

    info!(
        "Starting theater-server on {}:{} (config = {})",
        settings.bind_addr,
        settings.theater.port,
        cli.config.display()
    );

    server::run(settings).await.context("theater server stopped")
}
