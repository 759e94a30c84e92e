//! Neo Events server binary.

use anyhow::Context;
use axum::ServiceExt;
use clap::Parser;
use neo_server::{
    api::{create_app, AppState},
    config::ServerConfig,
    observability::{init_logging, LogFormat},
};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Neo Events - shared calendars with version history
#[derive(Parser, Debug)]
#[command(name = "neo-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML, TOML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// API listen address
    #[arg(long)]
    api_addr: Option<SocketAddr>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Log format (pretty, json)
    #[arg(long)]
    log_format: Option<String>,
}

impl Args {
    /// Flags override file and environment values.
    fn apply(self, config: &mut ServerConfig) {
        if let Some(addr) = self.api_addr {
            config.api_addr = addr;
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }
        if let Some(format) = self.log_format {
            config.log_format = LogFormat::parse(&format);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = ServerConfig::load(args.config.as_deref()).context("loading configuration")?;
    args.apply(&mut config);

    init_logging(&config.log_level, config.log_format);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting Neo Events server");
    tracing::info!(
        api_addr = %config.api_addr,
        api_prefix = %config.api_prefix,
        access_token_ttl_minutes = config.access_token_ttl_minutes,
        refresh_token_ttl_days = config.refresh_token_ttl_days,
        "Server configuration"
    );

    let app = create_app(AppState::from_config(&config), &config);

    let listener = tokio::net::TcpListener::bind(config.api_addr)
        .await
        .with_context(|| format!("binding {}", config.api_addr))?;

    tracing::info!(addr = %config.api_addr, "Listening");

    axum::serve(
        listener,
        ServiceExt::<axum::extract::Request>::into_make_service(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
