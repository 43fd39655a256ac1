// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
use agr_server::{build_app, AppState};
use agr_store::MemoryStore;
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "agr-server", version, about = "Agent registry control plane")]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Bind address override.
    #[arg(long)]
    bind: Option<String>,

    /// Enable request/response debug logging.
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = agr_config::load_config(args.config.as_deref()).context("load config")?;
    if let Some(bind) = args.bind {
        config.bind = bind;
    }

    let level = if args.debug {
        "agr=debug,agr_server=debug".to_string()
    } else {
        format!("agr={}", config.log_level.as_deref().unwrap_or("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(level))
        .init();

    let warnings = agr_config::validate_config(&config).context("validate config")?;
    for warning in &warnings {
        warn!(%warning, "config warning");
    }

    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(store, config.clone());
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("bind {}", config.bind))?;
    info!(
        bind = %config.bind,
        external_url = %config.external_url,
        "agr-server listening"
    );

    axum::serve(listener, app).await.context("serve")
}
