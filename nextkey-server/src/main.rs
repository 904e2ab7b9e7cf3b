//! NextKey licensing server.
//!
//! Usage:
//!   nextkey-server --config nextkey.toml
//!
//! Settings can also be given as `NEXTKEY__SECTION__FIELD` environment
//! variables.

use anyhow::{Context, Result};
use clap::Parser;
use nextkey_crypto::CipherRegistry;
use nextkey_server::{AppState, ServerConfig, build_router, maintenance, serve};
use nextkey_store::SqliteStore;
use nextkey_types::SystemClock;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "nextkey-server")]
#[command(about = "NextKey licensing server")]
struct Args {
    /// Configuration file (YAML or TOML)
    #[arg(short, long, env = "NEXTKEY_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .compact()
        .init();

    let mut config = ServerConfig::load(args.config.as_deref())?;
    if config.ensure_jwt_secret() {
        warn!("security.jwt_secret not set; generated a temporary one, admin sessions end on restart");
    }
    config.validate(&CipherRegistry::with_defaults())?;
    info!(?config, "configuration loaded");

    let store = SqliteStore::new(&config.database.path)
        .with_context(|| format!("opening database {}", config.database.path))?;
    let bind_addr = config.server.bind_addr.clone();
    let state = AppState::new(config, Arc::new(store), Arc::new(SystemClock));
    state.bootstrap_admin()?;

    let _maintenance = maintenance::spawn(state.clone());

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {bind_addr}"))?;
    info!(addr = %bind_addr, "NextKey listening");

    serve(listener, build_router(state), shutdown_signal()).await?;
    info!("NextKey stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
