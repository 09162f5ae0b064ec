//! # monkey-server
//!
//! REST API for MONKey, the social habit tracker.
//!
//! This binary provides:
//! - **Shared tasks** anyone can create, complete (toggle) and vote to delete
//! - **Weekly leaderboard** over the caller and the users they follow
//! - **Chatroom** with per-user read receipts and an unread counter
//! - **Accounts, friends and resource links** for the web client
//! - **Per-IP rate limiting** sized for the client's polling loops

mod api;
mod config;
mod error;
mod extract;
mod rate_limit;

use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

use monkey_store::Database;

use crate::api::AppState;
use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new("info,monkey_server=debug,monkey_store=debug")
            }),
        )
        .init();

    info!("Starting MONKey server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Open the database (runs migrations)
    // -----------------------------------------------------------------------
    let db = match &config.database_path {
        Some(path) => Database::open_at(path)?,
        None => Database::new()?,
    };
    if let Some(path) = db.path() {
        info!(path = %path.display(), "Database ready");
    }

    let http_addr = config.http_addr;
    let app_state = AppState::new(db, config);

    // -----------------------------------------------------------------------
    // 4. Spawn background tasks
    // -----------------------------------------------------------------------

    // Rate limiter cleanup (every 5 minutes, forget clients idle >10 min)
    let limiter = app_state.rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(300));
        loop {
            interval.tick().await;
            let evicted = limiter.evict_idle(Duration::from_secs(600)).await;
            if evicted > 0 {
                tracing::debug!(evicted, "rate limiter buckets evicted");
            }
        }
    });

    // -----------------------------------------------------------------------
    // 5. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(app_state, http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
