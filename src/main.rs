//! # Coregate
//!
//! Reverse proxy gateway with health-aware routing and dual
//! session/token authentication.
//!
//! ## Features
//!
//! - Path-prefix, user-affinity, and round-robin backend selection
//! - Background and opportunistic health sweeps
//! - Session-cookie and bearer-token authentication
//! - Per-request correlation ids and bounded outcome metrics
//!
//! ## Usage
//!
//! ```bash
//! # Start with a config file
//! coregate config.yaml
//!
//! # Or point at one through the environment
//! COREGATE_CONFIG=config.yaml coregate
//! ```

use coregate_server::{create_router, AppState};
use std::env;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Environment variable naming the config file when no argument is
/// given.
const CONFIG_ENV: &str = "COREGATE_CONFIG";

/// Fallback config path.
const DEFAULT_CONFIG: &str = "config.yaml";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "starting coregate");

    if let Err(e) = run().await {
        error!(error = %e, "gateway failed");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config_path = env::args()
        .nth(1)
        .or_else(|| env::var(CONFIG_ENV).ok())
        .unwrap_or_else(|| DEFAULT_CONFIG.to_string());

    let config = coregate_config::load(&config_path)?;
    info!(
        path = %config_path,
        backends = config.backends.len(),
        routes = config.routes.len(),
        "configuration loaded"
    );

    let state = AppState::from_config(&config)?;

    // Establish real health flags before accepting traffic, then keep
    // them fresh in the background.
    state.monitor.sweep().await;
    let _sweeper = Arc::clone(&state.monitor).spawn_interval(config.health.interval);

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to install shutdown handler");
        // Without a signal handler the serve loop would never stop;
        // sleep forever instead of shutting down immediately.
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
