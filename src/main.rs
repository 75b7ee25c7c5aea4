// =============================================================================
// candela -- trade ingestion and OHLC aggregation service
// =============================================================================
//
// Ingests timestamped trade events over HTTP and maintains two in-memory
// views: a bounded recency cache of raw trades per symbol, and rolling OHLC
// candles per (symbol, interval). Everything is volatile; a restart loses
// all cached trades and candle history by design.
// =============================================================================

mod api;
mod app_state;
mod market_data;
mod runtime_config;
mod types;

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::runtime_config::RuntimeConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path =
        std::env::var("CANDELA_CONFIG").unwrap_or_else(|_| "candela.json".to_string());
    let mut config = RuntimeConfig::load(&config_path).unwrap_or_else(|e| {
        warn!(error = %e, "failed to load config, using defaults");
        RuntimeConfig::default()
    });
    config.apply_env_overrides();

    info!(
        port = config.port,
        cache_limit = config.cache_limit,
        intervals = ?config.intervals,
        "candela starting"
    );

    let port = config.port;
    let state = Arc::new(AppState::new(config));
    let app = api::rest::router(state);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(addr = %addr, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("API server failed")?;

    info!("candela shut down complete");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    warn!("shutdown signal received, stopping gracefully");
}
