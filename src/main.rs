// =============================================================================
// Market Pulse — Main Entry Point
// =============================================================================
//
// Fetches daily prices for one ticker, derives moving averages and VWAP, and
// publishes three chart specifications on a fixed timer. The renderer polls
// them from the handoff API.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod alphavantage;
mod api;
mod app_state;
mod charts;
mod error;
mod indicators;
mod market_data;
mod portfolio;
mod refresh;
mod runtime_config;
mod types;

use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::alphavantage::AlphaVantageClient;
use crate::app_state::AppState;
use crate::indicators::IndicatorEngine;
use crate::portfolio::SyntheticPortfolio;
use crate::refresh::RefreshPipeline;
use crate::runtime_config::RuntimeConfig;

const CONFIG_PATH: &str = "dashboard_config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Market Pulse starting up");

    let mut config = RuntimeConfig::load_or_create(CONFIG_PATH).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        RuntimeConfig::default()
    });

    if let Ok(symbol) = std::env::var("DASHBOARD_SYMBOL") {
        if !symbol.trim().is_empty() {
            config.symbol = symbol;
        }
    }
    if let Ok(addr) = std::env::var("DASHBOARD_BIND_ADDR") {
        config.bind_addr = addr;
    }

    config.normalize();
    config.validate().context("invalid dashboard configuration")?;

    info!(
        symbol = %config.symbol,
        output_size = %config.output_size,
        ma_windows = ?config.ma_windows,
        refresh_secs = config.refresh_interval_secs,
        "Configuration loaded"
    );

    // ── 2. Build the pipeline ────────────────────────────────────────────
    let api_key = std::env::var("ALPHAVANTAGE_API_KEY")
        .context("ALPHAVANTAGE_API_KEY must be set (environment or .env)")?;

    let client = AlphaVantageClient::new(
        api_key,
        config.api_base_url.clone(),
        config.request_timeout(),
    )?;
    let engine = IndicatorEngine::new(&config.ma_windows)?;
    info!(windows = ?engine.windows(), "Indicator engine ready");
    let portfolio = SyntheticPortfolio::new(config.portfolio.clone())?;

    let pipeline = Arc::new(RefreshPipeline::new(
        Arc::new(client),
        Arc::new(portfolio),
        engine,
        config.symbol.clone(),
        config.output_size,
    ));

    let state = Arc::new(AppState::new());

    // ── 3. Spawn the refresh loop ────────────────────────────────────────
    {
        let state = state.clone();
        let pipeline = pipeline.clone();
        let period = config.refresh_interval();
        tokio::spawn(async move {
            refresh::run_refresh_loop(state, pipeline, period).await;
        });
    }

    // ── 4. Start the API server ──────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind API server on {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, "API server listening");

    let app = api::rest::router(state.clone());
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "API server failed");
        }
    });

    // ── 5. Wait for shutdown ─────────────────────────────────────────────
    tokio::signal::ctrl_c().await?;
    let stats = state.stats();
    info!(
        ticks = stats.ticks_seen,
        succeeded = stats.succeeded,
        failed = stats.failed,
        skipped = stats.skipped,
        "Shutdown signal received, exiting"
    );

    Ok(())
}
