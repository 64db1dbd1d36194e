// =============================================================================
// Equity Signal — Main Entry Point
// =============================================================================
//
// Loads the runtime config, wires a cached Yahoo Finance client into the
// shared state and serves the REST API until Ctrl-C.
// =============================================================================

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use equity_signal::api;
use equity_signal::app_state::AppState;
use equity_signal::indicators::sma::SMA_SLOW;
use equity_signal::market_data::CachedPriceSource;
use equity_signal::runtime_config::RuntimeConfig;
use equity_signal::yahoo::YahooClient;

const DEFAULT_CONFIG_PATH: &str = "runtime_config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Equity Signal starting up");

    let config_path =
        std::env::var("SIGNAL_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let mut config = RuntimeConfig::load(&config_path).unwrap_or_else(|e| {
        warn!(error = %e, path = %config_path, "Failed to load config, using defaults");
        let defaults = RuntimeConfig::default();
        // Leave a template behind for the operator to edit.
        if !std::path::Path::new(&config_path).exists() {
            if let Err(e) = defaults.save(&config_path) {
                warn!(error = %e, path = %config_path, "Failed to write default config");
            }
        }
        defaults
    });

    if let Ok(list) = std::env::var("SIGNAL_WATCHLIST") {
        config.apply_watchlist_override(&list);
    }
    if let Ok(addr) = std::env::var("SIGNAL_BIND_ADDR") {
        if !addr.trim().is_empty() {
            config.bind_addr = addr.trim().to_string();
        }
    }

    info!(watchlist = ?config.watchlist, top_k = config.top_k, "Configured watchlist");
    if let Some(days) = config.history_trading_days().filter(|&d| d < SMA_SLOW) {
        warn!(
            range = %config.history_range,
            days,
            required = SMA_SLOW,
            "History range is too short for SMA200; every analysis will fail"
        );
    }

    // ── 2. Market data ───────────────────────────────────────────────────
    let yahoo = YahooClient::new(
        config.yahoo_base_url.clone(),
        config.history_range.clone(),
        config.history_interval.clone(),
    )?;
    let cache = Arc::new(CachedPriceSource::new(yahoo, config.cache_ttl()));

    // Periodically drop stale histories so the cache does not grow with
    // every ticker ever requested.
    if !config.cache_ttl().is_zero() {
        let cache = Arc::clone(&cache);
        let period = config.cache_ttl();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                let purged = cache.purge_expired();
                if purged > 0 {
                    info!(purged, remaining = cache.len(), "Price cache purged");
                }
            }
        });
    }

    // ── 3. Shared state & API server ─────────────────────────────────────
    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState::new(config, cache));
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind API server to {bind_addr}"))?;
    info!(addr = %bind_addr, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await
        .context("API server failed")?;

    info!("Equity Signal stopped");
    Ok(())
}
