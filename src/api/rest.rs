// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/`.  Single-ticker endpoints surface every
// analysis error as a JSON body with a matching status code; the top-buys
// ranking is best-effort and never fails because of one ticker.
//
// CORS is configured permissively for development.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::app_state::AppState;
use crate::error::AnalysisError;
use crate::indicators::{compute_indicator_series, IndicatorSeries};
use crate::market_data::CompanyProfile;
use crate::ranking::rank_watchlist_concurrent;
use crate::report::{analyze_ticker, AnalysisReport};
use crate::types::DecisionRecord;

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/analyze/:ticker", get(analyze))
        .route("/api/v1/indicators/:ticker", get(indicators))
        .route("/api/v1/top-buys", get(top_buys))
        .route("/api/v1/config", get(config))
        .route("/api/v1/reports", get(reports))
        .route("/api/v1/errors", get(errors))
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Error mapping
// =============================================================================

/// An [`AnalysisError`] rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub AnalysisError);

impl From<AnalysisError> for ApiError {
    fn from(e: AnalysisError) -> Self {
        Self(e)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0 {
            AnalysisError::NoData { .. } => StatusCode::NOT_FOUND,
            AnalysisError::InsufficientHistory { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AnalysisError::FetchFailure { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.0.to_string(),
            "code": self.0.code(),
            "ticker": self.0.ticker(),
        });
        (self.status(), Json(body)).into_response()
    }
}

/// Log and record a failed single-ticker request before it is returned.
fn reject(state: &AppState, e: AnalysisError) -> ApiError {
    warn!(ticker = e.ticker(), code = e.code(), error = %e, "analysis request failed");
    state.push_error(&e);
    ApiError(e)
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    state_version: u64,
    uptime_secs: u64,
    server_time: i64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        state_version: state.current_state_version(),
        uptime_secs: state.uptime_secs(),
        server_time: chrono::Utc::now().timestamp_millis(),
    })
}

// =============================================================================
// Single-ticker analysis
// =============================================================================

async fn analyze(
    State(state): State<Arc<AppState>>,
    Path(ticker): Path<String>,
) -> Result<Json<AnalysisReport>, ApiError> {
    let fx_pair = state.runtime_config.read().fx_pair.clone();

    let report = analyze_ticker(state.source.as_ref(), &ticker, &fx_pair)
        .await
        .map_err(|e| reject(&state, e))?;

    state.push_report(report.clone());
    Ok(Json(report))
}

#[derive(Serialize)]
struct IndicatorsResponse {
    ticker: String,
    profile: CompanyProfile,
    series: IndicatorSeries,
}

async fn indicators(
    State(state): State<Arc<AppState>>,
    Path(ticker): Path<String>,
) -> Result<Json<IndicatorsResponse>, ApiError> {
    let ticker = ticker.trim().to_uppercase();

    let history = state
        .source
        .fetch_history(&ticker)
        .await
        .map_err(|e| reject(&state, e))?;

    Ok(Json(IndicatorsResponse {
        series: compute_indicator_series(&history.bars),
        ticker,
        profile: history.profile,
    }))
}

// =============================================================================
// Watchlist ranking
// =============================================================================

#[derive(Deserialize)]
struct TopBuysQuery {
    #[serde(default)]
    k: Option<usize>,
}

#[derive(Serialize)]
struct TopBuysResponse {
    top_k: usize,
    watchlist_size: usize,
    buys: Vec<DecisionRecord>,
}

async fn top_buys(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TopBuysQuery>,
) -> impl IntoResponse {
    let (watchlist, top_k, max_concurrency) = {
        let config = state.runtime_config.read();
        (
            config.watchlist.clone(),
            query.k.unwrap_or(config.top_k),
            config.max_concurrency,
        )
    };

    let buys =
        rank_watchlist_concurrent(&watchlist, Arc::clone(&state.source), top_k, max_concurrency)
            .await;
    info!(top_k, buys = buys.len(), "top buys served");

    Json(TopBuysResponse {
        top_k,
        watchlist_size: watchlist.len(),
        buys,
    })
}

// =============================================================================
// Configuration and in-memory logs
// =============================================================================

async fn config(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let config = state.runtime_config.read().clone();
    Json(config)
}

async fn reports(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let reports = state.recent_reports.read().clone();
    Json(reports)
}

async fn errors(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let errors = state.recent_errors.read().clone();
    Json(errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisResult;
    use crate::market_data::{PriceHistory, PriceSource};
    use crate::runtime_config::RuntimeConfig;
    use crate::types::PriceBar;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::{Duration, NaiveDate};
    use serde_json::Value;
    use tower::ServiceExt;

    struct StubSource;

    fn bars(closes: impl Iterator<Item = f64>) -> Vec<PriceBar> {
        let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        closes
            .enumerate()
            .map(|(i, c)| PriceBar::from_close(start + Duration::days(i as i64), c))
            .collect()
    }

    #[async_trait]
    impl PriceSource for StubSource {
        async fn fetch_history(&self, ticker: &str) -> AnalysisResult<PriceHistory> {
            match ticker {
                // Linear 100 -> 350: scores +2 (BUY).
                "AAPL" | "MSFT" => Ok(PriceHistory::new(
                    ticker,
                    bars((0..250).map(|i| 100.0 + i as f64 * 250.0 / 249.0)),
                )),
                "FLAT" => Ok(PriceHistory::new(ticker, bars((0..250).map(|_| 10.0)))),
                "NEW" => Ok(PriceHistory::new(ticker, bars((0..60).map(|_| 10.0)))),
                "DOWN" => Err(AnalysisError::fetch_failure(ticker, "connection reset")),
                _ => Err(AnalysisError::NoData {
                    ticker: ticker.to_string(),
                }),
            }
        }
    }

    fn test_state() -> Arc<AppState> {
        let config = RuntimeConfig {
            watchlist: ["AAPL", "FLAT", "NOPE", "MSFT", "NEW"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            ..RuntimeConfig::default()
        };
        Arc::new(AppState::new(config, Arc::new(StubSource)))
    }

    async fn get(state: &Arc<AppState>, uri: &str) -> (StatusCode, Value) {
        let resp = router(Arc::clone(state))
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let state = test_state();
        let (status, body) = get(&state, "/api/v1/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn analyze_returns_report_and_records_it() {
        let state = test_state();
        let (status, body) = get(&state, "/api/v1/analyze/aapl").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ticker"], "AAPL");
        assert_eq!(body["decision"]["decision"], "BUY");
        assert_eq!(body["decision"]["score"], 2);
        assert_eq!(body["sub_scores"]["trend"], 1);
        assert!(body.get("last_close_eur").is_none());

        let (_, reports) = get(&state, "/api/v1/reports").await;
        assert_eq!(reports.as_array().unwrap().len(), 1);
        assert_eq!(reports[0]["id"], body["id"]);
    }

    #[tokio::test]
    async fn analysis_errors_map_to_status_codes() {
        let state = test_state();

        let (status, body) = get(&state, "/api/v1/analyze/NOPE").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NO_DATA");

        let (status, body) = get(&state, "/api/v1/analyze/NEW").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "INSUFFICIENT_HISTORY");
        assert!(body["error"].as_str().unwrap().contains("SMA200"));

        let (status, body) = get(&state, "/api/v1/analyze/DOWN").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["ticker"], "DOWN");

        let (_, errors) = get(&state, "/api/v1/errors").await;
        assert_eq!(errors.as_array().unwrap().len(), 3);
        assert!(state.recent_reports.read().is_empty());
    }

    #[tokio::test]
    async fn indicators_return_aligned_series() {
        let state = test_state();
        let (status, body) = get(&state, "/api/v1/indicators/FLAT").await;
        assert_eq!(status, StatusCode::OK);
        let series = &body["series"];
        assert_eq!(series["closes"].as_array().unwrap().len(), 250);
        assert_eq!(series["sma200"].as_array().unwrap().len(), 250);
        assert!(series["sma200"][198].is_null());
        assert_eq!(series["sma200"][199], 10.0);
        assert_eq!(series["dates"][0], "2023-01-02");
    }

    #[tokio::test]
    async fn top_buys_skips_failures_and_honours_k() {
        let state = test_state();

        let (status, body) = get(&state, "/api/v1/top-buys").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["watchlist_size"], 5);
        let tickers: Vec<&str> = body["buys"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["ticker"].as_str().unwrap())
            .collect();
        assert_eq!(tickers, vec!["AAPL", "MSFT"]);

        let (_, body) = get(&state, "/api/v1/top-buys?k=1").await;
        assert_eq!(body["top_k"], 1);
        assert_eq!(body["buys"].as_array().unwrap().len(), 1);
        assert_eq!(body["buys"][0]["ticker"], "AAPL");
    }

    #[tokio::test]
    async fn config_is_exposed() {
        let state = test_state();
        let (status, body) = get(&state, "/api/v1/config").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["top_k"], 5);
        assert_eq!(body["watchlist"][0], "AAPL");
    }
}
