// =============================================================================
// Analysis Report — everything shown for a single analysed ticker
// =============================================================================
//
// Wraps the decision record with the price, its EUR conversion, company
// metadata and the indicator breakdown.  Reports live only in memory.
// =============================================================================

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{AnalysisError, AnalysisResult};
use crate::indicators::rsi::rsi_label;
use crate::indicators::IndicatorSnapshot;
use crate::market_data::{fx, CompanyProfile, PriceHistory, PriceSource};
use crate::scoring::{analyze_bars, ScoredTicker, SubScores};
use crate::types::DecisionRecord;

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    /// Unique identifier for this report (UUID v4).
    pub id: String,

    pub ticker: String,

    pub profile: CompanyProfile,

    /// Latest close in the listing currency.
    pub last_close: f64,

    /// Latest close converted to EUR, when the FX rate was available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_close_eur: Option<f64>,

    pub decision: DecisionRecord,

    pub sub_scores: SubScores,

    pub indicators: IndicatorSnapshot,

    /// "OVERBOUGHT", "OVERSOLD" or "NEUTRAL".
    pub rsi_zone: &'static str,

    /// ISO 8601 timestamp of when this report was created.
    pub created_at: String,
}

impl AnalysisReport {
    pub fn new(history: &PriceHistory, scored: ScoredTicker, last_close_eur: Option<f64>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            ticker: history.ticker.clone(),
            profile: history.profile.clone(),
            last_close: history.last_close().unwrap_or_default(),
            last_close_eur,
            rsi_zone: rsi_label(scored.record.rsi),
            decision: scored.record,
            sub_scores: scored.sub_scores,
            indicators: scored.indicators,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Fetch, score and price a single ticker.
///
/// Every history or scoring error is surfaced to the caller.  Fundamentals
/// and the EUR conversion are best-effort; the conversion is skipped when the
/// listing is already in EUR.
pub async fn analyze_ticker(
    source: &dyn PriceSource,
    ticker: &str,
    fx_pair: &str,
) -> AnalysisResult<AnalysisReport> {
    let ticker = ticker.trim().to_uppercase();
    if ticker.is_empty() {
        return Err(AnalysisError::NoData { ticker });
    }

    let mut history = source.fetch_history(&ticker).await?;
    let scored = analyze_bars(&ticker, &history.bars)?;

    match source.fetch_profile(&ticker).await {
        Ok(fundamentals) => history.profile.merge(fundamentals),
        Err(e) => warn!(ticker = %ticker, error = %e, "company fundamentals unavailable"),
    }

    let last_close = history.last_close().unwrap_or_default();
    let last_close_eur = match history.profile.currency.as_deref() {
        Some("EUR") => Some(last_close),
        _ => fx::convert(source, fx_pair, last_close).await,
    };

    let report = AnalysisReport::new(&history, scored, last_close_eur);
    info!(
        ticker = %report.ticker,
        decision = %report.decision.decision,
        score = report.decision.score,
        "ticker analysed"
    );
    Ok(report)
}
