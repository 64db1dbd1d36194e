// =============================================================================
// Central Application State
// =============================================================================
//
// Ties the price source, runtime configuration and the in-memory report and
// error logs together for the REST handlers.
//
// Thread safety:
//   - Atomic counter for lock-free version tracking.
//   - parking_lot::RwLock for all mutable shared collections.
//   - The price source manages its own interior mutability (cache).
// =============================================================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use serde::Serialize;

use crate::error::AnalysisError;
use crate::market_data::PriceSource;
use crate::report::AnalysisReport;
use crate::runtime_config::RuntimeConfig;

/// Maximum number of recent errors to retain.
const MAX_RECENT_ERRORS: usize = 50;

/// A failed analysis, kept for the error log.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    pub ticker: String,
    /// Machine-readable error code, e.g. `INSUFFICIENT_HISTORY`.
    pub code: &'static str,
    pub message: String,
    /// ISO 8601 timestamp.
    pub at: String,
}

/// Shared across all handlers via `Arc<AppState>`.
pub struct AppState {
    /// Incremented whenever a report or error is recorded.
    pub state_version: AtomicU64,

    pub runtime_config: Arc<RwLock<RuntimeConfig>>,

    /// Where histories come from; normally a cached Yahoo client.
    pub source: Arc<dyn PriceSource>,

    pub recent_reports: RwLock<Vec<AnalysisReport>>,
    pub recent_errors: RwLock<Vec<ErrorRecord>>,

    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(config: RuntimeConfig, source: Arc<dyn PriceSource>) -> Self {
        Self {
            state_version: AtomicU64::new(1),
            runtime_config: Arc::new(RwLock::new(config)),
            source,
            recent_reports: RwLock::new(Vec::new()),
            recent_errors: RwLock::new(Vec::new()),
            start_time: std::time::Instant::now(),
        }
    }

    pub fn increment_version(&self) -> u64 {
        self.state_version.fetch_add(1, Ordering::SeqCst)
    }

    pub fn current_state_version(&self) -> u64 {
        self.state_version.load(Ordering::SeqCst)
    }

    /// Record a report.  The log is capped at `max_recent_reports`; the
    /// oldest entries are evicted first.
    pub fn push_report(&self, report: AnalysisReport) {
        let cap = self.runtime_config.read().max_recent_reports;

        let mut reports = self.recent_reports.write();
        reports.push(report);
        if reports.len() > cap {
            let excess = reports.len() - cap;
            reports.drain(..excess);
        }
        drop(reports);

        self.increment_version();
    }

    /// Record a failed analysis, capped at [`MAX_RECENT_ERRORS`].
    pub fn push_error(&self, error: &AnalysisError) {
        let record = ErrorRecord {
            ticker: error.ticker().to_string(),
            code: error.code(),
            message: error.to_string(),
            at: Utc::now().to_rfc3339(),
        };

        let mut errors = self.recent_errors.write();
        errors.push(record);
        if errors.len() > MAX_RECENT_ERRORS {
            let excess = errors.len() - MAX_RECENT_ERRORS;
            errors.drain(..excess);
        }
        drop(errors);

        self.increment_version();
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisResult;
    use crate::indicators::IndicatorSnapshot;
    use crate::market_data::{CompanyProfile, PriceHistory};
    use crate::scoring::SubScores;
    use crate::types::{Decision, DecisionRecord};
    use async_trait::async_trait;

    struct NoSource;

    #[async_trait]
    impl PriceSource for NoSource {
        async fn fetch_history(&self, ticker: &str) -> AnalysisResult<PriceHistory> {
            Err(AnalysisError::NoData {
                ticker: ticker.to_string(),
            })
        }
    }

    fn report(ticker: &str, score: i32) -> AnalysisReport {
        AnalysisReport {
            id: format!("{ticker}-{score}"),
            ticker: ticker.to_string(),
            profile: CompanyProfile::default(),
            last_close: 10.0,
            last_close_eur: None,
            decision: DecisionRecord {
                ticker: ticker.to_string(),
                decision: Decision::from_score(score),
                score,
                rsi: 50.0,
                volatility_pct: 1.0,
            },
            sub_scores: SubScores::default(),
            indicators: IndicatorSnapshot::default(),
            rsi_zone: "NEUTRAL",
            created_at: Utc::now().to_rfc3339(),
        }
    }

    fn state(max_reports: usize) -> AppState {
        let config = RuntimeConfig {
            max_recent_reports: max_reports,
            ..RuntimeConfig::default()
        };
        AppState::new(config, Arc::new(NoSource))
    }

    #[test]
    fn report_log_evicts_oldest() {
        let state = state(2);
        state.push_report(report("AAPL", 2));
        state.push_report(report("MSFT", 0));
        state.push_report(report("AAPL", 3));

        let reports = state.recent_reports.read();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].ticker, "MSFT");
        assert_eq!(reports[1].id, "AAPL-3");
    }

    #[test]
    fn errors_are_logged_with_code_and_bump_version() {
        let state = state(10);
        let before = state.current_state_version();
        state.push_error(&AnalysisError::InsufficientHistory {
            ticker: "NEW".into(),
            indicator: "SMA200",
            required: 200,
            available: 60,
        });
        assert_eq!(state.current_state_version(), before + 1);

        let errors = state.recent_errors.read();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, "INSUFFICIENT_HISTORY");
        assert_eq!(errors[0].ticker, "NEW");
    }

    #[test]
    fn error_log_keeps_only_the_newest() {
        let state = state(10);
        for i in 0..MAX_RECENT_ERRORS + 5 {
            state.push_error(&AnalysisError::NoData {
                ticker: format!("T{i}"),
            });
        }

        let errors = state.recent_errors.read();
        assert_eq!(errors.len(), MAX_RECENT_ERRORS);
        assert_eq!(errors[0].ticker, "T5");
        assert_eq!(errors[MAX_RECENT_ERRORS - 1].ticker, format!("T{}", MAX_RECENT_ERRORS + 4));
    }
}
