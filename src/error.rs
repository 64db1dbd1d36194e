// =============================================================================
// Analysis errors
// =============================================================================
//
// Single-ticker analysis surfaces every variant to its caller.  The watchlist
// ranker treats all of them as "skip this ticker".

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AnalysisError {
    /// The provider returned an empty series.
    #[error("no price data for {ticker}")]
    NoData { ticker: String },

    /// The series is shorter than a lookback window required for scoring.
    #[error(
        "insufficient history for {ticker}: {indicator} needs {required} bars, have {available}"
    )]
    InsufficientHistory {
        ticker: String,
        indicator: &'static str,
        required: usize,
        available: usize,
    },

    /// The market data provider failed.
    #[error("failed to fetch {ticker}: {message}")]
    FetchFailure { ticker: String, message: String },
}

impl AnalysisError {
    pub fn fetch_failure(ticker: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::FetchFailure {
            ticker: ticker.into(),
            message: err.to_string(),
        }
    }

    /// Ticker the error pertains to.
    pub fn ticker(&self) -> &str {
        match self {
            Self::NoData { ticker }
            | Self::InsufficientHistory { ticker, .. }
            | Self::FetchFailure { ticker, .. } => ticker,
        }
    }

    /// Short machine-readable code for API payloads.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoData { .. } => "NO_DATA",
            Self::InsufficientHistory { .. } => "INSUFFICIENT_HISTORY",
            Self::FetchFailure { .. } => "FETCH_FAILURE",
        }
    }
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_history_message_names_window() {
        let err = AnalysisError::InsufficientHistory {
            ticker: "AAPL".into(),
            indicator: "SMA200",
            required: 200,
            available: 60,
        };
        assert_eq!(
            err.to_string(),
            "insufficient history for AAPL: SMA200 needs 200 bars, have 60"
        );
        assert_eq!(err.ticker(), "AAPL");
        assert_eq!(err.code(), "INSUFFICIENT_HISTORY");
    }

    #[test]
    fn fetch_failure_keeps_provider_message() {
        let err = AnalysisError::fetch_failure("TSLA", "connection reset");
        assert_eq!(err.to_string(), "failed to fetch TSLA: connection reset");
        assert_eq!(err.code(), "FETCH_FAILURE");
    }
}
