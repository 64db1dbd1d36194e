// =============================================================================
// Currency conversion via an FX pair's latest close
// =============================================================================
//
// Yahoo quotes pairs such as `EURUSD=X` as "USD per 1 EUR", so a USD amount is
// converted to EUR by dividing by the rate.

use tracing::warn;

use super::source::PriceSource;
use crate::error::{AnalysisError, AnalysisResult};

/// Convert `amount` (quote currency) into the base currency of a pair quoted
/// at `quote_per_base`.  Returns `None` for a non-positive or non-finite rate.
pub fn convert_with_rate(amount: f64, quote_per_base: f64) -> Option<f64> {
    if !quote_per_base.is_finite() || quote_per_base <= 0.0 {
        return None;
    }
    let converted = amount / quote_per_base;
    converted.is_finite().then_some(converted)
}

/// Latest close of the FX `pair` series.
pub async fn latest_rate(source: &dyn PriceSource, pair: &str) -> AnalysisResult<f64> {
    let history = source.fetch_history(pair).await?;
    history.last_close().ok_or_else(|| AnalysisError::NoData {
        ticker: pair.to_string(),
    })
}

/// Convert `amount` using the live `pair` rate; any failure is logged and
/// yields `None`.
pub async fn convert(source: &dyn PriceSource, pair: &str, amount: f64) -> Option<f64> {
    match latest_rate(source, pair).await {
        Ok(rate) => convert_with_rate(amount, rate),
        Err(e) => {
            warn!(pair, error = %e, "FX rate unavailable, skipping conversion");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::source::PriceHistory;
    use crate::types::PriceBar;
    use async_trait::async_trait;
    use chrono::NaiveDate;

    struct FixedRate(Option<f64>);

    #[async_trait]
    impl PriceSource for FixedRate {
        async fn fetch_history(&self, ticker: &str) -> AnalysisResult<PriceHistory> {
            let date = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
            let bars = self
                .0
                .map(|rate| vec![PriceBar::from_close(date, rate)])
                .unwrap_or_default();
            Ok(PriceHistory::new(ticker, bars))
        }
    }

    #[test]
    fn converts_by_dividing_by_rate() {
        let eur = convert_with_rate(216.0, 1.08).unwrap();
        assert!((eur - 200.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_degenerate_rates() {
        assert!(convert_with_rate(100.0, 0.0).is_none());
        assert!(convert_with_rate(100.0, -1.0).is_none());
        assert!(convert_with_rate(100.0, f64::NAN).is_none());
    }

    #[tokio::test]
    async fn convert_uses_latest_close() {
        let source = FixedRate(Some(1.25));
        assert_eq!(convert(&source, "EURUSD=X", 125.0).await, Some(100.0));
    }

    #[tokio::test]
    async fn empty_fx_series_yields_none() {
        let source = FixedRate(None);
        assert!(matches!(
            latest_rate(&source, "EURUSD=X").await,
            Err(AnalysisError::NoData { .. })
        ));
        assert_eq!(convert(&source, "EURUSD=X", 125.0).await, None);
    }
}
