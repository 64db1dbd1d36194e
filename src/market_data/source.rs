use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisResult;
use crate::types::PriceBar;

/// Descriptive metadata the provider returns alongside the bars.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exchange: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    /// Market capitalisation in the listing currency.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forward_pe: Option<f64>,
    /// Trailing dividend yield as a fraction (0.005 = 0.5 %).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dividend_yield: Option<f64>,
}

impl CompanyProfile {
    /// Fill every field still missing here from `other`.  Fields already
    /// set are kept.
    pub fn merge(&mut self, other: CompanyProfile) {
        fn fill<T>(slot: &mut Option<T>, value: Option<T>) {
            if slot.is_none() {
                *slot = value;
            }
        }
        fill(&mut self.name, other.name);
        fill(&mut self.currency, other.currency);
        fill(&mut self.exchange, other.exchange);
        fill(&mut self.sector, other.sector);
        fill(&mut self.industry, other.industry);
        fill(&mut self.market_cap, other.market_cap);
        fill(&mut self.forward_pe, other.forward_pe);
        fill(&mut self.dividend_yield, other.dividend_yield);
    }
}

/// Daily bars for one ticker, ascending by date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistory {
    pub ticker: String,
    pub profile: CompanyProfile,
    pub bars: Vec<PriceBar>,
}

impl PriceHistory {
    pub fn new(ticker: impl Into<String>, bars: Vec<PriceBar>) -> Self {
        Self {
            ticker: ticker.into(),
            profile: CompanyProfile::default(),
            bars,
        }
    }

    pub fn last_close(&self) -> Option<f64> {
        self.bars.last().map(|b| b.close)
    }
}

/// Anything that can hand the engine a daily price history for a ticker.
///
/// Implementations return [`AnalysisError::NoData`](crate::error::AnalysisError::NoData)
/// for an empty series and
/// [`AnalysisError::FetchFailure`](crate::error::AnalysisError::FetchFailure)
/// for transport or provider errors.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch_history(&self, ticker: &str) -> AnalysisResult<PriceHistory>;

    /// Fundamentals for `ticker` (sector, valuation, dividend).  Sources
    /// without a fundamentals feed return an empty profile.
    async fn fetch_profile(&self, _ticker: &str) -> AnalysisResult<CompanyProfile> {
        Ok(CompanyProfile::default())
    }
}
