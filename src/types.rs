// =============================================================================
// Shared types used across the signal engine
// =============================================================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One daily OHLCV bar. Series are ordered ascending by `date`, one bar per
/// trading day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: u64,
}

impl PriceBar {
    /// Bar where open/high/low all equal the close. Handy for close-only
    /// series such as FX pairs or test fixtures.
    pub fn from_close(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            open: close,
            high: close,
            low: close,
            close,
            volume: 0,
        }
    }
}

/// Extract the close column from a bar series.
pub fn closes(bars: &[PriceBar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

/// Discrete trading signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Buy,
    Sell,
    Hold,
}

impl Decision {
    /// Map an aggregate score onto a decision: `>= 2` buys, `<= -2` sells,
    /// anything in between holds.
    pub fn from_score(score: i32) -> Self {
        if score >= 2 {
            Self::Buy
        } else if score <= -2 {
            Self::Sell
        } else {
            Self::Hold
        }
    }
}

impl Default for Decision {
    fn default() -> Self {
        Self::Hold
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
            Self::Hold => write!(f, "HOLD"),
        }
    }
}

/// The verdict for one ticker over one price series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub ticker: String,
    pub decision: Decision,
    pub score: i32,
    pub rsi: f64,
    pub volatility_pct: f64,
}
