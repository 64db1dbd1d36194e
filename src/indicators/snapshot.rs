// =============================================================================
// Indicator set — every indicator the scorer consumes, computed in one pass
// =============================================================================

use chrono::NaiveDate;
use serde::Serialize;

use super::macd::{calculate_macd, MACD_FAST, MACD_SIGNAL, MACD_SLOW};
use super::rsi::{calculate_rsi, RSI_PERIOD};
use super::sma::{calculate_sma, SMA_FAST, SMA_SLOW};
use super::volatility::volatility_pct;
use crate::types::{closes, PriceBar};

/// Latest value of each indicator.  `None` means undefined (not enough
/// history), never zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct IndicatorSnapshot {
    pub rsi14: Option<f64>,
    pub sma50: Option<f64>,
    pub sma200: Option<f64>,
    pub macd_line: Option<f64>,
    pub macd_signal: Option<f64>,
    /// Whole-window close-to-close volatility in percent.
    pub volatility_pct: Option<f64>,
    /// Number of bars the snapshot was computed from.
    pub bars: usize,
}

/// Full indicator series, index-aligned with the input bars.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndicatorSeries {
    pub dates: Vec<NaiveDate>,
    pub closes: Vec<f64>,
    pub rsi14: Vec<Option<f64>>,
    pub sma50: Vec<Option<f64>>,
    pub sma200: Vec<Option<f64>>,
    pub macd_line: Vec<Option<f64>>,
    pub macd_signal: Vec<Option<f64>>,
    pub volatility_pct: Option<f64>,
}

impl IndicatorSeries {
    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    /// Collapse to the most recent value of every indicator.
    pub fn latest(&self) -> IndicatorSnapshot {
        let last = |s: &[Option<f64>]| s.last().copied().flatten();
        IndicatorSnapshot {
            rsi14: last(&self.rsi14),
            sma50: last(&self.sma50),
            sma200: last(&self.sma200),
            macd_line: last(&self.macd_line),
            macd_signal: last(&self.macd_signal),
            volatility_pct: self.volatility_pct,
            bars: self.len(),
        }
    }
}

/// Place `values` at input index `offset` onwards inside a vector of length
/// `len`, leaving every other slot undefined.
fn align(values: &[f64], offset: usize, len: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; len];
    for (i, &v) in values.iter().enumerate() {
        if let Some(slot) = out.get_mut(offset + i) {
            *slot = Some(v);
        }
    }
    out
}

/// Compute the full, aligned series for every indicator.
///
/// An empty input yields an empty series whose [`IndicatorSeries::latest`]
/// is entirely undefined.
pub fn compute_indicator_series(bars: &[PriceBar]) -> IndicatorSeries {
    let closes = closes(bars);
    let len = closes.len();

    let rsi = calculate_rsi(&closes, RSI_PERIOD);
    let sma_fast = calculate_sma(&closes, SMA_FAST);
    let sma_slow = calculate_sma(&closes, SMA_SLOW);
    let macd = calculate_macd(&closes, MACD_FAST, MACD_SLOW, MACD_SIGNAL);

    IndicatorSeries {
        dates: bars.iter().map(|b| b.date).collect(),
        rsi14: align(&rsi, RSI_PERIOD, len),
        sma50: align(&sma_fast, SMA_FAST - 1, len),
        sma200: align(&sma_slow, SMA_SLOW - 1, len),
        macd_line: align(&macd.line, macd.line_offset, len),
        macd_signal: align(&macd.signal, macd.signal_offset, len),
        volatility_pct: volatility_pct(&closes),
        closes,
    }
}

/// Compute the latest value of every indicator for `bars`.
pub fn compute_indicators(bars: &[PriceBar]) -> IndicatorSnapshot {
    compute_indicator_series(bars).latest()
}
