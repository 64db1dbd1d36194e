// =============================================================================
// Score Aggregator — indicator snapshot to BUY / SELL / HOLD
// =============================================================================
//
// Sub-scores, each in {-1, 0, +1}:
//   tech   (RSI)        +1 if RSI < 30, -1 if RSI > 70, else 0
//   trend  (SMA cross)  +1 if SMA50 > SMA200, else -1 (no neutral state)
//   macd                +1 if line > signal, else -1
//   risk   (volatility) +1 if vol < 1 %, 0 if vol < 2 %, else -1
//
// final = tech + trend + macd + risk, in [-4, +4].
// =============================================================================

use serde::Serialize;
use tracing::debug;

use crate::error::{AnalysisError, AnalysisResult};
use crate::indicators::macd::{MacdSeries, MACD_FAST, MACD_SIGNAL, MACD_SLOW};
use crate::indicators::rsi::{OVERBOUGHT, OVERSOLD, RSI_PERIOD};
use crate::indicators::sma::{SMA_FAST, SMA_SLOW};
use crate::indicators::{compute_indicators, IndicatorSnapshot};
use crate::types::{Decision, DecisionRecord, PriceBar};

const LOW_VOLATILITY_PCT: f64 = 1.0;
const HIGH_VOLATILITY_PCT: f64 = 2.0;

/// Per-indicator contributions to the final score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SubScores {
    pub tech: i32,
    pub trend: i32,
    pub macd: i32,
    pub risk: i32,
}

impl SubScores {
    pub fn total(&self) -> i32 {
        self.tech + self.trend + self.macd + self.risk
    }
}

pub fn tech_score(rsi: f64) -> i32 {
    if rsi < OVERSOLD {
        1
    } else if rsi > OVERBOUGHT {
        -1
    } else {
        0
    }
}

/// SMA50 at or below SMA200 counts as bearish; there is no neutral trend.
pub fn trend_score(sma_fast: f64, sma_slow: f64) -> i32 {
    if sma_fast > sma_slow {
        1
    } else {
        -1
    }
}

pub fn macd_score(line: f64, signal: f64) -> i32 {
    if line > signal {
        1
    } else {
        -1
    }
}

pub fn risk_score(volatility_pct: f64) -> i32 {
    if volatility_pct < LOW_VOLATILITY_PCT {
        1
    } else if volatility_pct < HIGH_VOLATILITY_PCT {
        0
    } else {
        -1
    }
}

/// A decision together with the inputs that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredTicker {
    pub record: DecisionRecord,
    pub sub_scores: SubScores,
    pub indicators: IndicatorSnapshot,
}

/// Every value the scorer reads, once the history precondition holds.
struct Inputs {
    rsi: f64,
    sma_fast: f64,
    sma_slow: f64,
    macd_line: f64,
    macd_signal: f64,
    volatility_pct: f64,
}

fn require(snapshot: &IndicatorSnapshot, ticker: &str) -> AnalysisResult<Inputs> {
    let checks: [(&'static str, Option<f64>, usize); 6] = [
        ("RSI14", snapshot.rsi14, RSI_PERIOD + 1),
        ("SMA50", snapshot.sma50, SMA_FAST),
        ("SMA200", snapshot.sma200, SMA_SLOW),
        ("MACD", snapshot.macd_line, MACD_SLOW),
        (
            "MACD_SIGNAL",
            snapshot.macd_signal,
            MacdSeries::bars_required(MACD_FAST, MACD_SLOW, MACD_SIGNAL),
        ),
        ("VOLATILITY", snapshot.volatility_pct, 3),
    ];

    // Report the longest unmet window so the caller knows how much history
    // would satisfy every indicator.
    if let Some(&(indicator, _, required)) = checks
        .iter()
        .filter(|(_, value, _)| value.is_none())
        .max_by_key(|(_, _, required)| *required)
    {
        return Err(AnalysisError::InsufficientHistory {
            ticker: ticker.to_string(),
            indicator,
            required,
            available: snapshot.bars,
        });
    }

    let value = |i: usize| checks[i].1.unwrap_or_default();
    Ok(Inputs {
        rsi: value(0),
        sma_fast: value(1),
        sma_slow: value(2),
        macd_line: value(3),
        macd_signal: value(4),
        volatility_pct: value(5),
    })
}

/// Score an already computed snapshot.
///
/// Fails with [`AnalysisError::NoData`] on an empty snapshot and with
/// [`AnalysisError::InsufficientHistory`] when any indicator is undefined.
pub fn score_snapshot(ticker: &str, snapshot: &IndicatorSnapshot) -> AnalysisResult<ScoredTicker> {
    if snapshot.bars == 0 {
        return Err(AnalysisError::NoData {
            ticker: ticker.to_string(),
        });
    }

    let inputs = require(snapshot, ticker)?;

    let sub_scores = SubScores {
        tech: tech_score(inputs.rsi),
        trend: trend_score(inputs.sma_fast, inputs.sma_slow),
        macd: macd_score(inputs.macd_line, inputs.macd_signal),
        risk: risk_score(inputs.volatility_pct),
    };
    let score = sub_scores.total();
    let decision = Decision::from_score(score);

    debug!(
        ticker,
        %decision,
        score,
        tech = sub_scores.tech,
        trend = sub_scores.trend,
        macd = sub_scores.macd,
        risk = sub_scores.risk,
        "ticker scored"
    );

    Ok(ScoredTicker {
        record: DecisionRecord {
            ticker: ticker.to_string(),
            decision,
            score,
            rsi: inputs.rsi,
            volatility_pct: inputs.volatility_pct,
        },
        sub_scores,
        indicators: *snapshot,
    })
}

/// Compute indicators for `bars` and score them, keeping the breakdown.
pub fn analyze_bars(ticker: &str, bars: &[PriceBar]) -> AnalysisResult<ScoredTicker> {
    score_snapshot(ticker, &compute_indicators(bars))
}

/// Compute indicators for `bars` and produce the decision record.
pub fn score_ticker(ticker: &str, bars: &[PriceBar]) -> AnalysisResult<DecisionRecord> {
    analyze_bars(ticker, bars).map(|scored| scored.record)
}
