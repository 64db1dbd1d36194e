// =============================================================================
// MACD — Moving Average Convergence Divergence
// =============================================================================
//
//   line   = EMA(fast) - EMA(slow)
//   signal = EMA(signal_period) of the MACD line
//
// Both EMAs use the SMA-seeded recurrence from `ema.rs`, so with the default
// 12/26/9 parameters the line starts at close index 25 and the signal line at
// close index 33.
// =============================================================================

use super::ema::calculate_ema;

pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;

/// MACD line and signal line, each with the close index of its first value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MacdSeries {
    pub line: Vec<f64>,
    pub line_offset: usize,
    pub signal: Vec<f64>,
    pub signal_offset: usize,
}

impl MacdSeries {
    /// Latest `(line, signal)` pair when both end at the last close.
    pub fn latest(&self, len: usize) -> (Option<f64>, Option<f64>) {
        let ends_at = |values: &[f64], offset: usize| {
            (!values.is_empty() && offset + values.len() == len)
                .then(|| values[values.len() - 1])
        };
        (
            ends_at(&self.line, self.line_offset),
            ends_at(&self.signal, self.signal_offset),
        )
    }

    /// Minimum number of closes needed for a defined signal value.
    pub fn bars_required(fast: usize, slow: usize, signal: usize) -> usize {
        fast.max(slow) + signal - 1
    }
}

/// Compute the MACD line and signal series.
///
/// Returns an empty [`MacdSeries`] when any period is zero, `fast >= slow`, or
/// there are fewer than `slow` closes.  The signal series stays empty until
/// `slow + signal - 1` closes are available.
pub fn calculate_macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> MacdSeries {
    if fast == 0 || slow == 0 || signal == 0 || fast >= slow {
        return MacdSeries::default();
    }

    let fast_ema = calculate_ema(closes, fast);
    let slow_ema = calculate_ema(closes, slow);
    if slow_ema.is_empty() {
        return MacdSeries::default();
    }

    // fast_ema[0] sits at close index fast-1, slow_ema[0] at slow-1.
    let shift = slow - fast;
    let line: Vec<f64> = slow_ema
        .iter()
        .zip(fast_ema.iter().skip(shift))
        .map(|(s, f)| f - s)
        .collect();

    let line_offset = slow - 1;
    let signal_series = calculate_ema(&line, signal);

    MacdSeries {
        line,
        line_offset,
        signal: signal_series,
        signal_offset: line_offset + signal - 1,
    }
}
