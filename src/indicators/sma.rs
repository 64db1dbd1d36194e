// =============================================================================
// Simple Moving Average (SMA)
// =============================================================================
//
// Arithmetic mean of the trailing `period` closes.  Computed with a running
// window sum so the full series costs O(n).

pub const SMA_FAST: usize = 50;
pub const SMA_SLOW: usize = 200;

/// Compute the SMA series for `closes`.
///
/// Each output element corresponds to a close starting at index `period - 1`.
/// Returns an empty vec when `period == 0` or fewer than `period` closes exist.
pub fn calculate_sma(closes: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || closes.len() < period {
        return Vec::new();
    }

    let period_f = period as f64;
    let mut window_sum: f64 = closes[..period].iter().sum();

    let mut result = Vec::with_capacity(closes.len() - period + 1);
    result.push(window_sum / period_f);

    for i in period..closes.len() {
        window_sum += closes[i] - closes[i - period];
        result.push(window_sum / period_f);
    }

    result
}

/// Most recent SMA value, if the window is filled.
pub fn current_sma(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period {
        return None;
    }
    let window = &closes[closes.len() - period..];
    Some(window.iter().sum::<f64>() / period as f64)
}
