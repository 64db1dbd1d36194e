// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
//   alpha = 2 / (period + 1)
//   EMA_t = value_t * alpha + EMA_{t-1} * (1 - alpha)
//
// Seeded with the SMA of the first `period` values, so the first output lines
// up with input index `period - 1`.  MACD builds on this.
// =============================================================================

/// Smoothing factor for a `period`-bar EMA.
pub fn ema_alpha(period: usize) -> f64 {
    2.0 / (period + 1) as f64
}

/// EMA series of `values`; empty when `period == 0` or fewer than `period`
/// values exist.  The series ends early at the first non-finite value.
pub fn calculate_ema(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }

    let seed = values[..period].iter().sum::<f64>() / period as f64;
    if !seed.is_finite() {
        return Vec::new();
    }

    let alpha = ema_alpha(period);
    let smoothed = values[period..].iter().scan(seed, |prev, &value| {
        let next = value * alpha + *prev * (1.0 - alpha);
        if !next.is_finite() {
            return None;
        }
        *prev = next;
        Some(next)
    });

    std::iter::once(seed).chain(smoothed).collect()
}
