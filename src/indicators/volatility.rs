// =============================================================================
// Close-to-close volatility
// =============================================================================
//
// volatility_pct = sample standard deviation (n - 1) of the day-over-day
// percentage changes over the whole window, expressed in percent.

/// Day-over-day fractional changes: `(close_t - close_{t-1}) / close_{t-1}`.
///
/// A zero previous close yields a 0.0 change rather than infinity.
pub fn pct_changes(closes: &[f64]) -> Vec<f64> {
    closes
        .windows(2)
        .map(|w| if w[0] == 0.0 { 0.0 } else { (w[1] - w[0]) / w[0] })
        .collect()
}

/// Volatility of `closes` in percent.
///
/// Returns `None` with fewer than two percentage changes (fewer than three
/// closes), where the sample standard deviation is undefined.
pub fn volatility_pct(closes: &[f64]) -> Option<f64> {
    let changes = pct_changes(closes);
    if changes.len() < 2 {
        return None;
    }

    let n = changes.len() as f64;
    let mean = changes.iter().sum::<f64>() / n;
    let variance = changes.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let pct = variance.sqrt() * 100.0;

    pct.is_finite().then_some(pct)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pct_changes_basic() {
        let changes = pct_changes(&[100.0, 110.0, 99.0]);
        assert_eq!(changes.len(), 2);
        assert!((changes[0] - 0.10).abs() < 1e-12);
        assert!((changes[1] + 0.10).abs() < 1e-12);
    }

    #[test]
    fn volatility_undefined_for_short_series() {
        assert!(volatility_pct(&[]).is_none());
        assert!(volatility_pct(&[100.0]).is_none());
        assert!(volatility_pct(&[100.0, 101.0]).is_none());
    }

    #[test]
    fn volatility_of_constant_series_is_zero() {
        assert_eq!(volatility_pct(&[10.0; 60]), Some(0.0));
    }

    #[test]
    fn volatility_uses_sample_std() {
        // Changes: +10 %, -10 % => mean 0, sample variance 0.02, std ~14.142 %.
        let vol = volatility_pct(&[100.0, 110.0, 99.0]).unwrap();
        assert!((vol - 14.142_135_623_730_951).abs() < 1e-9, "got {vol}");
    }
}
