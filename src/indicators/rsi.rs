// =============================================================================
// Relative Strength Index (RSI), Wilder's smoothing
// =============================================================================
//
// Gains and losses of consecutive closes are averaged over the first `period`
// deltas, then smoothed with
//
//   avg = (prev_avg * (period - 1) + current) / period
//
// and RSI = 100 - 100 / (1 + avg_gain / avg_loss).  A window with no
// movement at all reads 50; a window with no losses reads 100.
// =============================================================================

/// Default look-back used by the scorer.
pub const RSI_PERIOD: usize = 14;

pub const OVERBOUGHT: f64 = 70.0;
pub const OVERSOLD: f64 = 30.0;

/// Running Wilder average of gains and losses.
#[derive(Debug, Clone, Copy)]
struct WilderAverages {
    period: f64,
    gain: f64,
    loss: f64,
}

impl WilderAverages {
    fn seed(deltas: &[f64]) -> Self {
        let period = deltas.len() as f64;
        let gain: f64 = deltas.iter().map(|d| d.max(0.0)).sum();
        let loss: f64 = deltas.iter().map(|d| (-d).max(0.0)).sum();
        Self {
            period,
            gain: gain / period,
            loss: loss / period,
        }
    }

    fn push(&mut self, delta: f64) {
        let weight = self.period - 1.0;
        self.gain = (self.gain * weight + delta.max(0.0)) / self.period;
        self.loss = (self.loss * weight + (-delta).max(0.0)) / self.period;
    }

    fn rsi(&self) -> Option<f64> {
        let value = match (self.gain == 0.0, self.loss == 0.0) {
            (true, true) => 50.0,
            (_, true) => 100.0,
            _ => 100.0 - 100.0 / (1.0 + self.gain / self.loss),
        };
        value.is_finite().then_some(value)
    }
}

/// RSI series for `closes`.
///
/// One value per close from index `period` on; empty when `period == 0` or
/// fewer than `period + 1` closes exist.  A non-finite reading ends the
/// series.
pub fn calculate_rsi(closes: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || closes.len() <= period {
        return Vec::new();
    }

    let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    let (seed, rest) = deltas.split_at(period);

    let mut averages = WilderAverages::seed(seed);
    let Some(first) = averages.rsi() else {
        return Vec::new();
    };

    let mut series = Vec::with_capacity(rest.len() + 1);
    series.push(first);
    for &delta in rest {
        averages.push(delta);
        let Some(value) = averages.rsi() else {
            break;
        };
        series.push(value);
    }
    series
}

/// Latest RSI reading and its zone label.
pub fn current_rsi(closes: &[f64], period: usize) -> Option<(f64, &'static str)> {
    calculate_rsi(closes, period)
        .last()
        .map(|&value| (value, rsi_label(value)))
}

/// Zone label for an RSI reading; both thresholds are strict.
pub fn rsi_label(value: f64) -> &'static str {
    if value > OVERBOUGHT {
        "OVERBOUGHT"
    } else if value < OVERSOLD {
        "OVERSOLD"
    } else {
        "NEUTRAL"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize) -> Vec<f64> {
        (1..=n).map(|x| x as f64).collect()
    }

    #[test]
    fn needs_one_more_close_than_period() {
        assert!(calculate_rsi(&[], RSI_PERIOD).is_empty());
        assert!(calculate_rsi(&ramp(5), 0).is_empty());
        assert!(calculate_rsi(&ramp(14), 14).is_empty());
        assert_eq!(calculate_rsi(&ramp(15), 14).len(), 1);
        assert_eq!(calculate_rsi(&ramp(40), 14).len(), 26);
    }

    #[test]
    fn one_sided_moves_pin_the_extremes() {
        assert!(calculate_rsi(&ramp(30), 14).iter().all(|&v| v == 100.0));

        let mut down = ramp(30);
        down.reverse();
        assert!(calculate_rsi(&down, 14).iter().all(|&v| v.abs() < 1e-10));
    }

    #[test]
    fn no_movement_reads_fifty() {
        let series = calculate_rsi(&[25.0; 20], 14);
        assert_eq!(series, vec![50.0; 6]);
    }

    #[test]
    fn matches_wilder_worked_example() {
        let closes = [
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08, 45.89, 46.03,
            45.61, 46.28, 46.28, 46.00, 46.03, 46.41, 46.22, 45.64,
        ];
        let series = calculate_rsi(&closes, 14);
        assert_eq!(series.len(), 6);
        assert!((series[0] - 70.46).abs() < 0.05, "got {}", series[0]);
        assert!(series.iter().all(|v| (0.0..=100.0).contains(v)));
        // The last two closes fall, so the reading eases off.
        assert!(series[5] < series[4]);
    }

    #[test]
    fn labels_use_strict_thresholds() {
        assert_eq!(current_rsi(&ramp(30), 14).unwrap().1, "OVERBOUGHT");
        let mut down = ramp(30);
        down.reverse();
        assert_eq!(current_rsi(&down, 14).unwrap().1, "OVERSOLD");

        assert_eq!(rsi_label(70.0), "NEUTRAL");
        assert_eq!(rsi_label(30.0), "NEUTRAL");
        assert_eq!(rsi_label(70.01), "OVERBOUGHT");
        assert!(current_rsi(&ramp(3), 14).is_none());
    }
}
