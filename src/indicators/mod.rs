// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the indicators the scorer reads.
// Series functions return an empty `Vec` on insufficient data; the snapshot
// layer turns that into `None` per indicator.

pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod snapshot;
pub mod volatility;

pub use snapshot::{compute_indicator_series, compute_indicators, IndicatorSeries, IndicatorSnapshot};
