// =============================================================================
// Equity Signal — technical scoring of daily stock histories
// =============================================================================
//
// Indicators (RSI, SMA, MACD, volatility) are computed from daily closes,
// folded into a score in -4..=+4 and mapped to BUY / HOLD / SELL.  A watchlist
// ranker turns a batch of tickers into a top-K BUY shortlist.  Market data
// comes from Yahoo Finance behind the `PriceSource` trait.
// =============================================================================

pub mod api;
pub mod app_state;
pub mod error;
pub mod indicators;
pub mod market_data;
pub mod ranking;
pub mod report;
pub mod runtime_config;
pub mod scoring;
pub mod types;
pub mod yahoo;

pub use error::{AnalysisError, AnalysisResult};
pub use market_data::PriceSource;
pub use ranking::{rank_watchlist, rank_watchlist_concurrent, select_top_buys};
pub use scoring::{score_snapshot, score_ticker};
pub use types::{Decision, DecisionRecord, PriceBar};
