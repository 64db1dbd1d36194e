// =============================================================================
// Watchlist Ranker — best-effort BUY shortlist over a batch of tickers
// =============================================================================
//
// Every ticker is fetched and scored independently.  A ticker whose fetch or
// scoring fails is logged and left out; it never fails the batch.  Survivors
// with a BUY decision are sorted by descending score with a stable sort, so
// ties keep watchlist order, and truncated to `top_k`.
// =============================================================================

use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::error::AnalysisResult;
use crate::market_data::PriceSource;
use crate::scoring::score_ticker;
use crate::types::{Decision, DecisionRecord, PriceBar};

pub const DEFAULT_TOP_K: usize = 5;

/// Keep the BUY records from `results`, best score first, at most `top_k`.
///
/// `results` must be in watchlist order; errors are logged and skipped.
pub fn select_top_buys<I>(results: I, top_k: usize) -> Vec<DecisionRecord>
where
    I: IntoIterator<Item = AnalysisResult<DecisionRecord>>,
{
    let mut buys: Vec<DecisionRecord> = results
        .into_iter()
        .filter_map(|result| match result {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(ticker = e.ticker(), code = e.code(), error = %e, "skipping ticker");
                None
            }
        })
        .filter(|record| record.decision == Decision::Buy)
        .collect();

    // `sort_by` is stable.
    buys.sort_by(|a, b| b.score.cmp(&a.score));
    buys.truncate(top_k);
    buys
}

/// Rank `tickers` sequentially using a synchronous `fetch` capability.
pub fn rank_watchlist<S, F>(tickers: &[S], mut fetch: F, top_k: usize) -> Vec<DecisionRecord>
where
    S: AsRef<str>,
    F: FnMut(&str) -> AnalysisResult<Vec<PriceBar>>,
{
    let results = tickers.iter().map(|ticker| {
        let ticker = ticker.as_ref();
        fetch(ticker).and_then(|bars| score_ticker(ticker, &bars))
    });
    let ranked = select_top_buys(results, top_k);
    info!(
        watchlist = tickers.len(),
        buys = ranked.len(),
        top_k,
        "watchlist ranked"
    );
    ranked
}

/// Rank `tickers` against an async [`PriceSource`], evaluating at most
/// `max_concurrency` tickers at a time.
///
/// Results are collected in watchlist order, so the tie-break matches
/// [`rank_watchlist`].
pub async fn rank_watchlist_concurrent(
    tickers: &[String],
    source: Arc<dyn PriceSource>,
    top_k: usize,
    max_concurrency: usize,
) -> Vec<DecisionRecord> {
    let results: Vec<AnalysisResult<DecisionRecord>> = stream::iter(tickers.iter().cloned())
        .map(|ticker| {
            let source = Arc::clone(&source);
            async move {
                let history = source.fetch_history(&ticker).await?;
                debug!(ticker = %ticker, bars = history.bars.len(), "history fetched");
                score_ticker(&ticker, &history.bars)
            }
        })
        .buffered(max_concurrency.max(1))
        .collect()
        .await;

    let ranked = select_top_buys(results, top_k);
    info!(
        watchlist = tickers.len(),
        buys = ranked.len(),
        top_k,
        max_concurrency,
        "watchlist ranked"
    );
    ranked
}
