// =============================================================================
// Runtime Configuration — watchlist, provider and server settings
// =============================================================================
//
// Stored as JSON next to the binary.  Every field has a serde default, so a
// partial file (or `{}`) loads.  Saving writes a sibling `.tmp` file and
// renames it over the target.
// =============================================================================

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::ranking::DEFAULT_TOP_K;
use crate::yahoo::DEFAULT_BASE_URL;

fn default_watchlist() -> Vec<String> {
    [
        "AAPL", "MSFT", "AMZN", "TSLA", "NVDA", "META", "GOOGL", "JNJ", "JPM", "XOM", "PG", "KO",
        "BAS.DE", "SAP.DE", "SIE.DE",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

/// A year of daily bars (~252) covers the 200-bar SMA window; six months
/// (~126) never does.
fn default_history_range() -> String {
    "1y".to_string()
}

fn default_history_interval() -> String {
    "1d".to_string()
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_max_concurrency() -> usize {
    4
}

fn default_fx_pair() -> String {
    "EURUSD=X".to_string()
}

fn default_bind_addr() -> String {
    "0.0.0.0:3001".to_string()
}

fn default_yahoo_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_max_recent_reports() -> usize {
    100
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    // --- Ranking ------------------------------------------------------------

    /// Tickers evaluated by the top-buys ranking, in tie-break order.
    #[serde(default = "default_watchlist")]
    pub watchlist: Vec<String>,

    /// Number of BUY candidates returned by the ranking.
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Upper bound on tickers fetched and scored at the same time.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    // --- Market data --------------------------------------------------------

    /// Provider lookback, e.g. "1y" or "2y".  Must span at least 200
    /// trading days for the long SMA to be defined.
    #[serde(default = "default_history_range")]
    pub history_range: String,

    /// Bar interval; the scorer assumes daily bars.
    #[serde(default = "default_history_interval")]
    pub history_interval: String,

    /// Freshness window for fetched histories.  Zero disables caching.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// FX pair used to show prices in EUR (quoted as USD per EUR).
    #[serde(default = "default_fx_pair")]
    pub fx_pair: String,

    #[serde(default = "default_yahoo_base_url")]
    pub yahoo_base_url: String,

    // --- Server -------------------------------------------------------------

    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Analysis reports kept in memory for `/api/v1/reports`.
    #[serde(default = "default_max_recent_reports")]
    pub max_recent_reports: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            watchlist: default_watchlist(),
            top_k: default_top_k(),
            max_concurrency: default_max_concurrency(),
            history_range: default_history_range(),
            history_interval: default_history_interval(),
            cache_ttl_secs: default_cache_ttl_secs(),
            fx_pair: default_fx_pair(),
            yahoo_base_url: default_yahoo_base_url(),
            bind_addr: default_bind_addr(),
            max_recent_reports: default_max_recent_reports(),
        }
    }
}

impl RuntimeConfig {
    /// Read the JSON config at `path`.  A missing file is an error; the
    /// caller decides whether to fall back to defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;

        info!(
            path = %path.display(),
            watchlist = config.watchlist.len(),
            top_k = config.top_k,
            "watchlist config loaded"
        );

        Ok(config)
    }

    /// Persist the configuration to `path` (write `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise runtime config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "watchlist config written");
        Ok(())
    }

    /// Replace the watchlist with a comma-separated list, e.g. from an
    /// environment variable.  Blank entries are ignored; an all-blank list
    /// leaves the current watchlist untouched.
    pub fn apply_watchlist_override(&mut self, list: &str) {
        let tickers: Vec<String> = list
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();
        if !tickers.is_empty() {
            self.watchlist = tickers;
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Approximate trading days covered by `history_range`, if known.
    pub fn history_trading_days(&self) -> Option<usize> {
        range_trading_days(&self.history_range)
    }
}

/// Approximate number of trading days a Yahoo range such as `"6mo"` or
/// `"2y"` spans.  `None` for open-ended ranges (`"ytd"`, `"max"`) and
/// anything unrecognised.
pub fn range_trading_days(range: &str) -> Option<usize> {
    let range = range.trim();
    let split = range.find(|c: char| !c.is_ascii_digit())?;
    let (count, unit) = range.split_at(split);
    let count: usize = count.parse().ok()?;
    let per_unit = match unit {
        "d" => 1,
        "wk" => 5,
        "mo" => 21,
        "y" => 252,
        _ => return None,
    };
    Some(count * per_unit)
}
