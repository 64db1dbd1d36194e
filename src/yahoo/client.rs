// =============================================================================
// Yahoo Finance chart client — daily OHLCV history
// =============================================================================
//
// GET {base}/v8/finance/chart/{ticker}?range=1y&interval=1d
//
// The chart endpoint returns column arrays (timestamp, open, high, low, close,
// volume) in which any entry may be null.  Rows with a missing OHLC value or a
// non-positive close are dropped before the bars reach the engine.
//
// GET {base}/v10/finance/quoteSummary/{ticker}
//         ?modules=assetProfile,summaryDetail,defaultKeyStatistics
//
// supplies sector, industry and valuation figures for the company profile.
// =============================================================================

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::DateTime;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::error::{AnalysisError, AnalysisResult};
use crate::market_data::{CompanyProfile, PriceHistory, PriceSource};
use crate::types::PriceBar;

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

const PROFILE_MODULES: &str = "assetProfile,summaryDetail,defaultKeyStatistics";

/// Yahoo rejects requests without a browser-like user agent.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) equity-signal/1.0";

#[derive(Clone)]
pub struct YahooClient {
    base_url: String,
    range: String,
    interval: String,
    client: reqwest::Client,
}

impl YahooClient {
    /// Create a client that fetches `range` of `interval` bars, e.g. `"1y"`
    /// of `"1d"`.
    pub fn new(
        base_url: impl Into<String>,
        range: impl Into<String>,
        interval: impl Into<String>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("failed to build reqwest client")?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        debug!(base_url = %base_url, "YahooClient initialised");

        Ok(Self {
            base_url,
            range: range.into(),
            interval: interval.into(),
            client,
        })
    }

    fn endpoint_url(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .with_context(|| format!("invalid Yahoo base url {}", self.base_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("Yahoo base url cannot take a path"))?
            .extend(segments);
        url.query_pairs_mut().extend_pairs(query);
        Ok(url)
    }

    fn chart_url(&self, ticker: &str) -> Result<reqwest::Url> {
        self.endpoint_url(
            &["v8", "finance", "chart", ticker],
            &[("range", self.range.as_str()), ("interval", self.interval.as_str())],
        )
    }

    fn quote_summary_url(&self, ticker: &str) -> Result<reqwest::Url> {
        self.endpoint_url(
            &["v10", "finance", "quoteSummary", ticker],
            &[("modules", PROFILE_MODULES)],
        )
    }

    /// GET `url` and return the body.  404 is passed through because Yahoo
    /// answers unknown symbols with a 404 carrying an error payload.
    async fn get_body(&self, ticker: &str, url: Result<reqwest::Url>) -> AnalysisResult<String> {
        let url = url.map_err(|e| AnalysisError::fetch_failure(ticker, format!("{e:#}")))?;

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AnalysisError::fetch_failure(ticker, e))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| AnalysisError::fetch_failure(ticker, e))?;

        if !status.is_success() && status != reqwest::StatusCode::NOT_FOUND {
            warn!(ticker = %ticker, %status, "Yahoo request rejected");
            return Err(AnalysisError::fetch_failure(
                ticker,
                format!("Yahoo returned {status}"),
            ));
        }
        Ok(body)
    }

    /// GET /v8/finance/chart/{ticker}.
    #[instrument(skip(self), name = "yahoo::get_chart")]
    pub async fn get_chart(&self, ticker: &str) -> AnalysisResult<PriceHistory> {
        let ticker = ticker.trim().to_uppercase();
        let body = self.get_body(&ticker, self.chart_url(&ticker)).await?;

        let history = parse_chart(&ticker, &body)?;
        debug!(ticker = %ticker, bars = history.bars.len(), "chart retrieved");
        Ok(history)
    }

    /// GET /v10/finance/quoteSummary/{ticker}.
    #[instrument(skip(self), name = "yahoo::get_quote_summary")]
    pub async fn get_quote_summary(&self, ticker: &str) -> AnalysisResult<CompanyProfile> {
        let ticker = ticker.trim().to_uppercase();
        let body = self.get_body(&ticker, self.quote_summary_url(&ticker)).await?;

        let profile = parse_quote_summary(&ticker, &body)?;
        debug!(ticker = %ticker, sector = ?profile.sector, "quote summary retrieved");
        Ok(profile)
    }
}

#[async_trait]
impl PriceSource for YahooClient {
    async fn fetch_history(&self, ticker: &str) -> AnalysisResult<PriceHistory> {
        self.get_chart(ticker).await
    }

    async fn fetch_profile(&self, ticker: &str) -> AnalysisResult<CompanyProfile> {
        self.get_quote_summary(ticker).await
    }
}

// =============================================================================
// Response model
// =============================================================================

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    currency: Option<String>,
    exchange_name: Option<String>,
    full_exchange_name: Option<String>,
    long_name: Option<String>,
    short_name: Option<String>,
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

/// Parse a chart payload into an ascending price history.
pub fn parse_chart(ticker: &str, body: &str) -> AnalysisResult<PriceHistory> {
    let response: ChartResponse = serde_json::from_str(body).map_err(|e| {
        AnalysisError::fetch_failure(ticker, format!("failed to parse Yahoo chart: {e}"))
    })?;

    if let Some(err) = response.chart.error {
        if err.code.eq_ignore_ascii_case("Not Found") {
            return Err(AnalysisError::NoData {
                ticker: ticker.to_string(),
            });
        }
        return Err(AnalysisError::fetch_failure(
            ticker,
            format!("Yahoo chart error {}: {}", err.code, err.description),
        ));
    }

    let Some(result) = response.chart.result.and_then(|r| r.into_iter().next()) else {
        return Err(AnalysisError::NoData {
            ticker: ticker.to_string(),
        });
    };

    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
    let at = |column: &[Option<f64>], i: usize| column.get(i).copied().flatten();

    let mut bars: Vec<PriceBar> = Vec::with_capacity(result.timestamp.len());
    for (i, &ts) in result.timestamp.iter().enumerate() {
        let (Some(open), Some(high), Some(low), Some(close)) = (
            at(&quote.open, i),
            at(&quote.high, i),
            at(&quote.low, i),
            at(&quote.close, i),
        ) else {
            continue;
        };
        if !(close > 0.0 && close.is_finite()) {
            continue;
        }
        // Shift to exchange-local time so the bar lands on its trading day.
        let Some(local) = DateTime::from_timestamp(ts + result.meta.gmtoffset, 0) else {
            continue;
        };
        let date = local.date_naive();

        let bar = PriceBar {
            date,
            open,
            high,
            low,
            close,
            volume: at(&quote.volume, i).map_or(0, |v| v.max(0.0) as u64),
        };

        // Yahoo occasionally repeats the live bar; keep the latest one.
        match bars.last_mut() {
            Some(last) if last.date == date => *last = bar,
            _ => bars.push(bar),
        }
    }

    if bars.is_empty() {
        return Err(AnalysisError::NoData {
            ticker: ticker.to_string(),
        });
    }

    let meta = result.meta;
    Ok(PriceHistory {
        ticker: ticker.to_string(),
        profile: CompanyProfile {
            name: meta.long_name.or(meta.short_name),
            currency: meta.currency,
            exchange: meta.full_exchange_name.or(meta.exchange_name),
            ..CompanyProfile::default()
        },
        bars,
    })
}

// =============================================================================
// Quote summary model
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResponse {
    quote_summary: QuoteSummaryBody,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryBody {
    #[serde(default)]
    result: Option<Vec<QuoteSummaryResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResult {
    #[serde(default)]
    asset_profile: AssetProfile,
    #[serde(default)]
    summary_detail: SummaryDetail,
    #[serde(default)]
    default_key_statistics: KeyStatistics,
}

#[derive(Debug, Default, Deserialize)]
struct AssetProfile {
    sector: Option<String>,
    industry: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryDetail {
    #[serde(default)]
    market_cap: RawValue,
    #[serde(default, rename = "forwardPE")]
    forward_pe: RawValue,
    #[serde(default)]
    dividend_yield: RawValue,
}

#[derive(Debug, Default, Deserialize)]
struct KeyStatistics {
    #[serde(default, rename = "forwardPE")]
    forward_pe: RawValue,
}

/// Yahoo wraps numbers as `{"raw": 1.0, "fmt": "1.00"}`; missing figures
/// come back as `{}`.
#[derive(Debug, Default, Deserialize)]
struct RawValue {
    raw: Option<f64>,
}

impl RawValue {
    fn value(&self) -> Option<f64> {
        self.raw.filter(|v| v.is_finite())
    }
}

/// Parse a quoteSummary payload into the fundamentals part of a profile.
pub fn parse_quote_summary(ticker: &str, body: &str) -> AnalysisResult<CompanyProfile> {
    let response: QuoteSummaryResponse = serde_json::from_str(body).map_err(|e| {
        AnalysisError::fetch_failure(ticker, format!("failed to parse Yahoo quote summary: {e}"))
    })?;

    if let Some(err) = response.quote_summary.error {
        if err.code.eq_ignore_ascii_case("Not Found") {
            return Err(AnalysisError::NoData {
                ticker: ticker.to_string(),
            });
        }
        return Err(AnalysisError::fetch_failure(
            ticker,
            format!("Yahoo quote summary error {}: {}", err.code, err.description),
        ));
    }

    let Some(result) = response
        .quote_summary
        .result
        .and_then(|r| r.into_iter().next())
    else {
        return Err(AnalysisError::NoData {
            ticker: ticker.to_string(),
        });
    };

    let detail = result.summary_detail;
    Ok(CompanyProfile {
        sector: result.asset_profile.sector,
        industry: result.asset_profile.industry,
        market_cap: detail.market_cap.value(),
        forward_pe: detail
            .forward_pe
            .value()
            .or(result.default_key_statistics.forward_pe.value()),
        dividend_yield: detail.dividend_yield.value(),
        ..CompanyProfile::default()
    })
}
