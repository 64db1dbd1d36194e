// =============================================================================
// Cached price source — time-boxed reuse of fetched histories
// =============================================================================
//
// Decorator around any `PriceSource`.  Successful fetches are kept for `ttl`;
// failures are never cached so a flaky provider is retried on the next call.
//
// Concurrent misses for the same ticker are coalesced: each ticker has an
// async gate, and callers that queue behind a fetch re-check the cache before
// going to the provider.  After a failed fetch the next waiter tries again.
// The parking_lot locks are never held across an `.await`.
// =============================================================================

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tracing::debug;

use super::source::{CompanyProfile, PriceHistory, PriceSource};
use crate::error::AnalysisResult;

type FetchGate = Arc<tokio::sync::Mutex<()>>;

#[derive(Debug, Clone)]
struct CacheEntry {
    history: PriceHistory,
    expires_at: Instant,
}

pub struct CachedPriceSource<S> {
    inner: S,
    ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry>>,
    in_flight: Mutex<HashMap<String, FetchGate>>,
}

impl<S: PriceSource> CachedPriceSource<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: RwLock::new(HashMap::new()),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    fn gate(&self, key: &str) -> FetchGate {
        let mut in_flight = self.in_flight.lock();
        Arc::clone(in_flight.entry(key.to_string()).or_default())
    }

    /// Forget the gate for `key` once no other caller is queued on it.
    fn release_gate(&self, key: &str, gate: &FetchGate) {
        let mut in_flight = self.in_flight.lock();
        // One reference lives in the map, one is ours.
        if Arc::strong_count(gate) <= 2 {
            in_flight.remove(key);
        }
    }

    fn key(ticker: &str) -> String {
        ticker.trim().to_uppercase()
    }

    fn lookup(&self, key: &str) -> Option<PriceHistory> {
        let map = self.entries.read();
        map.get(key)
            .filter(|entry| Instant::now() < entry.expires_at)
            .map(|entry| entry.history.clone())
    }

    /// Drop every expired entry.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut map = self.entries.write();
        let before = map.len();
        map.retain(|_, entry| entry.expires_at > now);
        before - map.len()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Number of stored entries, expired or not.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl<S: PriceSource> PriceSource for CachedPriceSource<S> {
    async fn fetch_history(&self, ticker: &str) -> AnalysisResult<PriceHistory> {
        let key = Self::key(ticker);
        if self.ttl.is_zero() {
            return self.inner.fetch_history(ticker).await;
        }

        if let Some(history) = self.lookup(&key) {
            debug!(ticker = %key, "price history served from cache");
            return Ok(history);
        }

        let gate = self.gate(&key);
        let result = {
            let _turn = gate.lock().await;
            match self.lookup(&key) {
                Some(history) => {
                    debug!(ticker = %key, "price history filled by a concurrent fetch");
                    Ok(history)
                }
                None => {
                    let result = self.inner.fetch_history(ticker).await;
                    if let Ok(history) = &result {
                        self.entries.write().insert(
                            key.clone(),
                            CacheEntry {
                                history: history.clone(),
                                expires_at: Instant::now() + self.ttl,
                            },
                        );
                    }
                    result
                }
            }
        };
        self.release_gate(&key, &gate);
        result
    }

    async fn fetch_profile(&self, ticker: &str) -> AnalysisResult<CompanyProfile> {
        self.inner.fetch_profile(ticker).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;
    use crate::types::PriceBar;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingSource {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail,
            }
        }
    }

    #[async_trait]
    impl PriceSource for CountingSource {
        async fn fetch_history(&self, ticker: &str) -> AnalysisResult<PriceHistory> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(AnalysisError::fetch_failure(ticker, "provider down"));
            }
            let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
            Ok(PriceHistory::new(ticker, vec![PriceBar::from_close(date, 10.0)]))
        }
    }

    #[tokio::test]
    async fn second_fetch_within_ttl_hits_cache() {
        let cached = CachedPriceSource::new(CountingSource::new(false), Duration::from_secs(300));
        cached.fetch_history("aapl").await.unwrap();
        cached.fetch_history("AAPL ").await.unwrap();
        assert_eq!(cached.inner.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cached.len(), 1);
    }

    #[tokio::test]
    async fn expired_entries_are_refetched() {
        let cached = CachedPriceSource::new(CountingSource::new(false), Duration::from_millis(20));
        cached.fetch_history("MSFT").await.unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;
        cached.fetch_history("MSFT").await.unwrap();
        assert_eq!(cached.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let cached = CachedPriceSource::new(CountingSource::new(true), Duration::from_secs(300));
        assert!(cached.fetch_history("TSLA").await.is_err());
        assert!(cached.fetch_history("TSLA").await.is_err());
        assert_eq!(cached.inner.calls.load(Ordering::SeqCst), 2);
        assert!(cached.is_empty());
    }

    #[tokio::test]
    async fn zero_ttl_disables_cache() {
        let cached = CachedPriceSource::new(CountingSource::new(false), Duration::ZERO);
        cached.fetch_history("KO").await.unwrap();
        cached.fetch_history("KO").await.unwrap();
        assert_eq!(cached.inner.calls.load(Ordering::SeqCst), 2);
        assert!(cached.is_empty());
    }

    #[tokio::test]
    async fn purge_removes_only_expired() {
        let cached = CachedPriceSource::new(CountingSource::new(false), Duration::from_millis(20));
        cached.fetch_history("JNJ").await.unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(cached.purge_expired(), 1);
        assert!(cached.is_empty());
    }

    struct SlowSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PriceSource for SlowSource {
        async fn fetch_history(&self, ticker: &str) -> AnalysisResult<PriceHistory> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(30)).await;
            let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
            Ok(PriceHistory::new(ticker, vec![PriceBar::from_close(date, 10.0)]))
        }
    }

    #[tokio::test]
    async fn concurrent_misses_share_one_fetch() {
        let cached = CachedPriceSource::new(
            SlowSource {
                calls: AtomicUsize::new(0),
            },
            Duration::from_secs(300),
        );

        let (a, b, c) = tokio::join!(
            cached.fetch_history("SAP.DE"),
            cached.fetch_history("sap.de"),
            cached.fetch_history("SAP.DE "),
        );
        assert!(a.is_ok() && b.is_ok() && c.is_ok());
        assert_eq!(cached.inner.calls.load(Ordering::SeqCst), 1);
        assert!(cached.in_flight.lock().is_empty());
    }

    #[tokio::test]
    async fn different_tickers_are_not_serialised_together() {
        let cached = CachedPriceSource::new(
            SlowSource {
                calls: AtomicUsize::new(0),
            },
            Duration::from_secs(300),
        );
        let (a, b) = tokio::join!(cached.fetch_history("AAPL"), cached.fetch_history("MSFT"));
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(cached.inner.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cached.len(), 2);
    }
}
