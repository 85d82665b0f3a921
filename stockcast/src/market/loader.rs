//! Cached price loading

use crate::data::{PriceCache, PriceSeries};
use crate::market::MarketDataSource;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

/// Loads daily history for a ticker, serving repeat requests from the cache.
///
/// Fetch failures are logged and come back as an empty series, just like a
/// ticker the source does not know. Empty series are never cached.
pub struct DataLoader<S> {
    source: S,
    cache: Mutex<PriceCache>,
    history_start: NaiveDate,
}

impl<S: MarketDataSource> DataLoader<S> {
    /// Create a loader over `source` with an injected cache
    pub fn new(source: S, cache: PriceCache, history_start: NaiveDate) -> Self {
        Self {
            source,
            cache: Mutex::new(cache),
            history_start,
        }
    }

    pub fn history_start(&self) -> NaiveDate {
        self.history_start
    }

    /// Load `history_start .. today` for `ticker`
    pub async fn load(&self, ticker: &str) -> PriceSeries {
        let now = Utc::now();
        self.load_at(ticker, now.date_naive(), now).await
    }

    /// Same as [`load`](Self::load) with an explicit end date and clock
    pub async fn load_at(&self, ticker: &str, today: NaiveDate, now: DateTime<Utc>) -> PriceSeries {
        if let Some(series) = self.cache.lock().await.get_at(ticker, now) {
            debug!("Price cache hit for {} ({} rows)", ticker, series.len());
            return series.clone();
        }

        info!("Loading data for {} from {} to {}", ticker, self.history_start, today);
        let series = match self.source.fetch_daily(ticker, self.history_start, today).await {
            Ok(series) => series,
            Err(e) => {
                error!("Failed to fetch price data for {}: {}", ticker, e);
                PriceSeries::empty(ticker)
            }
        };

        if !series.is_empty() {
            self.cache.lock().await.insert_at(series.clone(), now);
        }
        info!("Loading data for {} done: {} rows", ticker, series.len());
        series
    }

    /// Drop stale cache entries
    pub async fn purge_expired(&self) -> usize {
        self.cache.lock().await.purge_expired_at(Utc::now())
    }

    /// Number of cached tickers
    pub async fn cached_len(&self) -> usize {
        self.cache.lock().await.len()
    }
}
