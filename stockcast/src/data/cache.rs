//! Time-bounded in-memory price cache

use crate::data::PriceSeries;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

/// Cached series with the time it was stored
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub series: PriceSeries,
    pub inserted_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_fresh(&self, ttl: Option<Duration>, now: DateTime<Utc>) -> bool {
        match ttl {
            Some(ttl) => now - self.inserted_at < ttl,
            None => true,
        }
    }
}

/// Price series keyed by ticker.
///
/// `ttl = None` keeps entries until the process exits. The clock is passed
/// in explicitly by the `*_at` methods; the plain variants use `Utc::now()`.
#[derive(Debug)]
pub struct PriceCache {
    ttl: Option<Duration>,
    entries: HashMap<String, CacheEntry>,
}

impl PriceCache {
    /// Create new cache
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    /// Cache that never expires
    pub fn unbounded() -> Self {
        Self::new(None)
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Fresh series for `ticker`, if any
    pub fn get(&self, ticker: &str) -> Option<&PriceSeries> {
        self.get_at(ticker, Utc::now())
    }

    pub fn get_at(&self, ticker: &str, now: DateTime<Utc>) -> Option<&PriceSeries> {
        self.entries
            .get(ticker)
            .filter(|e| e.is_fresh(self.ttl, now))
            .map(|e| &e.series)
    }

    /// Store a series under its own ticker, replacing any older entry
    pub fn insert(&mut self, series: PriceSeries) {
        self.insert_at(series, Utc::now());
    }

    pub fn insert_at(&mut self, series: PriceSeries, now: DateTime<Utc>) {
        let key = series.ticker().to_string();
        self.entries.insert(
            key,
            CacheEntry {
                series,
                inserted_at: now,
            },
        );
    }

    /// Evict stale entries, returning how many were removed
    pub fn purge_expired_at(&mut self, now: DateTime<Utc>) -> usize {
        let ttl = self.ttl;
        let before = self.entries.len();
        self.entries.retain(|_, e| e.is_fresh(ttl, now));
        before - self.entries.len()
    }

    /// Clear all data
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of stored entries, stale ones included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::PriceBar;
    use chrono::{NaiveDate, TimeZone};

    fn series(ticker: &str, close: f64) -> PriceSeries {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        PriceSeries::from_bars(ticker, vec![PriceBar::new(date, close, close, close, close, 1)])
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_cache_hit_within_ttl() {
        let mut cache = PriceCache::new(Some(Duration::hours(24)));
        cache.insert_at(series("AAPL", 1.0), at(0));

        assert_eq!(cache.get_at("AAPL", at(23)), Some(&series("AAPL", 1.0)));
        assert!(cache.get_at("MSFT", at(1)).is_none());
    }

    #[test]
    fn test_cache_expires_after_ttl() {
        let mut cache = PriceCache::new(Some(Duration::hours(2)));
        cache.insert_at(series("AAPL", 1.0), at(0));

        assert!(cache.get_at("AAPL", at(2)).is_none());
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.purge_expired_at(at(2)), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_unbounded_cache_never_expires() {
        let mut cache = PriceCache::unbounded();
        cache.insert_at(series("TSLA", 3.0), at(0));

        let much_later = at(0) + Duration::days(365);
        assert!(cache.get_at("TSLA", much_later).is_some());
        assert_eq!(cache.purge_expired_at(much_later), 0);
    }

    #[test]
    fn test_insert_replaces_entry() {
        let mut cache = PriceCache::new(Some(Duration::hours(1)));
        cache.insert_at(series("NVDA", 1.0), at(0));
        cache.insert_at(series("NVDA", 2.0), at(3));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get_at("NVDA", at(3)).map(|s| s.closes()), Some(vec![2.0]));
    }
}
