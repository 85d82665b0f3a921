//! Content-addressed forecast cache

use crate::config::ForecastConfig;
use crate::data::TrainingFrame;
use crate::forecast::{ForecastModel, ForecastTable};
use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;

/// A fitted model together with its forecast table
#[derive(Debug, Clone)]
pub struct FittedForecast {
    pub model: ForecastModel,
    pub table: ForecastTable,
}

/// Default bound on the number of cached forecasts
pub const DEFAULT_MAX_FORECASTS: usize = 64;

#[derive(Debug)]
struct Slot {
    forecast: Arc<FittedForecast>,
    inserted_at: DateTime<Utc>,
}

/// Forecasts keyed by the exact training data, horizon and model settings.
///
/// Entries expire after `ttl` (never when `None`), and once `max_entries`
/// is reached the oldest entry makes room for a new one.
#[derive(Debug)]
pub struct ForecastCache {
    entries: HashMap<String, Slot>,
    ttl: Option<Duration>,
    max_entries: usize,
}

impl Default for ForecastCache {
    fn default() -> Self {
        Self::with_limits(None, DEFAULT_MAX_FORECASTS)
    }
}

impl ForecastCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache with an expiry and a size bound; `max_entries` is at least 1
    pub fn with_limits(ttl: Option<Duration>, max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// SHA-256 over every `(ds, y)` pair, the horizon and the config
    pub fn key(frame: &TrainingFrame, horizon: usize, config: &ForecastConfig) -> String {
        let mut hasher = Sha256::new();
        for row in frame.rows() {
            hasher.update(row.ds.to_string().as_bytes());
            hasher.update(row.y.to_bits().to_le_bytes());
        }
        hasher.update((horizon as u64).to_le_bytes());
        hasher.update(format!("{config:?}").as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn get(&self, key: &str) -> Option<Arc<FittedForecast>> {
        self.get_at(key, Utc::now())
    }

    /// Fresh entry for `key` as of `now`
    pub fn get_at(&self, key: &str, now: DateTime<Utc>) -> Option<Arc<FittedForecast>> {
        self.entries
            .get(key)
            .filter(|slot| !self.is_expired(slot, now))
            .map(|slot| Arc::clone(&slot.forecast))
    }

    pub fn insert(&mut self, key: String, forecast: Arc<FittedForecast>) {
        self.insert_at(key, forecast, Utc::now());
    }

    pub fn insert_at(&mut self, key: String, forecast: Arc<FittedForecast>, now: DateTime<Utc>) {
        if !self.entries.contains_key(&key) {
            self.purge_expired_at(now);
            while self.entries.len() >= self.max_entries {
                let oldest = self
                    .entries
                    .iter()
                    .min_by_key(|(_, slot)| slot.inserted_at)
                    .map(|(k, _)| k.clone());
                match oldest {
                    Some(k) => {
                        self.entries.remove(&k);
                    }
                    None => break,
                }
            }
        }
        self.entries.insert(
            key,
            Slot {
                forecast,
                inserted_at: now,
            },
        );
    }

    /// Drop expired entries, returning how many were removed
    pub fn purge_expired_at(&mut self, now: DateTime<Utc>) -> usize {
        let Some(ttl) = self.ttl else {
            return 0;
        };
        let before = self.entries.len();
        self.entries.retain(|_, slot| now - slot.inserted_at < ttl);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn is_expired(&self, slot: &Slot, now: DateTime<Utc>) -> bool {
        self.ttl.is_some_and(|ttl| now - slot.inserted_at >= ttl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Observation;
    use crate::forecast::forecast;
    use chrono::{NaiveDate, TimeZone};

    fn frame(last: f64) -> TrainingFrame {
        let d = |day| NaiveDate::from_ymd_opt(2021, 5, day).unwrap();
        TrainingFrame::from_rows(vec![
            Observation { ds: d(3), y: 1.0 },
            Observation { ds: d(4), y: last },
        ])
    }

    #[test]
    fn test_key_depends_on_content_and_horizon() {
        let config = ForecastConfig::default();
        let base = ForecastCache::key(&frame(2.0), 365, &config);

        assert_eq!(base, ForecastCache::key(&frame(2.0), 365, &config));
        assert_ne!(base, ForecastCache::key(&frame(2.5), 365, &config));
        assert_ne!(base, ForecastCache::key(&frame(2.0), 730, &config));

        let wider = ForecastConfig {
            interval_width: 0.95,
            ..config
        };
        assert_ne!(base, ForecastCache::key(&frame(2.0), 365, &wider));
    }

    fn fitted() -> Arc<FittedForecast> {
        let (model, table) = forecast(&frame(2.0), 1, &ForecastConfig::default()).unwrap();
        Arc::new(FittedForecast { model, table })
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_entries_expire_after_ttl() {
        let mut cache = ForecastCache::with_limits(Some(Duration::hours(2)), 8);
        cache.insert_at("a".to_string(), fitted(), at(0));

        assert!(cache.get_at("a", at(1)).is_some());
        assert!(cache.get_at("a", at(2)).is_none());

        cache.insert_at("b".to_string(), fitted(), at(1));
        assert_eq!(cache.purge_expired_at(at(2)), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get_at("b", at(2)).is_some());
    }

    #[test]
    fn test_oldest_entry_is_evicted_at_capacity() {
        let mut cache = ForecastCache::with_limits(None, 2);
        cache.insert_at("a".to_string(), fitted(), at(0));
        cache.insert_at("b".to_string(), fitted(), at(1));
        cache.insert_at("c".to_string(), fitted(), at(2));

        assert_eq!(cache.len(), 2);
        assert!(cache.get_at("a", at(3)).is_none());
        assert!(cache.get_at("b", at(3)).is_some());
        assert!(cache.get_at("c", at(3)).is_some());

        // refreshing an existing key does not evict
        cache.insert_at("b".to_string(), fitted(), at(4));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.purge_expired_at(at(23)), 0);
    }
}
