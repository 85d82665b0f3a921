//! Market data loading configuration

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Base URL of the public chart endpoint
pub const DEFAULT_MARKET_DATA_URL: &str = "https://query1.finance.yahoo.com";

/// Loader configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Base URL of the market-data source
    pub base_url: String,
    /// User agent sent with every request
    pub user_agent: String,
    /// First date of the fetched history
    pub history_start: NaiveDate,
    /// Price cache lifetime in seconds; `None` keeps entries until restart
    pub cache_ttl_secs: Option<u64>,
}

impl LoaderConfig {
    /// Cache TTL as a chrono duration
    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl_secs
            .map(|secs| Duration::seconds(secs.min(u64::from(u32::MAX)) as i64))
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_MARKET_DATA_URL.to_string(),
            user_agent: "Mozilla/5.0 (stockcast)".to_string(),
            history_start: NaiveDate::from_ymd_opt(2012, 1, 1).unwrap_or_default(),
            cache_ttl_secs: Some(24 * 60 * 60), // 24 hours
        }
    }
}
