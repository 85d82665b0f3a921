use dotenv::dotenv;
use chrono::NaiveDate;
use stockcast::config::{ForecastConfig, LoaderConfig, DEFAULT_MARKET_DATA_URL};
use stockcast::forecast::{ForecastCache, DEFAULT_MAX_FORECASTS};

pub struct Config {
    pub bind_addr: String,
    pub market_data_url: String,
    pub user_agent: String,
    /// `None` keeps cached prices until restart
    pub price_cache_ttl_secs: Option<u64>,
    pub forecast_cache: bool,
    /// Bound on cached forecasts; they expire with the price cache TTL
    pub forecast_cache_max_entries: usize,
    pub history_start: NaiveDate,
    pub interval_width: f64,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenv().ok();

        let ttl: u64 = std::env::var("PRICE_CACHE_TTL_SECS")
            .unwrap_or_else(|_| "86400".to_string())
            .parse()?;
        let history_start = std::env::var("HISTORY_START")
            .unwrap_or_else(|_| "2012-01-01".to_string());

        Ok(Config {
            bind_addr: std::env::var("BIND_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8501".to_string()),
            market_data_url: std::env::var("MARKET_DATA_URL")
                .unwrap_or_else(|_| DEFAULT_MARKET_DATA_URL.to_string()),
            user_agent: std::env::var("USER_AGENT")
                .unwrap_or_else(|_| LoaderConfig::default().user_agent),
            price_cache_ttl_secs: (ttl > 0).then_some(ttl),
            forecast_cache: std::env::var("FORECAST_CACHE")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
            forecast_cache_max_entries: std::env::var("FORECAST_CACHE_MAX_ENTRIES")
                .unwrap_or_else(|_| DEFAULT_MAX_FORECASTS.to_string())
                .parse()?,
            history_start: NaiveDate::parse_from_str(&history_start, "%Y-%m-%d")?,
            interval_width: std::env::var("INTERVAL_WIDTH")
                .unwrap_or_else(|_| "0.8".to_string())
                .parse()?,
        })
    }

    pub fn loader_config(&self) -> LoaderConfig {
        LoaderConfig {
            base_url: self.market_data_url.clone(),
            user_agent: self.user_agent.clone(),
            history_start: self.history_start,
            cache_ttl_secs: self.price_cache_ttl_secs,
        }
    }

    /// The forecast cache, when enabled
    pub fn forecast_cache(&self) -> Option<ForecastCache> {
        self.forecast_cache.then(|| {
            ForecastCache::with_limits(self.loader_config().cache_ttl(), self.forecast_cache_max_entries)
        })
    }

    pub fn forecast_config(&self) -> ForecastConfig {
        ForecastConfig {
            interval_width: self.interval_width,
            ..ForecastConfig::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let loader = LoaderConfig::default();
        Config {
            bind_addr: "0.0.0.0:8501".to_string(),
            market_data_url: loader.base_url,
            user_agent: loader.user_agent,
            price_cache_ttl_secs: loader.cache_ttl_secs,
            forecast_cache: true,
            forecast_cache_max_entries: DEFAULT_MAX_FORECASTS,
            history_start: loader.history_start,
            interval_width: ForecastConfig::default().interval_width,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_library_defaults() {
        let config = Config::default();
        let loader = config.loader_config();

        assert_eq!(loader.history_start, NaiveDate::from_ymd_opt(2012, 1, 1).unwrap());
        assert_eq!(loader.cache_ttl_secs, Some(86_400));
        assert!(config.forecast_cache);
        assert_eq!(config.forecast_config().interval_width, 0.8);

        let cache = config.forecast_cache().unwrap();
        assert_eq!(cache.max_entries(), DEFAULT_MAX_FORECASTS);
        assert_eq!(cache.ttl(), Some(chrono::Duration::hours(24)));
    }

    #[test]
    fn test_forecast_cache_can_be_disabled() {
        let config = Config {
            forecast_cache: false,
            ..Config::default()
        };
        assert!(config.forecast_cache().is_none());
    }
}
