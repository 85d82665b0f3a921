//! Stockcast: daily price history and time-series forecasts for a ticker
//!
//! This crate holds everything behind the stock forecast dashboard:
//!
//! - **Input resolution**: ticker list / free-text override and a 1-5 year horizon
//! - **Market data**: daily OHLCV history from the Yahoo chart endpoint, cached per ticker with a TTL
//! - **Forecasting**: additive piecewise-linear trend + Fourier seasonality, fitted by penalised least squares
//! - **Charts**: plotly.js figure descriptions for prices, forecast and components
//! - **Pipeline**: one explicit run per request, caches injected
//!
//! # Example
//!
//! ```no_run
//! use stockcast::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = LoaderConfig::default();
//!     let client = YahooChartClient::new(&config)?;
//!     let loader = DataLoader::new(client, PriceCache::new(config.cache_ttl()), config.history_start);
//!     let dashboard = Dashboard::new(loader, ForecastConfig::default(), Some(ForecastCache::new()));
//!
//!     let request = DashboardRequest { ticker: Some("AAPL".into()), years: Some(1), ..Default::default() };
//!     let view = dashboard.run(&request).await?;
//!     println!("{} rows forecast for {}", view.forecast.forecast_rows, view.raw.ticker);
//!     Ok(())
//! }
//! ```

pub mod chart;
pub mod config;
pub mod data;
pub mod error;
pub mod forecast;
pub mod input;
pub mod market;
pub mod pipeline;

pub use error::StockcastError;

// Re-export commonly used types
pub mod prelude {
    pub use crate::chart::{components_figure, forecast_figure, raw_data_figure, Figure, Trace};
    pub use crate::config::{ForecastConfig, LoaderConfig, Seasonality};
    pub use crate::data::{PriceBar, PriceCache, PriceSeries, TrainingFrame};
    pub use crate::forecast::{forecast, FittedForecast, ForecastCache, ForecastModel, ForecastRow, ForecastTable};
    pub use crate::input::{resolve_ticker, HorizonYears, DEFAULT_TICKERS};
    pub use crate::market::{DataLoader, MarketDataSource, YahooChartClient};
    pub use crate::pipeline::{Dashboard, DashboardRequest, DashboardView, ForecastView, RawDataView};

    pub use crate::{Result, StockcastError};
}

/// Result type alias
pub type Result<T> = std::result::Result<T, StockcastError>;
