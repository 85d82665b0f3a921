//! Request-scoped dashboard pipeline
//!
//! inputs -> load prices -> raw preview/chart -> forecast -> forecast preview/charts

use crate::chart::{components_figure, forecast_figure, raw_data_figure};
use crate::config::ForecastConfig;
use crate::data::{PriceBar, TrainingFrame};
use crate::forecast::{forecast, FittedForecast, ForecastCache, ForecastRow};
use crate::input::{resolve_ticker, HorizonYears};
use crate::market::{DataLoader, MarketDataSource};
use crate::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Rows shown in the raw data and forecast previews
pub const PREVIEW_ROWS: usize = 5;

/// Dashboard inputs, as submitted by the form
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardRequest {
    /// Entry picked from the ticker list
    #[serde(default)]
    pub ticker: Option<String>,
    /// Free-text ticker; overrides the list when non-blank
    #[serde(default)]
    pub custom: Option<String>,
    /// Forecast horizon in years
    #[serde(default)]
    pub years: Option<u32>,
}

impl DashboardRequest {
    pub fn resolved_ticker(&self) -> String {
        resolve_ticker(self.ticker.as_deref(), self.custom.as_deref())
    }

    pub fn horizon(&self) -> HorizonYears {
        self.years.map(HorizonYears::new).unwrap_or_default()
    }
}

/// Raw data section: preview rows and the open/close chart
#[derive(Debug, Clone, Serialize)]
pub struct RawDataView {
    pub ticker: String,
    pub history_rows: usize,
    pub raw_tail: Vec<PriceBar>,
    pub raw_chart: serde_json::Value,
}

/// Forecast section: preview rows, forecast and components charts
#[derive(Debug, Clone, Serialize)]
pub struct ForecastView {
    pub horizon_years: u32,
    pub horizon_days: usize,
    pub forecast_rows: usize,
    pub forecast_tail: Vec<ForecastRow>,
    pub forecast_chart: serde_json::Value,
    pub components_chart: serde_json::Value,
}

/// Everything the dashboard page displays
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    #[serde(flatten)]
    pub raw: RawDataView,
    #[serde(flatten)]
    pub forecast: ForecastView,
}

/// The dashboard pipeline with its injected caches
pub struct Dashboard<S> {
    loader: DataLoader<S>,
    forecasts: Option<Mutex<ForecastCache>>,
    config: ForecastConfig,
}

impl<S: MarketDataSource> Dashboard<S> {
    /// `forecast_cache = None` refits on every run
    pub fn new(loader: DataLoader<S>, config: ForecastConfig, forecast_cache: Option<ForecastCache>) -> Self {
        Self {
            loader,
            forecasts: forecast_cache.map(Mutex::new),
            config,
        }
    }

    pub fn loader(&self) -> &DataLoader<S> {
        &self.loader
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Drop expired forecasts, returning how many were removed
    pub async fn purge_expired_forecasts(&self) -> usize {
        match &self.forecasts {
            Some(cache) => cache.lock().await.purge_expired_at(Utc::now()),
            None => 0,
        }
    }

    /// Number of cached forecasts
    pub async fn cached_forecasts(&self) -> usize {
        match &self.forecasts {
            Some(cache) => cache.lock().await.len(),
            None => 0,
        }
    }

    /// Run the whole pipeline for one request
    pub async fn run(&self, request: &DashboardRequest) -> Result<DashboardView> {
        let (raw, forecast) = self.present(request).await;
        Ok(DashboardView { raw, forecast: forecast? })
    }

    /// Run the pipeline top to bottom. The raw data section is produced even
    /// when the forecast fails.
    pub async fn present(&self, request: &DashboardRequest) -> (RawDataView, Result<ForecastView>) {
        let ticker = request.resolved_ticker();
        let horizon = request.horizon();
        info!("Dashboard run: ticker={} horizon={}y", ticker, horizon.years());

        let series = self.loader.load(&ticker).await;
        let raw = RawDataView {
            ticker,
            history_rows: series.len(),
            raw_tail: series.tail(PREVIEW_ROWS).to_vec(),
            raw_chart: raw_data_figure(&series).to_value(),
        };

        let frame = TrainingFrame::from_series(&series);
        let forecast = self.forecast(frame, horizon.days()).await.map(|fitted| ForecastView {
            horizon_years: horizon.years(),
            horizon_days: horizon.days(),
            forecast_rows: fitted.table.len(),
            forecast_tail: fitted.table.tail(PREVIEW_ROWS).to_vec(),
            forecast_chart: forecast_figure(&fitted.model, &fitted.table).to_value(),
            components_chart: components_figure(&fitted.model, &fitted.table).to_value(),
        });
        (raw, forecast)
    }

    /// Fit and predict off the async executor, consulting the forecast cache
    pub async fn forecast(&self, frame: TrainingFrame, horizon: usize) -> Result<Arc<FittedForecast>> {
        let key = self
            .forecasts
            .as_ref()
            .map(|_| ForecastCache::key(&frame, horizon, &self.config));

        if let (Some(cache), Some(key)) = (&self.forecasts, &key) {
            if let Some(hit) = cache.lock().await.get(key) {
                debug!("Forecast cache hit ({} rows, horizon {})", frame.len(), horizon);
                return Ok(hit);
            }
        }

        let config = self.config.clone();
        let rows = frame.len();
        let (model, table) = tokio::task::spawn_blocking(move || forecast(&frame, horizon, &config)).await??;
        info!("Forecast fitted on {} rows, {} rows predicted", rows, table.len());

        let fitted = Arc::new(FittedForecast { model, table });
        if let (Some(cache), Some(key)) = (&self.forecasts, key) {
            cache.lock().await.insert(key, fitted.clone());
        }
        Ok(fitted)
    }
}
