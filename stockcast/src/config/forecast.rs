//! Forecast model configuration

use serde::{Deserialize, Serialize};

/// Whether a seasonal component is fitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Seasonality {
    /// Decide from the length of the history
    Auto,
    Enabled,
    Disabled,
}

/// Forecast model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Number of potential trend changepoints
    pub n_changepoints: usize,
    /// Share of the history in which changepoints are placed (e.g., 0.8 = first 80%)
    pub changepoint_range: f64,
    /// Prior scale of trend slope changes; larger is more flexible
    pub changepoint_prior_scale: f64,
    /// Prior scale of the seasonal Fourier coefficients
    pub seasonality_prior_scale: f64,
    /// Yearly seasonality
    pub yearly: Seasonality,
    /// Fourier order of the yearly component
    pub yearly_order: usize,
    /// Weekly seasonality
    pub weekly: Seasonality,
    /// Fourier order of the weekly component
    pub weekly_order: usize,
    /// Coverage of the uncertainty band (e.g., 0.8 = 80%)
    pub interval_width: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            n_changepoints: 25,
            changepoint_range: 0.8,
            changepoint_prior_scale: 0.05,
            seasonality_prior_scale: 10.0,
            yearly: Seasonality::Auto,
            yearly_order: 10,
            weekly: Seasonality::Auto,
            weekly_order: 3,
            interval_width: 0.8,
        }
    }
}
