//! Error types for the forecasting pipeline

use thiserror::Error;

/// Errors raised while loading prices or fitting a forecast
#[derive(Debug, Error)]
pub enum StockcastError {
    /// Transport-level failure talking to the market-data source
    #[error("market data request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The market-data response could not be interpreted
    #[error("could not decode market data for {ticker}: {message}")]
    Decode { ticker: String, message: String },

    /// Not enough rows to fit a model (an unknown ticker ends up here)
    #[error("not enough data to fit a forecast: got {rows} row(s), need at least {required}")]
    InsufficientData { rows: usize, required: usize },

    /// The model could not be fitted to the data
    #[error("forecast fit failed: {0}")]
    Fit(String),

    /// A blocking task was cancelled or panicked
    #[error("background task failed: {0}")]
    Join(String),
}

impl From<tokio::task::JoinError> for StockcastError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Join(err.to_string())
    }
}
