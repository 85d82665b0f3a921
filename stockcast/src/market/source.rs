//! Market data source abstraction

use crate::data::PriceSeries;
use crate::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Anything that can produce a daily price history for a ticker.
///
/// Implementations return an empty series when the source has no data for
/// the ticker and reserve `Err` for failures of the source itself.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Fetch daily bars with `start <= date < end`
    async fn fetch_daily(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<PriceSeries>;
}
