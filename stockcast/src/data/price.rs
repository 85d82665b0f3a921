//! Daily price bars and the per-ticker price series

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One trading day of OHLCV data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    /// Trading date
    pub date: NaiveDate,
    /// Opening price
    pub open: f64,
    /// High price
    pub high: f64,
    /// Low price
    pub low: f64,
    /// Closing price
    pub close: f64,
    /// Volume
    pub volume: u64,
}

impl PriceBar {
    /// Create a new bar
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: u64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    fn is_finite(&self) -> bool {
        self.open.is_finite() && self.high.is_finite() && self.low.is_finite() && self.close.is_finite()
    }
}

/// Daily price history for a single ticker.
///
/// Bars are ordered by date ascending with at most one bar per date. The
/// series is never mutated after construction; a reload builds a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    ticker: String,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Build a series from bars in any order.
    ///
    /// Bars are sorted by date; for duplicate dates the first bar seen is
    /// kept. Bars with non-finite prices are dropped.
    pub fn from_bars(ticker: impl Into<String>, bars: Vec<PriceBar>) -> Self {
        let mut bars: Vec<PriceBar> = bars.into_iter().filter(PriceBar::is_finite).collect();
        // stable sort keeps the first occurrence ahead of later duplicates
        bars.sort_by_key(|b| b.date);
        bars.dedup_by_key(|b| b.date);

        Self {
            ticker: ticker.into(),
            bars,
        }
    }

    /// Create an empty series, e.g. for a ticker the source does not know
    pub fn empty(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            bars: Vec::new(),
        }
    }

    /// Ticker symbol
    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    /// Get all bars
    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    /// Get number of bars
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Check if series is empty
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Last `n` bars (fewer if the series is shorter)
    pub fn tail(&self, n: usize) -> &[PriceBar] {
        let start = self.bars.len().saturating_sub(n);
        &self.bars[start..]
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    /// Get dates as vector
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    /// Get open prices as vector
    pub fn opens(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.open).collect()
    }

    /// Get close prices as vector
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn bar(d: u32, close: f64) -> PriceBar {
        PriceBar::new(day(d), close - 1.0, close + 1.0, close - 2.0, close, 1_000)
    }

    #[test]
    fn test_from_bars_sorts_and_dedups() {
        let series = PriceSeries::from_bars(
            "AAPL",
            vec![bar(5, 105.0), bar(1, 101.0), bar(5, 999.0), bar(3, 103.0)],
        );

        assert_eq!(series.len(), 3);
        assert_eq!(series.dates(), vec![day(1), day(3), day(5)]);
        // first occurrence of a duplicated date wins
        assert_eq!(series.closes(), vec![101.0, 103.0, 105.0]);
    }

    #[test]
    fn test_from_bars_drops_non_finite_rows() {
        let mut broken = bar(2, 102.0);
        broken.close = f64::NAN;
        let series = PriceSeries::from_bars("AAPL", vec![bar(1, 101.0), broken]);

        assert_eq!(series.len(), 1);
        assert_eq!(series.last_date(), Some(day(1)));
    }

    #[test]
    fn test_tail() {
        let bars = (1..=8).map(|d| bar(d, 100.0 + d as f64)).collect();
        let series = PriceSeries::from_bars("MSFT", bars);

        let tail = series.tail(5);
        assert_eq!(tail.len(), 5);
        assert_eq!(tail[0].date, day(4));
        assert_eq!(tail[4].date, day(8));

        let short = PriceSeries::from_bars("MSFT", vec![bar(1, 1.0)]);
        assert_eq!(short.tail(5).len(), 1);
        assert!(PriceSeries::empty("X").tail(5).is_empty());
    }
}
