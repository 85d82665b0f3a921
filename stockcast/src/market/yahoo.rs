//! Daily price history from the Yahoo chart endpoint

use crate::config::LoaderConfig;
use crate::data::{PriceBar, PriceSeries};
use crate::market::MarketDataSource;
use crate::{Result, StockcastError};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

/// HTTP client for `/v8/finance/chart/{ticker}`
#[derive(Debug, Clone)]
pub struct YahooChartClient {
    client: Client,
    base_url: String,
}

impl YahooChartClient {
    /// Create new client from loader configuration
    pub fn new(config: &LoaderConfig) -> Result<Self> {
        let client = Client::builder().user_agent(config.user_agent.as_str()).build()?;
        Ok(Self::with_client(client, &config.base_url))
    }

    /// Use an existing reqwest client
    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn chart_url(&self, ticker: &str) -> String {
        format!("{}/v8/finance/chart/{}", self.base_url, ticker)
    }
}

#[async_trait]
impl MarketDataSource for YahooChartClient {
    async fn fetch_daily(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<PriceSeries> {
        let period1 = start.and_time(chrono::NaiveTime::MIN).and_utc().timestamp();
        let period2 = end.and_time(chrono::NaiveTime::MIN).and_utc().timestamp();
        debug!("Requesting {} daily history {} .. {}", ticker, start, end);

        let response = self
            .client
            .get(self.chart_url(ticker))
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
                ("events", "history".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let reason = serde_json::from_str::<ChartEnvelope>(&body)
                .ok()
                .and_then(|env| env.chart.error)
                .map(|e| format!("{}: {}", e.code, e.description))
                .unwrap_or_else(|| status.to_string());
            warn!("[{}] no price data ({}); returning an empty series", ticker, reason);
            return Ok(PriceSeries::empty(ticker));
        }

        let envelope: ChartEnvelope = serde_json::from_str(&body).map_err(|e| StockcastError::Decode {
            ticker: ticker.to_string(),
            message: e.to_string(),
        })?;

        let series = parse_chart(ticker, envelope, start, end);
        if series.is_empty() {
            warn!("[{}] chart response held no usable rows; returning an empty series", ticker);
        }
        Ok(series)
    }
}

/// Turn a decoded chart response into a price series.
///
/// Rows with a null price field are skipped and dates outside
/// `start..end` are dropped.
pub fn parse_chart(ticker: &str, envelope: ChartEnvelope, start: NaiveDate, end: NaiveDate) -> PriceSeries {
    let Some(result) = envelope.chart.result.and_then(|r| r.into_iter().next()) else {
        return PriceSeries::empty(ticker);
    };
    let Some(quote) = result.indicators.quote.into_iter().next() else {
        return PriceSeries::empty(ticker);
    };

    // bar timestamps are exchange-local session opens; shift before taking the date
    let offset = result.meta.and_then(|m| m.gmtoffset).unwrap_or(0);
    let field = |v: &Vec<Option<f64>>, i: usize| v.get(i).copied().flatten();

    let bars = result
        .timestamp
        .iter()
        .enumerate()
        .filter_map(|(i, &ts)| {
            let date = DateTime::from_timestamp(ts + offset, 0)?.date_naive();
            if date < start || date >= end {
                return None;
            }
            Some(PriceBar::new(
                date,
                field(&quote.open, i)?,
                field(&quote.high, i)?,
                field(&quote.low, i)?,
                field(&quote.close, i)?,
                quote.volume.get(i).copied().flatten().unwrap_or(0),
            ))
        })
        .collect();

    PriceSeries::from_bars(ticker, bars)
}

// `chart` response schema

#[derive(Debug, Deserialize)]
pub struct ChartEnvelope {
    pub chart: ChartResponse,
}

#[derive(Debug, Deserialize)]
pub struct ChartResponse {
    pub result: Option<Vec<ChartResult>>,
    pub error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
pub struct ChartError {
    pub code: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct ChartResult {
    pub meta: Option<ChartMeta>,
    #[serde(default)]
    pub timestamp: Vec<i64>,
    pub indicators: Indicators,
}

#[derive(Debug, Deserialize)]
pub struct ChartMeta {
    pub gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct Indicators {
    #[serde(default)]
    pub quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
pub struct Quote {
    #[serde(default)]
    pub open: Vec<Option<f64>>,
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    #[serde(default)]
    pub close: Vec<Option<f64>>,
    #[serde(default)]
    pub volume: Vec<Option<u64>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    const SAMPLE: &str = r#"{
        "chart": {
            "result": [{
                "meta": { "currency": "USD", "symbol": "AAPL", "gmtoffset": -18000 },
                "timestamp": [1704205800, 1704292200, 1704378600, 1704465000],
                "indicators": {
                    "quote": [{
                        "open":   [187.15, 184.22, null, 181.99],
                        "high":   [188.44, 185.88, 183.08, 182.76],
                        "low":    [183.89, 183.43, 180.88, 180.17],
                        "close":  [185.64, 184.25, 181.91, 181.18],
                        "volume": [82488700, 58414500, 71983600, null]
                    }],
                    "adjclose": [{ "adjclose": [185.4, 184.0, 181.7, 180.9] }]
                }
            }],
            "error": null
        }
    }"#;

    #[test]
    fn test_parse_chart_rows() {
        let envelope: ChartEnvelope = serde_json::from_str(SAMPLE).unwrap();
        let series = parse_chart("AAPL", envelope, date(2012, 1, 1), date(2024, 12, 31));

        // third row has a null open and is skipped
        assert_eq!(series.len(), 3);
        assert_eq!(series.dates(), vec![date(2024, 1, 2), date(2024, 1, 3), date(2024, 1, 5)]);
        assert_eq!(series.closes(), vec![185.64, 184.25, 181.18]);
        assert_eq!(series.bars()[0].volume, 82_488_700);
        assert_eq!(series.bars()[2].volume, 0);
    }

    #[test]
    fn test_parse_chart_respects_range() {
        let envelope: ChartEnvelope = serde_json::from_str(SAMPLE).unwrap();
        let series = parse_chart("AAPL", envelope, date(2024, 1, 3), date(2024, 1, 5));

        assert_eq!(series.dates(), vec![date(2024, 1, 3)]);
    }

    #[test]
    fn test_parse_chart_without_result() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let envelope: ChartEnvelope = serde_json::from_str(body).unwrap();
        let series = parse_chart("NOPE", envelope, date(2012, 1, 1), date(2024, 1, 1));

        assert!(series.is_empty());
        assert_eq!(series.ticker(), "NOPE");
    }

    #[test]
    fn test_chart_url() {
        let client = YahooChartClient::with_client(Client::new(), "http://localhost:9000/");
        assert_eq!(client.chart_url("RELIANCE.NS"), "http://localhost:9000/v8/finance/chart/RELIANCE.NS");
    }
}
