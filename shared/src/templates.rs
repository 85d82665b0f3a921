use askama::Template;
use stockcast::input::DEFAULT_TICKERS;
use stockcast::pipeline::{DashboardRequest, ForecastView, RawDataView};

/// One entry of the ticker dropdown
pub struct TickerOption {
    pub symbol: String,
    pub selected: bool,
}

#[derive(Template)]
#[template(path = "dashboard.html", escape = "html")]
pub struct DashboardTemplate {
    pub options: Vec<TickerOption>,
    pub custom: String,
    pub years: u32,
    pub raw: Option<RawDataView>,
    pub forecast: Option<ForecastView>,
    pub error: Option<String>,
    // Pre-serialized plotly figures, embedded raw in <script>
    pub raw_chart_json: String,
    pub forecast_chart_json: String,
    pub components_chart_json: String,
}

impl DashboardTemplate {
    /// Build the page from a pipeline run. The raw data section is shown
    /// whenever prices were found, even if the forecast then failed.
    pub fn new(request: &DashboardRequest, raw: RawDataView, forecast: Result<ForecastView, String>) -> Self {
        let picked = request.ticker.as_deref().map(str::trim).unwrap_or(DEFAULT_TICKERS[0]);
        let options = DEFAULT_TICKERS
            .iter()
            .map(|symbol| TickerOption {
                symbol: symbol.to_string(),
                selected: *symbol == picked,
            })
            .collect();

        tracing::debug!("Rendering dashboard for {}", raw.ticker);
        let raw = Some(raw).filter(|r| r.history_rows > 0);
        let (forecast, error) = match forecast {
            Ok(view) => (Some(view), None),
            Err(message) => (None, Some(message)),
        };
        let chart = |value: Option<&serde_json::Value>| value.map(script_safe).unwrap_or_else(|| "null".to_string());

        DashboardTemplate {
            options,
            custom: request.custom.clone().unwrap_or_default(),
            years: request.horizon().years(),
            raw_chart_json: chart(raw.as_ref().map(|r| &r.raw_chart)),
            forecast_chart_json: chart(forecast.as_ref().map(|f| &f.forecast_chart)),
            components_chart_json: chart(forecast.as_ref().map(|f| &f.components_chart)),
            raw,
            forecast,
            error,
        }
    }
}

/// JSON that can sit inside a <script> element
fn script_safe(value: &serde_json::Value) -> String {
    value.to_string().replace("</", "<\\/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use stockcast::data::PriceBar;

    fn raw(rows: usize) -> RawDataView {
        let day = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
        RawDataView {
            ticker: "NOPE".to_string(),
            history_rows: rows,
            raw_tail: (0..rows)
                .map(|_| PriceBar::new(day, 1.0, 2.0, 0.5, 1.5, 100))
                .collect(),
            raw_chart: serde_json::json!({ "data": [], "layout": {} }),
        }
    }

    #[test]
    fn test_error_page_keeps_inputs() {
        let request = DashboardRequest {
            ticker: Some("AAPL".to_string()),
            custom: Some("NOPE".to_string()),
            years: Some(9),
        };
        let page = DashboardTemplate::new(&request, raw(0), Err("no data for NOPE".to_string()));

        assert_eq!(page.years, 5);
        assert_eq!(page.custom, "NOPE");
        assert_eq!(page.raw_chart_json, "null");
        assert!(page.raw.is_none());
        assert!(page.options.iter().any(|o| o.symbol == "AAPL" && o.selected));

        let html = page.render().unwrap();
        assert!(html.contains("no data for NOPE"));
        assert!(html.contains("value=\"5\""));
        assert!(!html.contains("Show Raw Data"));
    }

    #[test]
    fn test_raw_section_shown_when_forecast_fails() {
        let page = DashboardTemplate::new(&DashboardRequest::default(), raw(1), Err("not enough data".to_string()));
        assert_ne!(page.raw_chart_json, "null");
        assert_eq!(page.forecast_chart_json, "null");

        let html = page.render().unwrap();
        assert!(html.contains("Show Raw Data"));
        assert!(html.contains("2024-05-06"));
        assert!(html.contains("not enough data"));
        assert!(!html.contains("Show Forecast Data"));
    }

    #[test]
    fn test_default_page_selects_first_ticker() {
        let page = DashboardTemplate::new(&DashboardRequest::default(), raw(0), Err(String::new()));
        assert!(page.options[0].selected);
        assert_eq!(page.options.iter().filter(|o| o.selected).count(), 1);
    }

    #[test]
    fn test_script_safe_escapes_closing_tags() {
        let value = serde_json::json!({ "name": "</script>" });
        assert!(!script_safe(&value).contains("</script>"));
    }
}
