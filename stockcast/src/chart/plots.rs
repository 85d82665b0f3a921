//! Dashboard figures: raw prices, forecast and forecast components

use crate::chart::{Axis, Figure, Trace};
use crate::data::PriceSeries;
use crate::forecast::{ForecastModel, ForecastTable, SeasonalKind};
use chrono::{Duration, NaiveDate};

const FORECAST_COLOR: &str = "#0072B2";
const BAND_COLOR: &str = "rgba(0, 114, 178, 0.2)";
const ACTUAL_COLOR: &str = "#000000";
const WEEKDAYS: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

fn date_labels(dates: impl IntoIterator<Item = NaiveDate>) -> Vec<String> {
    dates.into_iter().map(|d| d.format("%Y-%m-%d").to_string()).collect()
}

/// 2017-01-01 was a Sunday; seasonal profiles are drawn over that week/year
fn reference_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2017, 1, 1).unwrap_or_default()
}

/// Open and close prices against date
pub fn raw_data_figure(series: &PriceSeries) -> Figure {
    let x = date_labels(series.dates());
    let mut figure = Figure::new("Time Series");
    figure
        .add_trace(Trace::lines("Stock Open", x.clone(), series.opens()))
        .add_trace(Trace::lines("Stock Close", x, series.closes()));
    figure
        .layout
        .set_xaxis(1, Axis::default().date().with_rangeslider())
        .dark();
    figure
}

/// Observed values, fitted/forecast line and uncertainty band
pub fn forecast_figure(model: &ForecastModel, table: &ForecastTable) -> Figure {
    let x = date_labels(table.dates());
    let rows = table.rows();
    let history = model.history();

    let mut figure = Figure::new(&format!("Forecast ({} days ahead)", table.len().saturating_sub(history.len())));
    figure
        .add_trace(
            Trace::lines("Lower Bound", x.clone(), rows.iter().map(|r| r.yhat_lower).collect())
                .with_line(FORECAST_COLOR, 0.0)
                .hide_legend(),
        )
        .add_trace(
            Trace::lines("Upper Bound", x.clone(), rows.iter().map(|r| r.yhat_upper).collect())
                .with_line(FORECAST_COLOR, 0.0)
                .fill_to_previous(BAND_COLOR)
                .hide_legend(),
        )
        .add_trace(
            Trace::lines("Predicted", x, rows.iter().map(|r| r.yhat).collect())
                .with_line(FORECAST_COLOR, 2.0),
        )
        .add_trace(Trace::markers(
            "Actual",
            date_labels(history.dates()),
            history.values(),
            ACTUAL_COLOR,
        ));
    figure
        .layout
        .set_xaxis(1, Axis::titled("ds").date().with_rangeslider())
        .set_yaxis(1, Axis::titled("y"))
        .dark();
    figure
}

/// Trend over the whole table plus one panel per fitted seasonality
pub fn components_figure(model: &ForecastModel, table: &ForecastTable) -> Figure {
    let mut figure = Figure::new("Forecast Components");
    let mut panel = 1;

    figure.add_trace(
        Trace::lines(
            "trend",
            date_labels(table.dates()),
            table.rows().iter().map(|r| r.trend).collect(),
        )
        .with_line(FORECAST_COLOR, 2.0),
    );
    figure
        .layout
        .set_xaxis(panel, Axis::titled("ds").date())
        .set_yaxis(panel, Axis::titled("trend"));

    if model.seasonal_term(SeasonalKind::Weekly).is_some() {
        panel += 1;
        let (days, values) = weekly_profile(model);
        figure.add_trace(
            Trace::lines("weekly", days, values)
                .with_line(FORECAST_COLOR, 2.0)
                .on_subplot(panel),
        );
        figure
            .layout
            .set_xaxis(panel, Axis::titled("Day of week"))
            .set_yaxis(panel, Axis::titled("weekly"));
    }

    if model.seasonal_term(SeasonalKind::Yearly).is_some() {
        panel += 1;
        let (days, values) = yearly_profile(model);
        figure.add_trace(
            Trace::lines("yearly", date_labels(days), values)
                .with_line(FORECAST_COLOR, 2.0)
                .on_subplot(panel),
        );
        figure
            .layout
            .set_xaxis(panel, Axis::titled("Day of year").date().with_tickformat("%B %e"))
            .set_yaxis(panel, Axis::titled("yearly"));
    }

    figure.layout.grid = Some(crate::chart::Grid {
        rows: panel,
        columns: 1,
        pattern: "independent",
    });
    figure.layout.height = Some(300 * panel as u32);
    figure.layout.dark();
    figure
}

/// Weekly component for Sunday..Saturday
pub fn weekly_profile(model: &ForecastModel) -> (Vec<String>, Vec<f64>) {
    let start = reference_day();
    let values = (0..7)
        .map(|i| model.seasonal_at(SeasonalKind::Weekly, start + Duration::days(i)))
        .collect();
    (WEEKDAYS.iter().map(|d| d.to_string()).collect(), values)
}

/// Yearly component for every day of one (non-leap) year
pub fn yearly_profile(model: &ForecastModel) -> (Vec<NaiveDate>, Vec<f64>) {
    let start = reference_day();
    let days: Vec<NaiveDate> = (0..365).map(|i| start + Duration::days(i)).collect();
    let values = days
        .iter()
        .map(|d| model.seasonal_at(SeasonalKind::Yearly, *d))
        .collect();
    (days, values)
}
