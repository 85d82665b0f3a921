//! Additive trend + seasonality model
//!
//! `y(t) = trend(t) + yearly(t) + weekly(t)`, where the trend is piecewise
//! linear with slope changes at fixed changepoints and each seasonal term is
//! a truncated Fourier series. Values are scaled by their absolute maximum
//! and time is scaled to `[0, 1]` over the history before fitting.

use crate::config::{ForecastConfig, Seasonality};
use crate::data::TrainingFrame;
use crate::forecast::{ForecastRow, ForecastTable};
use crate::{Result, StockcastError};
use chrono::{Duration, NaiveDate};
use nalgebra::{DMatrix, DVector};
use statrs::distribution::{ContinuousCDF, Normal};
use std::f64::consts::PI;
use tracing::debug;

/// Fewest observations a model can be fitted on
pub const MIN_ROWS: usize = 2;

const YEARLY_PERIOD: f64 = 365.25;
const WEEKLY_PERIOD: f64 = 7.0;
/// Smallest penalty on changepoint and seasonal coefficients; offset and
/// base slope are never penalised
const BASE_PENALTY: f64 = 1e-9;
/// Penalty on changepoint and seasonal coefficients in the noise-estimation pass
const PILOT_PENALTY: f64 = 1e-6;
/// Smallest noise variance (scaled units) the priors are scaled by: a residual
/// spread of 1% of the series maximum
const NOISE_FLOOR: f64 = 1e-4;

/// Which seasonal component to evaluate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeasonalKind {
    Yearly,
    Weekly,
}

/// Fitted Fourier series
#[derive(Debug, Clone)]
pub struct FourierTerm {
    pub period: f64,
    pub order: usize,
    /// `[sin_1, cos_1, sin_2, cos_2, ...]`
    pub coefficients: Vec<f64>,
}

impl FourierTerm {
    fn width(order: usize) -> usize {
        2 * order
    }

    fn features(period: f64, order: usize, date: NaiveDate, out: &mut Vec<f64>) {
        let x = days_since_epoch(date);
        for k in 1..=order {
            let angle = 2.0 * PI * k as f64 * x / period;
            out.push(angle.sin());
            out.push(angle.cos());
        }
    }

    fn evaluate(&self, date: NaiveDate) -> f64 {
        let mut features = Vec::with_capacity(Self::width(self.order));
        Self::features(self.period, self.order, date, &mut features);
        features.iter().zip(&self.coefficients).map(|(f, c)| f * c).sum()
    }
}

/// A fitted forecast model
#[derive(Debug, Clone)]
pub struct ForecastModel {
    config: ForecastConfig,
    history: TrainingFrame,
    start: NaiveDate,
    span_days: f64,
    y_scale: f64,
    /// Scaled time of each changepoint
    changepoints: Vec<f64>,
    /// Base slope
    k: f64,
    /// Offset
    m: f64,
    /// Slope change at each changepoint
    deltas: Vec<f64>,
    yearly: Option<FourierTerm>,
    weekly: Option<FourierTerm>,
    /// Residual standard deviation in scaled units
    sigma: f64,
    /// Normal quantile for the configured interval width
    z: f64,
}

impl ForecastModel {
    /// Fit the model to a training frame.
    ///
    /// Fails with [`StockcastError::InsufficientData`] below [`MIN_ROWS`]
    /// rows and with [`StockcastError::Fit`] when the frame spans no time or
    /// the normal equations cannot be solved.
    pub fn fit(frame: &TrainingFrame, config: &ForecastConfig) -> Result<Self> {
        let n = frame.len();
        if n < MIN_ROWS {
            return Err(StockcastError::InsufficientData {
                rows: n,
                required: MIN_ROWS,
            });
        }
        if !(config.interval_width > 0.0 && config.interval_width < 1.0) {
            return Err(StockcastError::Fit(format!(
                "interval width must be in (0, 1), got {}",
                config.interval_width
            )));
        }
        let z = Normal::new(0.0, 1.0)
            .map_err(|e| StockcastError::Fit(e.to_string()))?
            .inverse_cdf((1.0 + config.interval_width) / 2.0);

        let dates = frame.dates();
        let values = frame.values();
        if values.iter().any(|v| !v.is_finite()) {
            return Err(StockcastError::Fit("training values must be finite".to_string()));
        }

        let start = dates[0];
        let end = dates[n - 1];
        let span_days = (end - start).num_days() as f64;
        if span_days <= 0.0 {
            return Err(StockcastError::Fit("training dates span no time".to_string()));
        }

        let y_scale = match values.iter().fold(0.0_f64, |acc, v| acc.max(v.abs())) {
            s if s > 0.0 => s,
            _ => 1.0,
        };
        let t: Vec<f64> = dates
            .iter()
            .map(|d| (*d - start).num_days() as f64 / span_days)
            .collect();
        let changepoints = place_changepoints(&t, config);

        let yearly_order = enabled(config.yearly, span_days >= 2.0 * 365.0).then_some(config.yearly_order);
        let weekly_order = enabled(config.weekly, span_days >= 14.0).then_some(config.weekly_order);
        let yearly_order = yearly_order.filter(|o| *o > 0);
        let weekly_order = weekly_order.filter(|o| *o > 0);

        let layout = Layout {
            changepoints: changepoints.len(),
            yearly: yearly_order.map_or(0, FourierTerm::width),
            weekly: weekly_order.map_or(0, FourierTerm::width),
        };

        let mut design = Vec::with_capacity(n * layout.width());
        let mut row = Vec::with_capacity(layout.width());
        for (i, date) in dates.iter().enumerate() {
            row.clear();
            row.push(1.0);
            row.push(t[i]);
            row.extend(changepoints.iter().map(|s| (t[i] - s).max(0.0)));
            if let Some(order) = yearly_order {
                FourierTerm::features(YEARLY_PERIOD, order, *date, &mut row);
            }
            if let Some(order) = weekly_order {
                FourierTerm::features(WEEKLY_PERIOD, order, *date, &mut row);
            }
            design.extend_from_slice(&row);
        }
        let x = DMatrix::from_row_slice(n, layout.width(), &design);
        let y = DVector::from_iterator(n, values.iter().map(|v| v / y_scale));

        // first pass: near-unpenalised fit to estimate the noise level
        let pilot = solve(&x, &y, &layout.penalties(PILOT_PENALTY, PILOT_PENALTY))?;
        let dof = n.saturating_sub(layout.width()).max(1) as f64;
        let noise = ((&y - &x * &pilot).norm_squared() / dof).max(NOISE_FLOOR);

        // second pass: gaussian priors scaled by the estimated noise. On
        // weekday-only data the weekend values of the weekly term are pinned
        // only by its prior, so the prior must not vanish on quiet series.
        let beta = solve(
            &x,
            &y,
            &layout.penalties(
                noise / config.changepoint_prior_scale.powi(2),
                noise / config.seasonality_prior_scale.powi(2),
            ),
        )?;
        let residuals = &y - &x * &beta;
        let sigma = (residuals.norm_squared() / n as f64).sqrt();

        let coeffs: Vec<f64> = beta.iter().copied().collect();
        let (base, rest) = coeffs.split_at(2);
        let (deltas, rest) = rest.split_at(layout.changepoints);
        let (yearly_coeffs, weekly_coeffs) = rest.split_at(layout.yearly);

        let model = Self {
            config: config.clone(),
            history: frame.clone(),
            start,
            span_days,
            y_scale,
            changepoints,
            m: base[0],
            k: base[1],
            deltas: deltas.to_vec(),
            yearly: yearly_order.map(|order| FourierTerm {
                period: YEARLY_PERIOD,
                order,
                coefficients: yearly_coeffs.to_vec(),
            }),
            weekly: weekly_order.map(|order| FourierTerm {
                period: WEEKLY_PERIOD,
                order,
                coefficients: weekly_coeffs.to_vec(),
            }),
            sigma,
            z,
        };
        debug!(
            "Fitted model on {} rows: {} changepoints, yearly={}, weekly={}, sigma={:.5}",
            n,
            model.changepoints.len(),
            model.yearly.is_some(),
            model.weekly.is_some(),
            model.sigma * y_scale
        );
        Ok(model)
    }

    /// History dates followed by `horizon` consecutive calendar days
    pub fn make_future_dates(&self, horizon: usize) -> Vec<NaiveDate> {
        let mut dates = self.history.dates();
        let last = dates.last().copied().unwrap_or(self.start);
        dates.extend((1..=horizon as i64).map(|i| last + Duration::days(i)));
        dates
    }

    /// Predict every date in `dates`
    pub fn predict(&self, dates: &[NaiveDate]) -> ForecastTable {
        let rows = dates
            .iter()
            .map(|&ds| {
                let t = self.scaled_time(ds);
                let trend = self.trend_at(t) * self.y_scale;
                let yearly = self.seasonal_at(SeasonalKind::Yearly, ds);
                let weekly = self.seasonal_at(SeasonalKind::Weekly, ds);
                let yhat = trend + yearly + weekly;
                let half_width = self.z * self.uncertainty_at(t) * self.y_scale;
                ForecastRow {
                    ds,
                    yhat,
                    yhat_lower: yhat - half_width,
                    yhat_upper: yhat + half_width,
                    trend,
                    yearly,
                    weekly,
                }
            })
            .collect();
        ForecastTable::from_rows(rows)
    }

    /// Seasonal component at `date` in original units; `0.0` when not fitted
    pub fn seasonal_at(&self, kind: SeasonalKind, date: NaiveDate) -> f64 {
        self.seasonal_term(kind)
            .map_or(0.0, |term| term.evaluate(date) * self.y_scale)
    }

    pub fn seasonal_term(&self, kind: SeasonalKind) -> Option<&FourierTerm> {
        match kind {
            SeasonalKind::Yearly => self.yearly.as_ref(),
            SeasonalKind::Weekly => self.weekly.as_ref(),
        }
    }

    /// Dates at which the trend slope may change
    pub fn changepoint_dates(&self) -> Vec<NaiveDate> {
        self.changepoints
            .iter()
            .map(|s| self.start + Duration::days((s * self.span_days).round() as i64))
            .collect()
    }

    /// Training data the model was fitted on
    pub fn history(&self) -> &TrainingFrame {
        &self.history
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    fn scaled_time(&self, date: NaiveDate) -> f64 {
        (date - self.start).num_days() as f64 / self.span_days
    }

    fn trend_at(&self, t: f64) -> f64 {
        let adjust: f64 = self
            .changepoints
            .iter()
            .zip(&self.deltas)
            .map(|(s, d)| d * (t - s).max(0.0))
            .sum();
        self.m + self.k * t + adjust
    }

    /// Standard deviation in scaled units.
    ///
    /// Observation noise everywhere, plus past the end of the history the
    /// variance of future slope changes drawn at the historical rate with
    /// the historical mean magnitude.
    fn uncertainty_at(&self, t: f64) -> f64 {
        let ahead = (t - 1.0).max(0.0);
        if ahead == 0.0 || self.deltas.is_empty() {
            return self.sigma;
        }
        let rate = self.changepoints.len() as f64;
        let scale = self.deltas.iter().map(|d| d.abs()).sum::<f64>() / self.deltas.len() as f64;
        // Laplace(0, scale) has variance 2 * scale^2
        let trend_var = rate * 2.0 * scale.powi(2) * ahead.powi(3) / 3.0;
        (self.sigma.powi(2) + trend_var).sqrt()
    }
}

/// Fit, extend by `horizon` days and predict
pub fn forecast(
    frame: &TrainingFrame,
    horizon: usize,
    config: &ForecastConfig,
) -> Result<(ForecastModel, ForecastTable)> {
    let model = ForecastModel::fit(frame, config)?;
    let future = model.make_future_dates(horizon);
    let table = model.predict(&future);
    Ok((model, table))
}

/// Column counts of the design matrix after the `[1, t]` base columns
struct Layout {
    changepoints: usize,
    yearly: usize,
    weekly: usize,
}

impl Layout {
    fn width(&self) -> usize {
        2 + self.changepoints + self.yearly + self.weekly
    }

    fn penalties(&self, changepoint: f64, seasonal: f64) -> Vec<f64> {
        let mut p = vec![0.0; 2];
        p.extend(std::iter::repeat(changepoint.max(BASE_PENALTY)).take(self.changepoints));
        p.extend(std::iter::repeat(seasonal.max(BASE_PENALTY)).take(self.yearly + self.weekly));
        p
    }
}

/// Penalised least squares `min |y - Xb|^2 + sum p_i b_i^2`, solved by QR on
/// the augmented system `[X; diag(sqrt p)] b = [y; 0]`
fn solve(x: &DMatrix<f64>, y: &DVector<f64>, penalties: &[f64]) -> Result<DVector<f64>> {
    let (n, cols) = x.shape();
    let mut augmented = DMatrix::<f64>::zeros(n + cols, cols);
    augmented.rows_mut(0, n).copy_from(x);
    for (i, p) in penalties.iter().enumerate() {
        augmented[(n + i, i)] = p.sqrt();
    }
    let mut rhs = DVector::<f64>::zeros(n + cols);
    rhs.rows_mut(0, n).copy_from(y);

    let qr = augmented.qr();
    let qty = qr.q().transpose() * rhs;
    qr.r()
        .solve_upper_triangular(&qty)
        .ok_or_else(|| StockcastError::Fit("design matrix is rank deficient".to_string()))
}

/// Changepoints spread evenly over the first `changepoint_range` of history,
/// placed on observed times
fn place_changepoints(t: &[f64], config: &ForecastConfig) -> Vec<f64> {
    let range = config.changepoint_range.clamp(0.0, 1.0);
    let hist = ((t.len() as f64) * range).floor() as usize;
    let count = config.n_changepoints.min(hist.saturating_sub(1));
    if count == 0 {
        return Vec::new();
    }
    let last = (hist - 1) as f64;
    (1..=count)
        .map(|j| {
            let idx = (last * j as f64 / count as f64).round() as usize;
            t[idx]
        })
        .collect()
}

fn enabled(setting: Seasonality, auto: bool) -> bool {
    match setting {
        Seasonality::Auto => auto,
        Seasonality::Enabled => true,
        Seasonality::Disabled => false,
    }
}

fn days_since_epoch(date: NaiveDate) -> f64 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default();
    (date - epoch).num_days() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Observation;
    use chrono::{Datelike, Weekday};

    fn frame(days: usize, f: impl Fn(usize) -> f64) -> TrainingFrame {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        TrainingFrame::from_rows(
            (0..days)
                .map(|i| Observation {
                    ds: start + Duration::days(i as i64),
                    y: f(i),
                })
                .collect(),
        )
    }

    #[test]
    fn test_fit_rejects_tiny_frames() {
        let err = ForecastModel::fit(&TrainingFrame::default(), &ForecastConfig::default()).unwrap_err();
        assert!(matches!(err, StockcastError::InsufficientData { rows: 0, required: 2 }));

        let err = ForecastModel::fit(&frame(1, |_| 1.0), &ForecastConfig::default()).unwrap_err();
        assert!(matches!(err, StockcastError::InsufficientData { rows: 1, .. }));
    }

    #[test]
    fn test_fit_rejects_zero_span() {
        let day = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let frame = TrainingFrame::from_rows(vec![Observation { ds: day, y: 1.0 }, Observation { ds: day, y: 2.0 }]);
        assert!(matches!(
            ForecastModel::fit(&frame, &ForecastConfig::default()),
            Err(StockcastError::Fit(_))
        ));
    }

    #[test]
    fn test_linear_series_is_recovered() {
        let data = frame(200, |i| 50.0 + 0.5 * i as f64);
        let (_, table) = forecast(&data, 30, &ForecastConfig::default()).unwrap();

        assert_eq!(table.len(), 230);
        for (row, obs) in table.rows().iter().zip(data.rows()) {
            assert!((row.yhat - obs.y).abs() < 0.5, "{} vs {}", row.yhat, obs.y);
        }
        let last = table.rows().last().unwrap();
        let expected = 50.0 + 0.5 * 229.0;
        assert!((last.yhat - expected).abs() < 2.0, "{} vs {}", last.yhat, expected);
    }

    #[test]
    fn test_future_dates_are_consecutive() {
        let data = frame(30, |i| 10.0 + i as f64);
        let model = ForecastModel::fit(&data, &ForecastConfig::default()).unwrap();
        let dates = model.make_future_dates(10);

        assert_eq!(dates.len(), 40);
        assert_eq!(&dates[..30], data.dates().as_slice());
        for pair in dates[29..].windows(2) {
            assert_eq!(pair[1] - pair[0], Duration::days(1));
        }
    }

    #[test]
    fn test_band_contains_prediction_and_widens() {
        let data = frame(800, |i| 100.0 + 0.1 * i as f64 + (i as f64 / 9.0).sin() * 3.0);
        let (_, table) = forecast(&data, 365, &ForecastConfig::default()).unwrap();

        for row in table.rows() {
            assert!(row.yhat_lower <= row.yhat && row.yhat <= row.yhat_upper);
        }
        let first_future = &table.rows()[800];
        let last_future = table.rows().last().unwrap();
        let w0 = first_future.yhat_upper - first_future.yhat_lower;
        let w1 = last_future.yhat_upper - last_future.yhat_lower;
        assert!(w1 >= w0);
    }

    #[test]
    fn test_components_sum_to_yhat() {
        let data = frame(900, |i| 20.0 + (2.0 * PI * i as f64 / 7.0).sin() + 0.01 * i as f64);
        let (model, table) = forecast(&data, 14, &ForecastConfig::default()).unwrap();

        assert!(model.seasonal_term(SeasonalKind::Weekly).is_some());
        assert!(model.seasonal_term(SeasonalKind::Yearly).is_some());
        for row in table.rows() {
            assert!((row.trend + row.yearly + row.weekly - row.yhat).abs() < 1e-9);
        }
    }

    #[test]
    fn test_short_history_disables_seasonality() {
        let data = frame(10, |i| 5.0 + i as f64);
        let model = ForecastModel::fit(&data, &ForecastConfig::default()).unwrap();

        assert!(model.seasonal_term(SeasonalKind::Weekly).is_none());
        assert!(model.seasonal_term(SeasonalKind::Yearly).is_none());
        assert_eq!(model.seasonal_at(SeasonalKind::Weekly, data.dates()[0]), 0.0);
    }

    #[test]
    fn test_changepoints_within_range() {
        let data = frame(100, |i| i as f64);
        let model = ForecastModel::fit(&data, &ForecastConfig::default()).unwrap();
        let cps = model.changepoint_dates();

        assert_eq!(cps.len(), 25);
        let cutoff = data.dates()[79];
        assert!(cps.iter().all(|d| *d > data.dates()[0] && *d <= cutoff));
    }

    #[test]
    fn test_invalid_interval_width() {
        let config = ForecastConfig {
            interval_width: 1.5,
            ..ForecastConfig::default()
        };
        assert!(matches!(
            ForecastModel::fit(&frame(20, |i| i as f64), &config),
            Err(StockcastError::Fit(_))
        ));
    }

    #[test]
    fn test_weekday_only_quiet_series_keeps_weekends_flat() {
        let start = NaiveDate::from_ymd_opt(2012, 1, 2).unwrap();
        let rows = start
            .iter_days()
            .take(14 * 365)
            .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
            .map(|ds| Observation { ds, y: 42.0 })
            .collect();
        let data = TrainingFrame::from_rows(rows);
        let (_, table) = forecast(&data, 5 * 365, &ForecastConfig::default()).unwrap();

        let last = data.dates()[data.len() - 1];
        let (weekends, weekdays): (Vec<_>, Vec<_>) = table
            .after(last)
            .iter()
            .partition(|r| matches!(r.ds.weekday(), Weekday::Sat | Weekday::Sun));
        assert!(!weekends.is_empty());

        let low = weekdays.iter().map(|r| r.yhat).fold(f64::INFINITY, f64::min);
        let high = weekdays.iter().map(|r| r.yhat).fold(f64::NEG_INFINITY, f64::max);
        for row in &weekends {
            assert!(row.yhat >= low - 0.05 && row.yhat <= high + 0.05, "{}: {}", row.ds, row.yhat);
            assert!(row.weekly.abs() < 0.05, "{}: weekly {}", row.ds, row.weekly);
        }
    }

    #[test]
    fn test_fit_is_deterministic() {
        let data = frame(400, |i| 30.0 + (i as f64).sqrt());
        let (_, a) = forecast(&data, 20, &ForecastConfig::default()).unwrap();
        let (_, b) = forecast(&data, 20, &ForecastConfig::default()).unwrap();
        assert_eq!(a, b);
    }
}
