//! Two-column training data for the forecast model

use crate::data::PriceSeries;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single `(ds, y)` observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub ds: NaiveDate,
    pub y: f64,
}

/// Date/value pairs the forecast model is fitted on
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TrainingFrame {
    rows: Vec<Observation>,
}

impl TrainingFrame {
    /// Project `(date, close)` out of a price series. One row per bar.
    pub fn from_series(series: &PriceSeries) -> Self {
        let rows = series
            .bars()
            .iter()
            .map(|b| Observation { ds: b.date, y: b.close })
            .collect();
        Self { rows }
    }

    /// Build from rows that are already date-ordered
    pub fn from_rows(rows: Vec<Observation>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Observation] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.rows.iter().map(|r| r.ds).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.y).collect()
    }
}
