//! Forecast engine module
//!
//! Fits an additive trend + seasonality model on a training frame and
//! predicts over the history plus a future horizon.

pub mod cache;
pub mod model;
pub mod table;

pub use cache::*;
pub use model::*;
pub use table::*;
