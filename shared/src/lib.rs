pub mod config;
pub mod templates;

pub use config::Config;
pub use templates::{DashboardTemplate, TickerOption};
