//! Chart module
//!
//! Figures are plain data serialised in the plotly.js figure format and
//! rendered by the browser.

pub mod figure;
pub mod plots;

pub use figure::*;
pub use plots::*;
