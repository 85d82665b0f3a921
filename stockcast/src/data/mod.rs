//! Data management module
//!
//! Price series, training frames and the time-bounded price cache.

pub mod cache;
pub mod frame;
pub mod price;

pub use cache::*;
pub use frame::*;
pub use price::*;
