//! Market data module
//!
//! Fetches daily price history from an external source and caches it per ticker.

pub mod loader;
pub mod source;
pub mod yahoo;

pub use loader::*;
pub use source::*;
pub use yahoo::*;
