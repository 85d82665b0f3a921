//! Configuration module

pub mod forecast;
pub mod loader;

pub use forecast::*;
pub use loader::*;
