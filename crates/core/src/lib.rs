//! Core data types for the price watcher.

pub mod observation;
pub mod price;

pub use observation::*;
pub use price::*;
