//! Price watch engine.
//!
//! This crate contains the observation-diff-alert pipeline: per-entity price
//! history, the alert strategies, the shared status snapshot and the poll
//! loop that drives one fetch-extract-decide-notify-update cycle at a time.

pub mod error;
pub mod history;
pub mod monitor;
pub mod policy;
pub mod status;

pub use error::*;
pub use history::*;
pub use monitor::*;
pub use policy::*;
pub use status::*;
