//! Telegram notifications for price events.
//!
//! This crate provides:
//! - The `Notifier` seam used by the poll loop
//! - A Telegram Bot API implementation with bounded timeouts
//! - A recording notifier for tests

pub mod config;
pub mod notifier;
pub mod telegram;

pub use config::TelegramConfig;
pub use notifier::{MockNotifier, Notifier, NotifyError};
pub use telegram::TelegramNotifier;
