//! Notification seam used by the poll loop.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("HTTP client setup failed: {0}")]
    Client(String),
    #[error("Telegram request failed: {0}")]
    Request(String),
    #[error("Telegram request timed out after {0:?}")]
    Timeout(Duration),
    #[error("Telegram API returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// Delivers a text message to the configured destination.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> Result<(), NotifyError>;
}

/// Notifier that records messages instead of sending them.
#[derive(Default)]
pub struct MockNotifier {
    sent: Mutex<Vec<String>>,
    /// Should sends fail.
    should_fail: AtomicBool,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent sends fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.should_fail.store(failing, Ordering::SeqCst);
    }

    /// Messages delivered so far.
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(NotifyError::Request("mock failure".to_string()));
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(text.to_string());
        }
        Ok(())
    }
}
