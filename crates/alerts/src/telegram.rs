//! Telegram Bot API delivery.

use crate::config::TelegramConfig;
use crate::notifier::{Notifier, NotifyError};
use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

/// Telegram rejects messages longer than this many characters.
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Longest slice of an error response kept in `NotifyError::Status`.
const ERROR_BODY_CHARS: usize = 200;

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
    disable_web_page_preview: bool,
}

/// Sends alerts to one chat through `sendMessage`.
pub struct TelegramNotifier {
    config: TelegramConfig,
    http_client: reqwest::Client,
}

impl TelegramNotifier {
    /// Create a notifier; the HTTP client carries the configured timeout.
    pub fn new(config: TelegramConfig) -> Result<Self, NotifyError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| NotifyError::Client(e.to_string()))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn chat_id(&self) -> i64 {
        self.config.chat_id
    }

    fn map_error(&self, err: reqwest::Error) -> NotifyError {
        if err.is_timeout() {
            NotifyError::Timeout(self.config.timeout)
        } else {
            // reqwest includes the URL, which carries the token.
            NotifyError::Request(err.without_url().to_string())
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        let text = truncate_chars(text, MAX_MESSAGE_CHARS);
        let payload = SendMessage {
            chat_id: self.config.chat_id,
            text,
            disable_web_page_preview: true,
        };

        let response = self
            .http_client
            .post(self.config.send_message_url())
            .form(&payload)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                chat_id = self.chat_id(),
                status = status.as_u16(),
                "Telegram API returned non-success status"
            );
            return Err(NotifyError::Status {
                status: status.as_u16(),
                body: truncate_chars(body.trim(), ERROR_BODY_CHARS).to_string(),
            });
        }

        debug!(chat_id = self.chat_id(), chars = text.chars().count(), "Message sent");
        Ok(())
    }
}

/// Cut `text` to at most `max` characters on a char boundary.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
