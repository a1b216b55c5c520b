//! Telegram delivery configuration.

use std::time::Duration;

/// Default Telegram Bot API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Default timeout for a single `sendMessage` call.
pub const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Destination and credentials for alert delivery.
#[derive(Clone)]
pub struct TelegramConfig {
    /// Bot token issued by BotFather
    pub bot_token: String,
    /// Chat that receives every alert
    pub chat_id: i64,
    /// API base URL, without trailing slash
    pub api_base: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .field("api_base", &self.api_base)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl TelegramConfig {
    /// Create a config for the public Bot API with the default timeout.
    pub fn new(bot_token: impl Into<String>, chat_id: i64) -> Self {
        Self {
            bot_token: bot_token.into(),
            chat_id,
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: SEND_TIMEOUT,
        }
    }

    /// Point at a different API host (self-hosted Bot API server, test double).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Full `sendMessage` endpoint.
    pub fn send_message_url(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.bot_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = TelegramConfig::new("123:abc", 42);
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(
            config.send_message_url(),
            "https://api.telegram.org/bot123:abc/sendMessage"
        );
    }

    #[test]
    fn test_api_base_trailing_slash() {
        let config = TelegramConfig::new("t", 1).with_api_base("http://localhost:8081/");
        assert_eq!(config.send_message_url(), "http://localhost:8081/bott/sendMessage");
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = TelegramConfig::new("secret-token", 7);
        let debug = format!("{:?}", config);
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("<redacted>"));
    }
}
