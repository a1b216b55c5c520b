//! Application configuration from environment variables.

use pricewatch_alerts::{config::DEFAULT_API_BASE, TelegramConfig};
use pricewatch_core::Price;
use pricewatch_engine::{AlertStrategy, StrategyKind};
use pricewatch_feeds::ExtractorConfig;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const DEFAULT_TARGET_URL: &str = "https://www.tiendaclaro.pe/";
pub const DEFAULT_PRICE_THRESHOLD: f64 = 100.0;
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 1800;
pub const DEFAULT_ALERT_MIN_DROP: f64 = 300.0;
pub const DEFAULT_ALERT_PCT_DROP: f64 = 0.3;
pub const DEFAULT_LISTEN_PORT: u16 = 10000;

/// Configuration errors. These are the only fatal errors in the process.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Application configuration.
#[derive(Clone)]
pub struct AppConfig {
    /// Telegram bot token.
    pub messaging_token: String,
    /// Telegram chat that receives alerts.
    pub destination_id: i64,
    /// Listing page to poll.
    pub target_url: Url,
    /// Threshold strategy trigger price.
    pub price_threshold: f64,
    /// Delay between poll cycles.
    pub poll_interval: Duration,
    /// Drop strategy absolute trigger.
    pub alert_min_drop: f64,
    /// Drop strategy relative trigger (fraction).
    pub alert_pct_drop: f64,
    /// Status server port.
    pub listen_port: u16,
    pub strategy: StrategyKind,
    /// Product-name markers for labeled extraction.
    pub product_keywords: Vec<String>,
    pub currency_marker: String,
    /// Plausibility floor for extracted prices.
    pub min_plausible_price: f64,
    /// Telegram API base URL.
    pub messaging_api_base: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("messaging_token", &"<redacted>")
            .field("destination_id", &self.destination_id)
            .field("target_url", &self.target_url.as_str())
            .field("price_threshold", &self.price_threshold)
            .field("poll_interval", &self.poll_interval)
            .field("alert_min_drop", &self.alert_min_drop)
            .field("alert_pct_drop", &self.alert_pct_drop)
            .field("listen_port", &self.listen_port)
            .field("strategy", &self.strategy)
            .field("product_keywords", &self.product_keywords)
            .field("currency_marker", &self.currency_marker)
            .field("min_plausible_price", &self.min_plausible_price)
            .field("messaging_api_base", &self.messaging_api_base)
            .finish()
    }
}

impl AppConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` for each variable. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let messaging_token = get("MESSAGING_TOKEN").ok_or(ConfigError::Missing("MESSAGING_TOKEN"))?;
        let destination_id = get("DESTINATION_ID").ok_or(ConfigError::Missing("DESTINATION_ID"))?;
        let destination_id = parse_value("DESTINATION_ID", &destination_id)?;

        let target_url = get("TARGET_URL").unwrap_or_else(|| DEFAULT_TARGET_URL.to_string());
        let target_url = Url::parse(&target_url).map_err(|e| ConfigError::Invalid {
            var: "TARGET_URL",
            reason: e.to_string(),
        })?;
        if !matches!(target_url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid {
                var: "TARGET_URL",
                reason: format!("unsupported scheme '{}'", target_url.scheme()),
            });
        }

        let price_threshold = non_negative(
            "PRICE_THRESHOLD",
            parse_or(&get, "PRICE_THRESHOLD", DEFAULT_PRICE_THRESHOLD)?,
        )?;
        let interval_secs: u64 =
            parse_or(&get, "POLL_INTERVAL_SECONDS", DEFAULT_POLL_INTERVAL_SECS)?;
        if interval_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "POLL_INTERVAL_SECONDS",
                reason: "must be greater than zero".to_string(),
            });
        }
        let alert_min_drop = non_negative(
            "ALERT_MIN_DROP",
            parse_or(&get, "ALERT_MIN_DROP", DEFAULT_ALERT_MIN_DROP)?,
        )?;
        let alert_pct_drop = non_negative(
            "ALERT_PCT_DROP",
            parse_or(&get, "ALERT_PCT_DROP", DEFAULT_ALERT_PCT_DROP)?,
        )?;
        let listen_port = parse_or(&get, "LISTEN_PORT", DEFAULT_LISTEN_PORT)?;
        let strategy = parse_or(&get, "ALERT_STRATEGY", StrategyKind::default())?;

        let defaults = ExtractorConfig::default();
        let product_keywords = match get("PRODUCT_KEYWORDS") {
            Some(list) => list
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            None => defaults.product_keywords,
        };
        let currency_marker = get("CURRENCY_MARKER").unwrap_or(defaults.currency_marker);
        let min_plausible_price = positive(
            "MIN_PLAUSIBLE_PRICE",
            parse_or(&get, "MIN_PLAUSIBLE_PRICE", defaults.min_price.to_f64())?,
        )?;
        let messaging_api_base =
            get("MESSAGING_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        Ok(Self {
            messaging_token,
            destination_id,
            target_url,
            price_threshold,
            poll_interval: Duration::from_secs(interval_secs),
            alert_min_drop,
            alert_pct_drop,
            listen_port,
            strategy,
            product_keywords,
            currency_marker,
            min_plausible_price,
            messaging_api_base,
        })
    }

    /// Resolve the configured strategy with its parameters.
    pub fn alert_strategy(&self) -> AlertStrategy {
        match self.strategy {
            StrategyKind::Threshold => AlertStrategy::Threshold {
                threshold: Price::from_f64(self.price_threshold),
            },
            StrategyKind::AnyChange => AlertStrategy::AnyChange,
            StrategyKind::DropMagnitude => AlertStrategy::DropMagnitude {
                min_drop: self.alert_min_drop,
                min_pct: self.alert_pct_drop,
            },
        }
    }

    pub fn extractor_config(&self) -> ExtractorConfig {
        ExtractorConfig {
            currency_marker: self.currency_marker.clone(),
            min_price: Price::from_f64(self.min_plausible_price),
            mode: self.alert_strategy().extract_mode(),
            product_keywords: self.product_keywords.clone(),
            ..Default::default()
        }
    }

    pub fn telegram_config(&self) -> TelegramConfig {
        TelegramConfig::new(self.messaging_token.clone(), self.destination_id)
            .with_api_base(self.messaging_api_base.clone())
    }
}

fn parse_value<T>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
        var,
        reason: format!("'{}': {}", raw, e),
    })
}

fn parse_or<T, G>(get: &G, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    G: Fn(&str) -> Option<String>,
{
    match get(var) {
        Some(raw) => parse_value(var, &raw),
        None => Ok(default),
    }
}

fn non_negative(var: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::Invalid {
            var,
            reason: format!("{} must be a non-negative number", value),
        })
    }
}

fn positive(var: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::Invalid {
            var,
            reason: format!("{} must be greater than zero", value),
        })
    }
}
