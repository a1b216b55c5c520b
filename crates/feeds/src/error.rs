//! Error types for page fetching and price extraction.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while fetching the product page.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP client setup failed: {0}")]
    Client(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Failed to read page body: {0}")]
    Body(String),
}

impl FetchError {
    /// Returns true if the next poll cycle is likely to succeed without intervention.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Request(_) | FetchError::Timeout(_) | FetchError::Body(_) => true,
            FetchError::Status { status, .. } => *status == 429 || *status >= 500,
            FetchError::Client(_) => false,
        }
    }
}

/// Errors raised while building a `PriceExtractor`.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Currency marker must not be empty")]
    EmptyMarker,

    #[error("Plausibility floor must be greater than zero")]
    NonPositiveFloor,

    #[error("Labeled extraction needs at least one product keyword")]
    NoKeywords,

    #[error("Invalid extraction pattern: {0}")]
    Pattern(#[from] regex::Error),
}
