//! Poll-cycle error taxonomy.

use pricewatch_feeds::FetchError;
use thiserror::Error;

/// Failures that abort a poll cycle. All of them are caught at the cycle
/// boundary; none stop the loop.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("Page fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("No prices found on the page (they may be rendered with JavaScript)")]
    NoPrices,
}

impl CycleError {
    /// True when the next cycle is likely to succeed without intervention.
    /// A page without prices usually means the markup changed.
    pub fn is_transient(&self) -> bool {
        match self {
            CycleError::Fetch(e) => e.is_transient(),
            CycleError::NoPrices => false,
        }
    }
}
