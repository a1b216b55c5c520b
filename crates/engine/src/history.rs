//! In-memory price history.
//!
//! Owned exclusively by the poll loop; it lives for the process lifetime
//! and only ever reflects the last successful cycle.

use pricewatch_core::Price;
use std::collections::{BTreeMap, HashMap};

/// Last recorded state per entity plus the strategy bookkeeping that
/// suppresses repeat alerts.
#[derive(Debug, Clone, Default)]
pub struct History {
    /// Entity-key -> last observed price
    prices: HashMap<String, Price>,
    /// Full price sequence of the previous successful cycle
    baseline: Option<Vec<Price>>,
    /// Price that triggered the most recent threshold alert
    last_alerted: Option<Price>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last price recorded for `key`.
    pub fn get(&self, key: &str) -> Option<Price> {
        self.prices.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Ordered prices from the previous successful cycle.
    pub fn baseline(&self) -> Option<&[Price]> {
        self.baseline.as_deref()
    }

    pub fn last_alerted(&self) -> Option<Price> {
        self.last_alerted
    }

    /// Fold a cycle's mutations in. Fields left `None` in the update keep
    /// their current value.
    pub fn apply(&mut self, update: HistoryUpdate) {
        self.prices.extend(update.entries);
        if let Some(baseline) = update.baseline {
            self.baseline = Some(baseline);
        }
        if let Some(alerted) = update.alerted {
            self.last_alerted = Some(alerted);
        }
    }
}

/// Mutations computed by the alert policy for one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryUpdate {
    /// Entity-key -> new price
    pub entries: BTreeMap<String, Price>,
    /// New baseline sequence
    pub baseline: Option<Vec<Price>>,
    /// New last-alerted price
    pub alerted: Option<Price>,
}

impl HistoryUpdate {
    /// Drop the last-alerted change, used when the alert could not be delivered
    /// so the next cycle retries it.
    pub fn discard_alert(&mut self) {
        self.alerted = None;
    }
}
