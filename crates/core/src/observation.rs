//! Per-cycle price observations.

use crate::Price;
use serde::Serialize;
use std::collections::HashSet;

/// History key used for prices that carry no product label.
pub const PAGE_KEY: &str = "__page__";

/// One extracted (label?, price) pair from a single page fetch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Observation {
    /// Product name, when the extractor found one before the price.
    pub label: Option<String>,
    pub price: Price,
}

impl Observation {
    pub fn unlabeled(price: Price) -> Self {
        Self { label: None, price }
    }

    pub fn labeled(label: impl Into<String>, price: Price) -> Self {
        Self {
            label: Some(label.into()),
            price,
        }
    }

    /// Key this observation is tracked under in history.
    pub fn entity_key(&self) -> &str {
        self.label.as_deref().unwrap_or(PAGE_KEY)
    }
}

/// Ordered, deduplicated observations for one poll cycle.
///
/// Unlabeled sets hold unique prices sorted ascending. Labeled sets hold one
/// entry per distinct (label, price) pair in first-seen order; a label may
/// repeat with different prices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ObservationSet(Vec<Observation>);

impl ObservationSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an unlabeled set: duplicates collapse, ascending order.
    pub fn unlabeled(prices: impl IntoIterator<Item = Price>) -> Self {
        let mut prices: Vec<Price> = prices.into_iter().collect();
        prices.sort_unstable();
        prices.dedup();
        Self(prices.into_iter().map(Observation::unlabeled).collect())
    }

    /// Build a labeled set: exact (label, price) repeats collapse, first-seen order kept.
    pub fn labeled(observations: impl IntoIterator<Item = Observation>) -> Self {
        let mut seen = HashSet::new();
        let observations = observations
            .into_iter()
            .filter(|obs| seen.insert(obs.clone()))
            .collect();
        Self(observations)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Observation> {
        self.0.iter()
    }

    /// Prices in set order.
    pub fn prices(&self) -> Vec<Price> {
        self.0.iter().map(|obs| obs.price).collect()
    }

    /// Lowest observed price.
    pub fn min_price(&self) -> Option<Price> {
        self.0.iter().map(|obs| obs.price).min()
    }
}

impl<'a> IntoIterator for &'a ObservationSet {
    type Item = &'a Observation;
    type IntoIter = std::slice::Iter<'a, Observation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn p(value: f64) -> Price {
        Price::from_f64(value)
    }

    #[test]
    fn test_unlabeled_sorted_and_unique() {
        let set = ObservationSet::unlabeled([p(150.0), p(89.9), p(150.0), p(20.0)]);
        assert_eq!(set.prices(), vec![p(20.0), p(89.9), p(150.0)]);
        assert_eq!(set.min_price(), Some(p(20.0)));
        assert!(set.iter().all(|obs| obs.entity_key() == PAGE_KEY));
    }

    #[test]
    fn test_labeled_keeps_first_seen_order() {
        let set = ObservationSet::labeled([
            Observation::labeled("iPhone 15", p(3499.0)),
            Observation::labeled("Galaxy S24", p(2999.0)),
            Observation::labeled("iPhone 15", p(3499.0)),
            Observation::labeled("iPhone 15", p(3199.0)),
        ]);
        assert_eq!(set.len(), 3);
        let keys: Vec<&str> = set.iter().map(Observation::entity_key).collect();
        assert_eq!(keys, vec!["iPhone 15", "Galaxy S24", "iPhone 15"]);
        assert_eq!(set.prices(), vec![p(3499.0), p(2999.0), p(3199.0)]);
    }

    #[test]
    fn test_empty_set() {
        let set = ObservationSet::new();
        assert!(set.is_empty());
        assert_eq!(set.min_price(), None);
    }

    #[test]
    fn test_serializes_as_list() {
        let set = ObservationSet::labeled([Observation::labeled("Moto G", p(499.0))]);
        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(json, serde_json::json!([{ "label": "Moto G", "price": 499.0 }]));
    }
}
