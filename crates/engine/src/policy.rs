//! Alert policy.
//!
//! Decides, from one cycle's observations and the current history, whether
//! to notify and what to write back into history. Pure: no I/O.

use crate::history::{History, HistoryUpdate};
use pricewatch_core::{ObservationSet, Price, PAGE_KEY};
use pricewatch_feeds::ExtractMode;
use std::fmt::Write as _;
use std::str::FromStr;

/// Comparison strategy. Exactly one is active per process.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AlertStrategy {
    /// Notify when the lowest price is at or below `threshold` and differs
    /// from the last alerted minimum.
    Threshold { threshold: Price },
    /// Notify whenever the ordered price list differs from the previous cycle.
    AnyChange,
    /// Notify per label when the price fell by at least `min_drop` currency
    /// units or by at least `min_pct` (a fraction, 0.3 = 30%).
    DropMagnitude { min_drop: f64, min_pct: f64 },
}

impl AlertStrategy {
    /// Extraction mode this strategy consumes.
    pub fn extract_mode(&self) -> ExtractMode {
        match self {
            AlertStrategy::Threshold { .. } | AlertStrategy::AnyChange => ExtractMode::Unlabeled,
            AlertStrategy::DropMagnitude { .. } => ExtractMode::Labeled,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AlertStrategy::Threshold { .. } => "threshold",
            AlertStrategy::AnyChange => "change",
            AlertStrategy::DropMagnitude { .. } => "drop",
        }
    }
}

/// Strategy selector as written in configuration, before its parameters are known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrategyKind {
    #[default]
    Threshold,
    AnyChange,
    DropMagnitude,
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "threshold" => Ok(StrategyKind::Threshold),
            "change" | "any-change" | "any_change" => Ok(StrategyKind::AnyChange),
            "drop" | "drop-magnitude" | "drop_magnitude" => Ok(StrategyKind::DropMagnitude),
            other => Err(format!(
                "unknown strategy '{}' (expected threshold, change or drop)",
                other
            )),
        }
    }
}

/// Price decrease of one labeled entity between consecutive cycles.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceDrop {
    pub label: String,
    pub old: Price,
    pub new: Price,
    /// old - new
    pub drop_abs: f64,
    /// drop_abs / old; 0 without a positive baseline
    pub drop_pct: f64,
}

impl PriceDrop {
    pub fn between(label: impl Into<String>, old: Price, new: Price) -> Self {
        Self {
            label: label.into(),
            old,
            new,
            drop_abs: Price::drop_amount(old, new),
            drop_pct: Price::drop_ratio(old, new),
        }
    }

    /// A drop qualifies on either rule. An unchanged or risen price never does.
    pub fn is_significant(&self, min_drop: f64, min_pct: f64) -> bool {
        self.drop_abs > 0.0 && (self.drop_abs >= min_drop || self.drop_pct >= min_pct)
    }
}

/// Outcome of one policy evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertDecision {
    pub should_notify: bool,
    /// Empty when `should_notify` is false.
    pub message: String,
    pub history: HistoryUpdate,
    /// Flagged labels (drop-magnitude only).
    pub drops: Vec<PriceDrop>,
}

impl AlertDecision {
    fn quiet(history: HistoryUpdate) -> Self {
        Self {
            should_notify: false,
            message: String::new(),
            history,
            drops: Vec::new(),
        }
    }

    fn notify(message: String, history: HistoryUpdate) -> Self {
        Self {
            should_notify: true,
            message,
            history,
            drops: Vec::new(),
        }
    }
}

/// Applies an `AlertStrategy` and composes the alert text.
#[derive(Debug, Clone)]
pub struct AlertPolicy {
    strategy: AlertStrategy,
    target_url: String,
    currency: String,
}

impl AlertPolicy {
    pub fn new(strategy: AlertStrategy, target_url: impl Into<String>) -> Self {
        Self {
            strategy,
            target_url: target_url.into(),
            currency: "S/".to_string(),
        }
    }

    /// Currency marker printed in front of prices in messages.
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn strategy(&self) -> AlertStrategy {
        self.strategy
    }

    /// Evaluate one cycle.
    pub fn decide(&self, observations: &ObservationSet, history: &History) -> AlertDecision {
        match self.strategy {
            AlertStrategy::Threshold { threshold } => {
                self.decide_threshold(observations, history, threshold)
            }
            AlertStrategy::AnyChange => self.decide_any_change(observations, history),
            AlertStrategy::DropMagnitude { min_drop, min_pct } => {
                self.decide_drop(observations, history, min_drop, min_pct)
            }
        }
    }

    fn decide_threshold(
        &self,
        observations: &ObservationSet,
        history: &History,
        threshold: Price,
    ) -> AlertDecision {
        let Some(min) = observations.min_price() else {
            return AlertDecision::quiet(HistoryUpdate::default());
        };
        let prices = observations.prices();
        let mut update = page_update(min, &prices);

        if min > threshold || history.last_alerted() == Some(min) {
            return AlertDecision::quiet(update);
        }

        update.alerted = Some(min);
        let message = format!(
            "📉 Price below threshold!\n\n\
             URL: {}\n\
             Lowest price: {}\n\
             Threshold: {}\n\n\
             Prices found: {}",
            self.target_url,
            self.money(min),
            self.money(threshold),
            self.price_list(&prices),
        );
        AlertDecision::notify(message, update)
    }

    fn decide_any_change(&self, observations: &ObservationSet, history: &History) -> AlertDecision {
        let prices = observations.prices();
        let Some(min) = observations.min_price() else {
            return AlertDecision::quiet(HistoryUpdate::default());
        };
        let update = page_update(min, &prices);

        let previous = history.baseline();
        if previous == Some(prices.as_slice()) {
            return AlertDecision::quiet(update);
        }

        let previous = match previous {
            Some(previous) => self.price_list(previous),
            None => "none (first check)".to_string(),
        };
        let message = format!(
            "🔔 Prices changed\n\n\
             URL: {}\n\
             Previous: {}\n\
             Current: {}",
            self.target_url,
            previous,
            self.price_list(&prices),
        );
        AlertDecision::notify(message, update)
    }

    fn decide_drop(
        &self,
        observations: &ObservationSet,
        history: &History,
        min_drop: f64,
        min_pct: f64,
    ) -> AlertDecision {
        // Fold by entity: first-seen order, later prices overwrite earlier ones.
        let mut latest: Vec<(&str, Price)> = Vec::new();
        for obs in observations {
            let key = obs.entity_key();
            match latest.iter_mut().find(|(k, _)| *k == key) {
                Some(entry) => entry.1 = obs.price,
                None => latest.push((key, obs.price)),
            }
        }

        let mut update = HistoryUpdate::default();
        let mut drops = Vec::new();
        for (key, new) in latest {
            if let Some(old) = history.get(key) {
                let drop = PriceDrop::between(key, old, new);
                if drop.is_significant(min_drop, min_pct) {
                    drops.push(drop);
                }
            }
            update.entries.insert(key.to_string(), new);
        }

        if drops.is_empty() {
            return AlertDecision::quiet(update);
        }

        let mut message = format!("📉 Price drops detected\n\nURL: {}\n", self.target_url);
        for drop in &drops {
            let _ = write!(
                message,
                "\n• {}\n  {} → {}\n  Drop: {} {:.1} ({:.1}%)\n",
                drop.label,
                self.money(drop.old),
                self.money(drop.new),
                self.currency,
                drop.drop_abs,
                drop.drop_pct * 100.0,
            );
        }

        AlertDecision {
            should_notify: true,
            message: message.trim_end().to_string(),
            history: update,
            drops,
        }
    }

    fn money(&self, price: Price) -> String {
        format!("{} {}", self.currency, price)
    }

    fn price_list(&self, prices: &[Price]) -> String {
        prices
            .iter()
            .map(|p| self.money(*p))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// History mutation shared by the unlabeled strategies.
fn page_update(min: Price, prices: &[Price]) -> HistoryUpdate {
    let mut update = HistoryUpdate {
        baseline: Some(prices.to_vec()),
        ..Default::default()
    };
    update.entries.insert(PAGE_KEY.to_string(), min);
    update
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use pricewatch_core::Observation;

    const URL: &str = "https://www.tiendaclaro.pe/";

    fn p(value: f64) -> Price {
        Price::from_f64(value)
    }

    fn unlabeled(values: &[f64]) -> ObservationSet {
        ObservationSet::unlabeled(values.iter().map(|v| p(*v)))
    }

    fn labeled(items: &[(&str, f64)]) -> ObservationSet {
        ObservationSet::labeled(
            items
                .iter()
                .map(|(label, value)| Observation::labeled(*label, p(*value))),
        )
    }

    fn drop_policy() -> AlertPolicy {
        AlertPolicy::new(
            AlertStrategy::DropMagnitude {
                min_drop: 300.0,
                min_pct: 0.3,
            },
            URL,
        )
    }

    /// Run decide + apply for each cycle, as the poll loop does.
    fn run_cycles(policy: &AlertPolicy, cycles: &[ObservationSet]) -> Vec<bool> {
        let mut history = History::new();
        cycles
            .iter()
            .map(|set| {
                let decision = policy.decide(set, &history);
                history.apply(decision.history);
                decision.should_notify
            })
            .collect()
    }

    #[test]
    fn test_strategy_kind_parse() {
        assert_eq!("threshold".parse::<StrategyKind>(), Ok(StrategyKind::Threshold));
        assert_eq!(" Change ".parse::<StrategyKind>(), Ok(StrategyKind::AnyChange));
        assert_eq!(
            "drop-magnitude".parse::<StrategyKind>(),
            Ok(StrategyKind::DropMagnitude)
        );
        assert!("combined".parse::<StrategyKind>().is_err());
    }

    #[test]
    fn test_extract_modes() {
        let threshold = AlertStrategy::Threshold { threshold: p(100.0) };
        assert_eq!(threshold.extract_mode(), ExtractMode::Unlabeled);
        assert_eq!(AlertStrategy::AnyChange.extract_mode(), ExtractMode::Unlabeled);
        assert_eq!(drop_policy().strategy().extract_mode(), ExtractMode::Labeled);
    }

    #[test]
    fn test_threshold_suppresses_repeat_minimum() {
        let policy = AlertPolicy::new(AlertStrategy::Threshold { threshold: p(100.0) }, URL);
        let cycles = [
            unlabeled(&[150.0, 200.0]),
            unlabeled(&[90.0, 200.0]),
            unlabeled(&[90.0, 210.0]),
            unlabeled(&[50.0]),
        ];
        assert_eq!(run_cycles(&policy, &cycles), vec![false, true, false, true]);
    }

    #[test]
    fn test_threshold_boundary_is_inclusive() {
        let policy = AlertPolicy::new(AlertStrategy::Threshold { threshold: p(100.0) }, URL);
        let decision = policy.decide(&unlabeled(&[100.0]), &History::new());
        assert!(decision.should_notify);
        assert_eq!(decision.history.alerted, Some(p(100.0)));
    }

    #[test]
    fn test_threshold_message_lists_all_prices() {
        let policy = AlertPolicy::new(AlertStrategy::Threshold { threshold: p(100.0) }, URL);
        let decision = policy.decide(&unlabeled(&[120.0, 89.9]), &History::new());
        assert_eq!(
            decision.message,
            "📉 Price below threshold!\n\n\
             URL: https://www.tiendaclaro.pe/\n\
             Lowest price: S/ 89.90\n\
             Threshold: S/ 100.00\n\n\
             Prices found: S/ 89.90, S/ 120.00"
        );
        assert_eq!(decision.history.entries.get(PAGE_KEY), Some(&p(89.9)));
    }

    #[test]
    fn test_threshold_quiet_above_threshold_records_history() {
        let policy = AlertPolicy::new(AlertStrategy::Threshold { threshold: p(100.0) }, URL);
        let decision = policy.decide(&unlabeled(&[150.0]), &History::new());
        assert!(!decision.should_notify);
        assert!(decision.message.is_empty());
        assert_eq!(decision.history.alerted, None);
        assert_eq!(decision.history.baseline, Some(vec![p(150.0)]));
    }

    #[test]
    fn test_any_change_compares_full_sequence() {
        let policy = AlertPolicy::new(AlertStrategy::AnyChange, URL);
        let cycles = [
            unlabeled(&[10.0, 20.0]),
            unlabeled(&[10.0, 20.0]),
            unlabeled(&[10.0, 25.0]),
        ];
        assert_eq!(run_cycles(&policy, &cycles), vec![true, false, true]);
    }

    #[test]
    fn test_any_change_messages() {
        let policy = AlertPolicy::new(AlertStrategy::AnyChange, URL);
        let mut history = History::new();

        let first = policy.decide(&unlabeled(&[10.0, 20.0]), &history);
        assert!(first.message.contains("Previous: none (first check)"));
        history.apply(first.history);

        let second = policy.decide(&unlabeled(&[10.0, 25.0]), &history);
        assert!(second
            .message
            .contains("Previous: S/ 10.00, S/ 20.00\nCurrent: S/ 10.00, S/ 25.00"));
    }

    #[test]
    fn test_drop_flags_absolute_drop() {
        let mut history = History::new();
        history.apply(drop_policy().decide(&labeled(&[("iPhone 15", 1000.0)]), &history).history);

        let decision = drop_policy().decide(&labeled(&[("iPhone 15", 650.0)]), &history);
        assert!(decision.should_notify);
        assert_eq!(decision.drops.len(), 1);
        assert_eq!(decision.drops[0].drop_abs, 350.0);
        assert_eq!(
            decision.message,
            "📉 Price drops detected\n\n\
             URL: https://www.tiendaclaro.pe/\n\n\
             • iPhone 15\n  S/ 1000.00 → S/ 650.00\n  Drop: S/ 350.0 (35.0%)"
        );
    }

    #[test]
    fn test_drop_below_both_rules_not_flagged() {
        let drop = PriceDrop::between("x", p(1000.0), p(800.0));
        assert_eq!(drop.drop_abs, 200.0);
        assert!((drop.drop_pct - 0.2).abs() < 1e-12);
        assert!(!drop.is_significant(300.0, 0.3));
    }

    #[test]
    fn test_drop_percentage_rule_alone() {
        // 40 is far below min_drop but is 40% of 100.
        let drop = PriceDrop::between("x", p(100.0), p(60.0));
        assert!(drop.is_significant(300.0, 0.3));
    }

    #[test]
    fn test_drop_zero_baseline_uses_absolute_rule_only() {
        let drop = PriceDrop::between("x", Price(0), p(50.0));
        assert_eq!(drop.drop_pct, 0.0);
        assert!(!drop.is_significant(300.0, 0.0));
    }

    #[test]
    fn test_drop_rise_or_flat_never_flagged() {
        assert!(!PriceDrop::between("x", p(500.0), p(500.0)).is_significant(0.0, 0.0));
        assert!(!PriceDrop::between("x", p(500.0), p(900.0)).is_significant(0.0, 0.0));
    }

    #[test]
    fn test_drop_history_updated_unconditionally() {
        let policy = drop_policy();
        let mut history = History::new();

        // First sighting: recorded, never flagged.
        let first = policy.decide(&labeled(&[("Moto G", 1000.0), ("Honor 200", 2000.0)]), &history);
        assert!(!first.should_notify);
        history.apply(first.history);
        assert_eq!(history.get("Moto G"), Some(p(1000.0)));

        // Small drop: not flagged but still written.
        let second = policy.decide(&labeled(&[("Moto G", 900.0)]), &history);
        assert!(!second.should_notify);
        history.apply(second.history);
        assert_eq!(history.get("Moto G"), Some(p(900.0)));
        assert_eq!(history.get("Honor 200"), Some(p(2000.0)));

        // Replaying an identical cycle never flags.
        let big = labeled(&[("Honor 200", 1200.0)]);
        let third = policy.decide(&big, &history);
        assert!(third.should_notify);
        history.apply(third.history);
        let replay = policy.decide(&big, &history);
        assert!(!replay.should_notify);
    }

    #[test]
    fn test_drop_repeated_label_last_write_wins() {
        let policy = drop_policy();
        let mut history = History::new();
        history.apply(policy.decide(&labeled(&[("iPhone 15", 1000.0)]), &history).history);

        // Later mention wins: 950 is compared, not 600.
        let decision = policy.decide(&labeled(&[("iPhone 15", 600.0), ("iPhone 15", 950.0)]), &history);
        assert!(!decision.should_notify);
        assert_eq!(decision.history.entries.get("iPhone 15"), Some(&p(950.0)));
    }

    #[test]
    fn test_drop_message_lists_only_flagged_labels() {
        let policy = drop_policy();
        let mut history = History::new();
        history.apply(
            policy
                .decide(&labeled(&[("A", 1000.0), ("B", 1000.0), ("C", 80.0)]), &history)
                .history,
        );

        let decision = policy.decide(&labeled(&[("A", 990.0), ("B", 500.0), ("C", 50.0)]), &history);
        let labels: Vec<&str> = decision.drops.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, vec!["B", "C"]);
        assert!(!decision.message.contains("• A"));
        assert!(decision.message.contains("Drop: S/ 30.0 (37.5%)"));
    }
}
