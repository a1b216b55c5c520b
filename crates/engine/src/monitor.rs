//! Poll loop.
//!
//! `PriceMonitor::run_one_cycle` performs a single fetch-extract-decide-
//! notify-update pass and never fails; `run` repeats it forever with a sleep
//! between cycles.

use crate::error::CycleError;
use crate::history::History;
use crate::policy::AlertPolicy;
use crate::status::StatusHandle;
use chrono::Utc;
use pricewatch_alerts::Notifier;
use pricewatch_feeds::{visible_text, PageSource, PriceExtractor};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Default delay between poll cycles.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1800);

/// Poll loop settings.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Sleep between cycles.
    pub interval: Duration,
    /// Sent once when `run` starts; `None` disables it.
    pub startup_message: Option<String>,
    /// Send a best-effort message when a cycle fails.
    pub error_alerts: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            startup_message: None,
            error_alerts: true,
        }
    }
}

/// What a cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleReport {
    /// The policy flagged the cycle. `delivered` is false when the send failed.
    Alerted { observations: usize, delivered: bool },
    /// Observations recorded, nothing to report.
    Quiet { observations: usize },
    /// The cycle aborted; history is unchanged.
    Failed { error: String },
}

/// Owns history and drives the pipeline.
pub struct PriceMonitor {
    source: Arc<dyn PageSource>,
    extractor: PriceExtractor,
    policy: AlertPolicy,
    notifier: Arc<dyn Notifier>,
    history: History,
    status: StatusHandle,
    config: MonitorConfig,
}

impl PriceMonitor {
    pub fn new(
        source: Arc<dyn PageSource>,
        extractor: PriceExtractor,
        policy: AlertPolicy,
        notifier: Arc<dyn Notifier>,
        status: StatusHandle,
        config: MonitorConfig,
    ) -> Self {
        Self {
            source,
            extractor,
            policy,
            notifier,
            history: History::new(),
            status,
            config,
        }
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn status(&self) -> &StatusHandle {
        &self.status
    }

    /// Run one cycle. Every failure is folded into the returned report and
    /// the shared status.
    pub async fn run_one_cycle(&mut self) -> CycleReport {
        match self.poll().await {
            Ok(report) => report,
            Err(err) => {
                let reason = err.to_string();
                if err.is_transient() {
                    warn!(url = self.source.url(), error = %reason, "Price check failed");
                } else {
                    error!(url = self.source.url(), error = %reason, "Price check failed");
                }
                self.status.record_failure(reason.clone()).await;
                if self.config.error_alerts {
                    self.notify_failure(&err).await;
                }
                CycleReport::Failed { error: reason }
            }
        }
    }

    async fn poll(&mut self) -> Result<CycleReport, CycleError> {
        let body = self.source.fetch().await?;
        let observations = self.extractor.extract(&visible_text(&body));
        if observations.is_empty() {
            return Err(CycleError::NoPrices);
        }
        debug!(
            count = observations.len(),
            prices = ?observations.prices().iter().map(ToString::to_string).collect::<Vec<_>>(),
            "Prices found"
        );

        let mut decision = self.policy.decide(&observations, &self.history);
        let count = observations.len();

        let report = if decision.should_notify {
            let delivered = match self.notifier.send(&decision.message).await {
                Ok(()) => {
                    info!(
                        strategy = self.policy.strategy().name(),
                        drops = decision.drops.len(),
                        "Alert sent"
                    );
                    true
                }
                Err(e) => {
                    error!(error = %e, "Failed to send alert");
                    decision.history.discard_alert();
                    false
                }
            };
            CycleReport::Alerted {
                observations: count,
                delivered,
            }
        } else {
            debug!(strategy = self.policy.strategy().name(), "No alert this cycle");
            CycleReport::Quiet {
                observations: count,
            }
        };

        self.history.apply(decision.history);
        self.status.record_success(observations, Utc::now()).await;
        Ok(report)
    }

    async fn notify_failure(&self, err: &CycleError) {
        let message = format!(
            "⚠️ Price check failed\n\nURL: {}\nError: {}",
            self.source.url(),
            err
        );
        if let Err(e) = self.notifier.send(&message).await {
            warn!(error = %e, "Failed to send error notification");
        }
    }

    /// Send the startup message, if configured. Failure is logged and ignored.
    pub async fn announce_startup(&self) {
        let Some(message) = self.config.startup_message.as_deref() else {
            return;
        };
        match self.notifier.send(message).await {
            Ok(()) => info!("Startup notification sent"),
            Err(e) => warn!(error = %e, "Failed to send startup notification"),
        }
    }

    /// Announce, then poll forever.
    pub async fn run(mut self) {
        info!(
            url = self.source.url(),
            strategy = self.policy.strategy().name(),
            interval_secs = self.config.interval.as_secs(),
            "Starting price monitor"
        );
        self.announce_startup().await;

        loop {
            match self.run_one_cycle().await {
                CycleReport::Alerted {
                    observations,
                    delivered,
                } => info!(observations, delivered, "Cycle complete: alert"),
                CycleReport::Quiet { observations } => {
                    info!(observations, "Cycle complete: no change")
                }
                CycleReport::Failed { .. } => {}
            }
            tokio::time::sleep(self.config.interval).await;
        }
    }
}
