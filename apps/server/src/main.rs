//! Price Watch - headless server
//!
//! Polls a retailer listing page, alerts on price events over Telegram and
//! exposes a small HTTP status surface.

mod config;
mod status_server;

use clap::Parser;
use config::AppConfig;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use pricewatch_alerts::TelegramNotifier;
use pricewatch_engine::{
    AlertPolicy, CycleReport, MonitorConfig, PriceMonitor, StatusHandle, StrategyKind,
};
use pricewatch_feeds::{HttpPageSource, PriceExtractor};

/// Price Watch CLI
#[derive(Parser, Debug)]
#[command(name = "price-watch")]
#[command(about = "Retail price monitor with Telegram alerts", long_about = None)]
struct Args {
    /// Log level: trace, debug, info, warn, error
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Alert strategy: threshold, change, drop (overrides ALERT_STRATEGY)
    #[arg(short, long)]
    strategy: Option<StrategyKind>,

    /// Run a single cycle and exit
    #[arg(long, default_value_t = false)]
    once: bool,

    /// Skip the startup notification
    #[arg(long, default_value_t = false)]
    no_startup_message: bool,
}

fn init_logging(level: &str) {
    let level = match level {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

fn startup_message(config: &AppConfig, strategy: &str) -> String {
    let hostname = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    format!(
        "🚀 Price watch started on {}\n\nURL: {}\nStrategy: {}\nInterval: {}s",
        hostname,
        config.target_url,
        strategy,
        config.poll_interval.as_secs()
    )
}

fn build_monitor(
    config: &AppConfig,
    status: StatusHandle,
    startup: bool,
) -> Result<PriceMonitor, Box<dyn std::error::Error>> {
    let strategy = config.alert_strategy();
    let source = HttpPageSource::new(config.target_url.clone())?;
    let extractor = PriceExtractor::new(config.extractor_config())?;
    let policy = AlertPolicy::new(strategy, config.target_url.as_str())
        .with_currency(config.currency_marker.clone());
    let notifier = TelegramNotifier::new(config.telegram_config())?;

    let monitor_config = MonitorConfig {
        interval: config.poll_interval,
        startup_message: startup.then(|| startup_message(config, strategy.name())),
        ..Default::default()
    };

    Ok(PriceMonitor::new(
        Arc::new(source),
        extractor,
        policy,
        Arc::new(notifier),
        status,
        monitor_config,
    ))
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    init_logging(&args.log_level);

    let mut config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::from(2);
        }
    };
    if let Some(strategy) = args.strategy {
        config.strategy = strategy;
    }

    info!("🚀 Price Watch starting...");
    info!("  URL: {}", config.target_url);
    info!("  Strategy: {}", config.alert_strategy().name());
    info!("  Interval: {}s", config.poll_interval.as_secs());
    info!("  Status Port: {}", config.listen_port);

    let status = StatusHandle::new();
    let startup = !args.no_startup_message && !args.once;
    let mut monitor = match build_monitor(&config, status.clone(), startup) {
        Ok(monitor) => monitor,
        Err(e) => {
            error!("Startup failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if args.once {
        return match monitor.run_one_cycle().await {
            CycleReport::Failed { error } => {
                error!("Price check failed: {}", error);
                ExitCode::FAILURE
            }
            report => {
                info!("Single cycle complete: {:?}", report);
                ExitCode::SUCCESS
            }
        };
    }

    let server_handle = match status_server::start_status_server(status, config.listen_port).await
    {
        Ok(handle) => handle,
        Err(e) => {
            error!("Failed to start status server: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let monitor_handle = tokio::spawn(monitor.run());

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Shutdown signal received");
        }
        result = monitor_handle => {
            if let Err(e) = result {
                error!("Monitor task terminated: {}", e);
            }
        }
    }

    server_handle.abort();
    info!("👋 Price Watch stopped");
    ExitCode::SUCCESS
}
