//! Order Risk Engine Binary
//!
//! Starts the risk service with in-memory data sources and a logging event
//! sink, then runs until SIGINT/SIGTERM.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin order-risk-engine
//! ```
//!
//! # Environment Variables
//!
//! - `ORDER_RISK_ENGINE_CONFIG`: Path to the YAML config (default: built-in defaults)
//! - `RUST_LOG`: Log filter, overrides the configured directive

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use order_risk_engine::application::dto::RiskEventDto;
use order_risk_engine::application::services::RiskService;
use order_risk_engine::config::{self, Config};
use order_risk_engine::domain::risk_management::{
    RiskChecker, RiskDataSources, RiskEvent, StrategyDirectory,
};
use order_risk_engine::domain::shared::StrategyId;
use order_risk_engine::infrastructure::messaging::LoggingRiskEventSink;
use order_risk_engine::infrastructure::persistence::InMemoryRiskStore;
use order_risk_engine::observability;
use tokio::signal;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Graceful shutdown timeout.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Environment variable naming the config file.
const CONFIG_PATH_ENV: &str = "ORDER_RISK_ENGINE_CONFIG";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    let config = load_configuration()?;
    observability::init_tracing(&config.observability.logging)
        .context("failed to initialize tracing")?;

    tracing::info!(
        event_buffer = config.risk.event_buffer,
        violation_buffer = config.risk.violation_buffer,
        exposure_check_interval_ms = config.risk.exposure_check_interval_ms,
        drawdown_check_interval_ms = config.risk.drawdown_check_interval_ms,
        "Starting Order Risk Engine"
    );

    if config.observability.metrics.enabled {
        let metrics = config.observability.metrics.exporter_config();
        observability::init_metrics(&metrics).context("failed to install metrics exporter")?;
        tracing::info!(addr = %metrics.listen_addr, "Metrics exporter listening");
    }

    let store = Arc::new(InMemoryRiskStore::new());
    for strategy in &config.strategies {
        store.set_strategy_running(StrategyId::new(strategy.as_str()), true);
    }

    let checker = RiskChecker::new(
        RiskDataSources::from_store(store.clone()),
        config.limits.clone(),
    )
    .with_rate_window(config.checker.rate_window());
    let directory: Arc<dyn StrategyDirectory> = store;
    let risk_service = RiskService::with_config(
        config.risk.clone(),
        checker,
        Arc::new(LoggingRiskEventSink),
        Some(directory),
    );

    let shutdown_token = CancellationToken::new();
    risk_service
        .start(&shutdown_token)
        .context("failed to start risk service")?;

    let escalations = risk_service
        .take_violation_receiver()
        .map(|rx| spawn_escalation_logger(rx, shutdown_token.clone()));

    tracing::info!(
        strategies = config.strategies.len(),
        "Order Risk Engine running"
    );

    shutdown_signal().await;
    shutdown_token.cancel();

    if tokio::time::timeout(SHUTDOWN_TIMEOUT, risk_service.stop())
        .await
        .is_err()
    {
        tracing::warn!(
            timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
            "Risk service did not stop in time"
        );
    }
    if let Some(handle) = escalations {
        if let Err(e) = handle.await {
            tracing::warn!(error = %e, "Escalation logger ended abnormally");
        }
    }

    let metrics = risk_service.metrics();
    tracing::info!(
        total_checks = metrics.total_checks,
        violations = metrics.violations,
        blocked_orders = metrics.blocked_orders,
        dropped_events = metrics.dropped_events,
        "Order Risk Engine stopped"
    );

    Ok(())
}

/// Load the config file named by `ORDER_RISK_ENGINE_CONFIG`, or the defaults.
fn load_configuration() -> anyhow::Result<Config> {
    match std::env::var(CONFIG_PATH_ENV) {
        Ok(path) if !path.trim().is_empty() => config::load_config(Some(path.trim()))
            .with_context(|| format!("failed to load config from {path}")),
        _ => Ok(Config::default()),
    }
}

/// Log high and critical events for operators until shutdown.
fn spawn_escalation_logger(
    mut rx: mpsc::Receiver<RiskEvent>,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                event = rx.recv() => {
                    let Some(event) = event else { break };
                    let dto = RiskEventDto::from_event(&event);
                    match serde_json::to_string(&dto) {
                        Ok(json) => tracing::warn!(target: "risk_alerts", event = %json, "Risk escalation"),
                        Err(e) => tracing::warn!(
                            target: "risk_alerts",
                            event_id = %dto.event_id,
                            error = %e,
                            "Risk escalation (unserializable)"
                        ),
                    }
                }
                () = shutdown.cancelled() => {
                    tracing::info!("Escalation logger shutting down");
                    break;
                }
            }
        }
    })
}

/// Load `.env` from the working directory or the nearest ancestor.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
///
/// # Panics
///
/// Panics if signal handlers cannot be installed.
#[allow(clippy::expect_used)]
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }
}
