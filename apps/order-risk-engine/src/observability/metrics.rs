//! Prometheus metrics for the risk engine.
//!
//! Risk checks, violations, dropped events and order submissions are
//! recorded through the `metrics` facade. Without an installed recorder the
//! calls are no-ops, so the core never depends on the exporter.
//!
//! # Example
//!
//! ```ignore
//! use order_risk_engine::observability::{init_metrics, MetricsConfig};
//!
//! let config = MetricsConfig::default();
//! init_metrics(&config)?;
//!
//! record_risk_check("order", "passed", 0.000_015);
//! ```

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Configuration for the metrics exporter.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Address to bind the metrics HTTP listener.
    pub listen_addr: SocketAddr,
    /// Histogram buckets for latency measurements (in seconds).
    pub latency_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 9090)),
            // 1us to 100ms, pre-trade checks live at the low end
            latency_buckets: vec![
                0.000_001, 0.000_005, 0.000_01, 0.000_05, 0.000_1, 0.000_5, 0.001, 0.005, 0.01,
                0.1,
            ],
        }
    }
}

impl MetricsConfig {
    /// Create a new metrics configuration with custom address.
    #[must_use]
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            listen_addr: addr,
            ..Default::default()
        }
    }
}

/// Initialize the Prometheus metrics exporter.
///
/// This starts an HTTP server that exposes metrics at `/metrics`.
///
/// # Errors
///
/// Returns an error if the metrics exporter fails to start (e.g., port already in use).
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    PrometheusBuilder::new()
        .with_http_listener(config.listen_addr)
        .set_buckets(&config.latency_buckets)
        .map_err(|e| MetricsError::Configuration(e.to_string()))?
        .install()
        .map_err(|e| MetricsError::Installation(e.to_string()))?;

    tracing::info!(
        addr = %config.listen_addr,
        "Prometheus metrics exporter started"
    );

    Ok(())
}

/// Error type for metrics operations.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Failed to configure metrics exporter.
    #[error("metrics configuration error: {0}")]
    Configuration(String),
    /// Failed to install metrics exporter.
    #[error("metrics installation error: {0}")]
    Installation(String),
}

// ============================================================================
// Risk Metrics
// ============================================================================

/// Record one risk check.
///
/// # Arguments
///
/// * `check` - Check name (`"order"`, `"position"`, `"exposure"`, `"drawdown"`)
/// * `outcome` - `"passed"` or `"violated"`
/// * `latency_seconds` - Time spent in the checker
pub fn record_risk_check(check: &'static str, outcome: &'static str, latency_seconds: f64) {
    counter!(
        "risk_checks_total",
        "check" => check,
        "outcome" => outcome
    )
    .increment(1);

    histogram!("risk_check_latency_seconds", "check" => check).record(latency_seconds);
}

/// Record a risk violation by event type and severity.
pub fn record_risk_violation(event_type: &str, severity: &str) {
    counter!(
        "risk_violations_total",
        "event_type" => event_type.to_string(),
        "severity" => severity.to_string()
    )
    .increment(1);
}

/// Record a risk event that could not be queued.
///
/// # Arguments
///
/// * `channel` - `"events"` for the main stream, `"violations"` for escalations
pub fn record_risk_event_dropped(channel: &'static str) {
    counter!("risk_events_dropped_total", "channel" => channel).increment(1);
}

/// Record a risk event evicted from memory by the retention cap.
pub fn record_risk_event_evicted() {
    counter!("risk_events_evicted_total").increment(1);
}

/// Update the unresolved risk events gauge.
pub fn update_tracked_events(count: usize) {
    gauge!("risk_tracked_events").set(count as f64);
}

/// Update the running risk score gauge.
pub fn update_risk_score(score: f64) {
    gauge!("risk_score").set(score);
}

// ============================================================================
// Order Metrics
// ============================================================================

/// Record an order submission.
///
/// # Arguments
///
/// * `exchange` - Exchange name
/// * `status` - Submission status (e.g., "submitted", "rejected", "error")
/// * `order_type` - Order type (e.g., "market", "limit", "stop")
/// * `latency_seconds` - Time from submit to ACK in seconds
pub fn record_order_submission(
    exchange: &str,
    status: &'static str,
    order_type: &str,
    latency_seconds: f64,
) {
    counter!(
        "order_submissions_total",
        "exchange" => exchange.to_string(),
        "status" => status,
        "order_type" => order_type.to_string()
    )
    .increment(1);

    histogram!(
        "order_latency_seconds",
        "exchange" => exchange.to_string(),
        "order_type" => order_type.to_string()
    )
    .record(latency_seconds);
}

/// Record an order rejection.
///
/// # Arguments
///
/// * `exchange` - Exchange name
/// * `reason` - Rejection reason (e.g., `"risk_blocked"`, `"execution_failed"`)
pub fn record_order_rejection(exchange: &str, reason: &'static str) {
    counter!(
        "order_rejection_total",
        "exchange" => exchange.to_string(),
        "reason" => reason
    )
    .increment(1);
}
