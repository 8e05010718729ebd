//! Observability module for metrics and logging.
//!
//! This module provides instrumentation for the risk engine,
//! including Prometheus metrics export and console tracing.

mod metrics;
mod tracing;

pub use self::metrics::{
    MetricsConfig, MetricsError, init_metrics, record_order_rejection, record_order_submission,
    record_risk_check, record_risk_event_dropped, record_risk_event_evicted, record_risk_violation,
    update_risk_score, update_tracked_events,
};
pub use self::tracing::{LogFormat, TracingConfig, TracingError, build_filter, init_tracing};
