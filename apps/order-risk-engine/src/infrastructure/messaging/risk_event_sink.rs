//! Risk event sinks.

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::application::ports::{RiskEventSink, RiskEventSinkError};
use crate::domain::risk_management::{RiskEvent, RiskSeverity};

/// Writes each event as one structured JSON log line.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingRiskEventSink;

#[async_trait]
impl RiskEventSink for LoggingRiskEventSink {
    async fn persist(&self, event: &RiskEvent) -> Result<(), RiskEventSinkError> {
        let payload =
            serde_json::to_string(event).map_err(|e| RiskEventSinkError::PersistFailed {
                message: e.to_string(),
            })?;

        match event.severity {
            RiskSeverity::Critical => {
                tracing::error!(target: "risk_events", event = %payload, "Risk event");
            }
            RiskSeverity::High => {
                tracing::warn!(target: "risk_events", event = %payload, "Risk event");
            }
            RiskSeverity::Medium => {
                tracing::info!(target: "risk_events", event = %payload, "Risk event");
            }
        }
        Ok(())
    }
}

/// Keeps persisted events in memory.
///
/// Suitable for testing and development. Not for production use.
#[derive(Debug, Default)]
pub struct InMemoryRiskEventSink {
    events: RwLock<Vec<RiskEvent>>,
}

impl InMemoryRiskEventSink {
    /// Create a new empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Events persisted so far, in arrival order.
    #[must_use]
    pub fn events(&self) -> Vec<RiskEvent> {
        self.events.read().clone()
    }

    /// Number of persisted events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// True if nothing was persisted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }
}

#[async_trait]
impl RiskEventSink for InMemoryRiskEventSink {
    async fn persist(&self, event: &RiskEvent) -> Result<(), RiskEventSinkError> {
        self.events.write().push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::risk_management::{RiskAction, RiskEventType};
    use crate::domain::shared::StrategyId;

    fn event(severity: RiskSeverity) -> RiskEvent {
        RiskEvent::new(
            RiskEventType::ExposureLimit,
            severity,
            StrategyId::new("s1"),
            "exposure 51000 exceeds maximum 50000",
            RiskAction::ReduceExposure,
        )
        .with_data("observed", "51000")
    }

    #[test]
    fn logging_sink_accepts_all_severities() {
        let sink = LoggingRiskEventSink;
        for severity in [RiskSeverity::Medium, RiskSeverity::High, RiskSeverity::Critical] {
            tokio_test::assert_ok!(tokio_test::block_on(sink.persist(&event(severity))));
        }
    }

    #[tokio::test]
    async fn in_memory_sink_keeps_order() {
        let sink = InMemoryRiskEventSink::new();
        assert!(sink.is_empty());

        let first = event(RiskSeverity::High);
        let second = event(RiskSeverity::Critical);
        sink.persist(&first).await.unwrap();
        sink.persist(&second).await.unwrap();

        let events = sink.events();
        assert_eq!(sink.len(), 2);
        assert_eq!(events[0].id, first.id);
        assert_eq!(events[1].id, second.id);
    }
}
