//! Risk Event Sink Port (Driven Port)
//!
//! Where the risk service hands processed risk events (storage, alerting).

use async_trait::async_trait;

use crate::domain::risk_management::value_objects::RiskEvent;

/// Risk event sink error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RiskEventSinkError {
    /// Connection error.
    #[error("Risk event sink connection error: {message}")]
    ConnectionError {
        /// Error message.
        message: String,
    },

    /// Persisting failed.
    #[error("Risk event persist failed: {message}")]
    PersistFailed {
        /// Error message.
        message: String,
    },
}

/// Port for persisting risk events.
///
/// Called from the event-processing loop, never under the risk service lock.
#[async_trait]
pub trait RiskEventSink: Send + Sync {
    /// Persist one event.
    async fn persist(&self, event: &RiskEvent) -> Result<(), RiskEventSinkError>;
}

/// No-op sink for testing.
#[derive(Debug, Clone, Default)]
pub struct NoOpRiskEventSink;

#[async_trait]
impl RiskEventSink for NoOpRiskEventSink {
    async fn persist(&self, _event: &RiskEvent) -> Result<(), RiskEventSinkError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::risk_management::value_objects::{
        RiskAction, RiskEventType, RiskSeverity,
    };
    use crate::domain::shared::StrategyId;

    #[tokio::test]
    async fn no_op_sink_succeeds() {
        let event = RiskEvent::new(
            RiskEventType::DrawdownLimit,
            RiskSeverity::Critical,
            StrategyId::new("s1"),
            "drawdown 12% exceeds maximum 10%",
            RiskAction::StopStrategy,
        );

        assert!(NoOpRiskEventSink.persist(&event).await.is_ok());
    }
}
