//! Risk DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::risk_management::{RiskEvent, RiskViolation};

/// DTO for a risk violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationDto {
    /// Machine-readable code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Strategy ID.
    pub strategy_id: String,
    /// Symbol, for order and position checks.
    pub symbol: Option<String>,
    /// Observed value.
    pub observed: Option<String>,
    /// Configured limit.
    pub limit: Option<String>,
}

impl From<&RiskViolation> for ViolationDto {
    fn from(violation: &RiskViolation) -> Self {
        Self {
            code: violation.kind.code().to_string(),
            message: violation.message.clone(),
            strategy_id: violation.strategy_id.to_string(),
            symbol: violation.symbol.as_ref().map(|s| s.to_string()),
            observed: violation.observed.map(|v| v.normalize().to_string()),
            limit: violation.limit.map(|v| v.normalize().to_string()),
        }
    }
}

/// DTO for a risk event handed to alerting consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskEventDto {
    /// Event ID.
    pub event_id: String,
    /// `order_validation`, `position_validation`, `exposure_limit` or `drawdown_limit`.
    pub event_type: String,
    /// `medium`, `high` or `critical`.
    pub severity: String,
    /// Follow-up action.
    pub action: String,
    /// Strategy ID.
    pub strategy_id: String,
    /// Symbol.
    pub symbol: Option<String>,
    /// Description.
    pub description: String,
    /// Context.
    pub data: serde_json::Map<String, serde_json::Value>,
    /// Acknowledged.
    pub resolved: bool,
    /// Created at.
    pub created_at: DateTime<Utc>,
}

impl RiskEventDto {
    /// Create from a domain event.
    #[must_use]
    pub fn from_event(event: &RiskEvent) -> Self {
        Self {
            event_id: event.id.to_string(),
            event_type: event.event_type.to_string(),
            severity: event.severity.to_string(),
            action: event.action.to_string(),
            strategy_id: event.strategy_id.to_string(),
            symbol: event.symbol.as_ref().map(|s| s.to_string()),
            description: event.description.clone(),
            data: event.data.clone(),
            resolved: event.resolved,
            created_at: event.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::risk_management::{RiskAction, RiskEventType, RiskSeverity, ViolationKind};
    use crate::domain::shared::{StrategyId, Symbol};
    use rust_decimal_macros::dec;

    #[test]
    fn violation_dto_uses_code_and_plain_decimals() {
        let violation = RiskViolation::new(
            ViolationKind::Exposure,
            StrategyId::new("s1"),
            "exposure 51000 exceeds maximum 50000",
        )
        .with_symbol(Symbol::new("ETHUSDT"))
        .with_values(dec!(51000.00), dec!(50000));

        let dto = ViolationDto::from(&violation);

        assert_eq!(dto.code, "MAX_EXPOSURE_EXCEEDED");
        assert_eq!(dto.symbol.as_deref(), Some("ETHUSDT"));
        assert_eq!(dto.observed.as_deref(), Some("51000"));
        assert_eq!(dto.limit.as_deref(), Some("50000"));
    }

    #[test]
    fn event_dto_uses_snake_case_names() {
        let event = RiskEvent::new(
            RiskEventType::DrawdownLimit,
            RiskSeverity::Critical,
            StrategyId::new("s1"),
            "drawdown 12% exceeds maximum 10%",
            RiskAction::StopStrategy,
        )
        .with_data("observed", "12");

        let dto = RiskEventDto::from_event(&event);

        assert_eq!(dto.event_id, event.id.to_string());
        assert_eq!(dto.event_type, "drawdown_limit");
        assert_eq!(dto.severity, "critical");
        assert_eq!(dto.action, "stop_strategy");
        assert_eq!(dto.data["observed"], "12");
        assert!(!dto.resolved);
    }
}
