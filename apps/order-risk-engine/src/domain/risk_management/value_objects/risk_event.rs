//! Risk events raised by failed checks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::domain::shared::{RiskEventId, StrategyId, Symbol};

/// Which check raised the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskEventType {
    /// Pre-trade order validation.
    OrderValidation,
    /// Position validation.
    PositionValidation,
    /// Strategy exposure limit.
    ExposureLimit,
    /// Strategy drawdown limit.
    DrawdownLimit,
}

impl fmt::Display for RiskEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OrderValidation => write!(f, "order_validation"),
            Self::PositionValidation => write!(f, "position_validation"),
            Self::ExposureLimit => write!(f, "exposure_limit"),
            Self::DrawdownLimit => write!(f, "drawdown_limit"),
        }
    }
}

/// Event severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskSeverity {
    /// Logged and counted.
    Medium,
    /// Also forwarded on the violation channel.
    High,
    /// Also forwarded on the violation channel.
    Critical,
}

impl RiskSeverity {
    /// True for severities forwarded to the escalation channel.
    #[must_use]
    pub const fn escalates(&self) -> bool {
        matches!(self, Self::High | Self::Critical)
    }

    /// Contribution to the running risk score (0-100 scale).
    #[must_use]
    pub const fn score_weight(&self) -> f64 {
        match self {
            Self::Medium => 25.0,
            Self::High => 50.0,
            Self::Critical => 100.0,
        }
    }
}

impl fmt::Display for RiskSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// Follow-up the event processor performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskAction {
    /// The order was refused.
    BlockOrder,
    /// Exposure should be reduced.
    ReduceExposure,
    /// The strategy should be halted.
    StopStrategy,
    /// Keep watching the position.
    MonitorPosition,
}

impl fmt::Display for RiskAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BlockOrder => write!(f, "block_order"),
            Self::ReduceExposure => write!(f, "reduce_exposure"),
            Self::StopStrategy => write!(f, "stop_strategy"),
            Self::MonitorPosition => write!(f, "monitor_position"),
        }
    }
}

/// A recorded risk violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskEvent {
    /// Event id.
    pub id: RiskEventId,
    /// Check that raised it.
    pub event_type: RiskEventType,
    /// Severity.
    pub severity: RiskSeverity,
    /// Strategy concerned.
    pub strategy_id: StrategyId,
    /// Symbol, for order and position checks.
    pub symbol: Option<Symbol>,
    /// Human-readable description.
    pub description: String,
    /// Free-form context.
    pub data: Map<String, Value>,
    /// Follow-up action.
    pub action: RiskAction,
    /// Acknowledged by an operator or collaborator.
    pub resolved: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl RiskEvent {
    /// Create an unresolved event with a fresh id.
    #[must_use]
    pub fn new(
        event_type: RiskEventType,
        severity: RiskSeverity,
        strategy_id: StrategyId,
        description: impl Into<String>,
        action: RiskAction,
    ) -> Self {
        Self {
            id: RiskEventId::generate(),
            event_type,
            severity,
            strategy_id,
            symbol: None,
            description: description.into(),
            data: Map::new(),
            action,
            resolved: false,
            created_at: Utc::now(),
        }
    }

    /// Add symbol context.
    #[must_use]
    pub fn with_symbol(mut self, symbol: Option<Symbol>) -> Self {
        self.symbol = symbol;
        self
    }

    /// Add one context entry.
    #[must_use]
    pub fn with_data(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_ordering_and_escalation() {
        assert!(RiskSeverity::Medium < RiskSeverity::High);
        assert!(RiskSeverity::High < RiskSeverity::Critical);
        assert!(!RiskSeverity::Medium.escalates());
        assert!(RiskSeverity::High.escalates());
        assert!(RiskSeverity::Critical.escalates());
    }

    #[test]
    fn serializes_with_snake_case_tags() {
        let event = RiskEvent::new(
            RiskEventType::ExposureLimit,
            RiskSeverity::High,
            StrategyId::new("s1"),
            "exposure 51000 exceeds 50000",
            RiskAction::BlockOrder,
        )
        .with_symbol(Some(Symbol::new("ETHUSDT")))
        .with_data("order_value", "2000");

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event_type"], "exposure_limit");
        assert_eq!(json["severity"], "high");
        assert_eq!(json["action"], "block_order");
        assert_eq!(json["symbol"], "ETHUSDT");
        assert_eq!(json["data"]["order_value"], "2000");
        assert_eq!(json["resolved"], false);
    }

    #[test]
    fn display_matches_serialized_names() {
        assert_eq!(RiskEventType::DrawdownLimit.to_string(), "drawdown_limit");
        assert_eq!(RiskAction::StopStrategy.to_string(), "stop_strategy");
        assert_eq!(RiskSeverity::Critical.to_string(), "critical");
    }
}
