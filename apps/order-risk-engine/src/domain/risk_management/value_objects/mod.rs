//! Risk Management Value Objects

mod position;
mod risk_event;
mod risk_limits;

pub use position::{Position, PositionSide};
pub use risk_event::{RiskAction, RiskEvent, RiskEventType, RiskSeverity};
pub use risk_limits::RiskLimits;
