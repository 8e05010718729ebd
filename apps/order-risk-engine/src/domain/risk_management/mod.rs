//! Risk Management Bounded Context
//!
//! Validates orders, positions and strategy-level aggregates against risk
//! limits before anything reaches an exchange.
//!
//! # Key Concepts
//!
//! - **Risk Limits**: Per-strategy thresholds with an explicit default set
//! - **Risk Checker**: Stateless, synchronous rule evaluation
//! - **Providers**: Narrow ports to limits, exposure, drawdown, positions and order rates
//! - **Risk Events**: Records of violations with a severity and a follow-up action

pub mod errors;
pub mod providers;
pub mod services;
pub mod value_objects;

pub use errors::{RiskDataError, RiskViolation, ViolationKind};
pub use providers::{
    AlwaysOpen, DrawdownCalculator, ExposureCalculator, MarketHours, OrderRateTracker,
    PositionLookup, RiskDataSources, RiskLimitsStore, StrategyDirectory,
};
pub use services::RiskChecker;
pub use value_objects::{
    Position, PositionSide, RiskAction, RiskEvent, RiskEventType, RiskLimits, RiskSeverity,
};
