//! Risk management errors.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::shared::{StrategyId, Symbol};

/// The rule a [`RiskViolation`] broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationKind {
    /// Single order larger than `max_order_size`.
    OrderSize,
    /// Resulting position larger than `max_position_size`.
    PositionSize,
    /// Strategy notional exposure above `max_exposure`.
    Exposure,
    /// Too many orders in the rate window.
    OrderRate,
    /// Market closed for the symbol.
    MarketClosed,
    /// Unrealized loss above `max_daily_loss`.
    DailyLoss,
    /// Margin below maintenance margin.
    Margin,
    /// Drawdown above `max_drawdown_percent`.
    Drawdown,
}

impl ViolationKind {
    /// Stable machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::OrderSize => "MAX_ORDER_SIZE_EXCEEDED",
            Self::PositionSize => "MAX_POSITION_SIZE_EXCEEDED",
            Self::Exposure => "MAX_EXPOSURE_EXCEEDED",
            Self::OrderRate => "ORDER_RATE_EXCEEDED",
            Self::MarketClosed => "MARKET_CLOSED",
            Self::DailyLoss => "MAX_DAILY_LOSS_EXCEEDED",
            Self::Margin => "INSUFFICIENT_MARGIN",
            Self::Drawdown => "MAX_DRAWDOWN_EXCEEDED",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A failed risk rule, with the observed value and the limit it crossed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskViolation {
    /// Rule that failed.
    pub kind: ViolationKind,
    /// Human-readable message.
    pub message: String,
    /// Strategy being checked.
    pub strategy_id: StrategyId,
    /// Symbol, for order and position checks.
    pub symbol: Option<Symbol>,
    /// Value that violated the limit.
    pub observed: Option<Decimal>,
    /// Configured limit.
    pub limit: Option<Decimal>,
}

impl RiskViolation {
    /// Create a new violation.
    #[must_use]
    pub fn new(kind: ViolationKind, strategy_id: StrategyId, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            strategy_id,
            symbol: None,
            observed: None,
            limit: None,
        }
    }

    /// Add symbol context.
    #[must_use]
    pub fn with_symbol(mut self, symbol: Symbol) -> Self {
        self.symbol = Some(symbol);
        self
    }

    /// Add the observed value and the limit.
    #[must_use]
    pub const fn with_values(mut self, observed: Decimal, limit: Decimal) -> Self {
        self.observed = Some(observed);
        self.limit = Some(limit);
        self
    }
}

impl fmt::Display for RiskViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

impl std::error::Error for RiskViolation {}

/// A risk data source failed to answer.
///
/// Never surfaced to callers of the checker: lookups that fail fall back to
/// default limits or let the check pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RiskDataError {
    /// Nothing is stored for the key.
    NotFound {
        /// What was looked up.
        what: String,
    },
    /// The source is unreachable or failed.
    Unavailable {
        /// Source name.
        source: &'static str,
        /// Error message.
        message: String,
    },
}

impl RiskDataError {
    /// Shorthand for [`RiskDataError::Unavailable`].
    pub fn unavailable(source: &'static str, message: impl Into<String>) -> Self {
        Self::Unavailable {
            source,
            message: message.into(),
        }
    }
}

impl fmt::Display for RiskDataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { what } => write!(f, "not found: {what}"),
            Self::Unavailable { source, message } => {
                write!(f, "{source} unavailable: {message}")
            }
        }
    }
}

impl std::error::Error for RiskDataError {}
