//! Risk Data Providers
//!
//! Narrow, synchronous ports the risk checker reads from. They sit on the
//! pre-trade path, so implementations are expected to answer from memory.
//! Adapters live in `infrastructure`.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::errors::RiskDataError;
use super::value_objects::{Position, RiskLimits};
use crate::domain::shared::{StrategyId, Symbol};

/// Source of per-strategy limits.
#[cfg_attr(test, mockall::automock)]
pub trait RiskLimitsStore: Send + Sync {
    /// Limits for a strategy; `NotFound` when none are configured.
    fn limits(&self, strategy_id: &StrategyId) -> Result<RiskLimits, RiskDataError>;
}

/// Current notional exposure of a strategy.
#[cfg_attr(test, mockall::automock)]
pub trait ExposureCalculator: Send + Sync {
    /// Sum of absolute position notionals, in the quote currency.
    fn current_exposure(&self, strategy_id: &StrategyId) -> Result<Decimal, RiskDataError>;
}

/// Current drawdown of a strategy.
#[cfg_attr(test, mockall::automock)]
pub trait DrawdownCalculator: Send + Sync {
    /// Drawdown from the equity peak, in percent.
    fn current_drawdown_percent(&self, strategy_id: &StrategyId)
    -> Result<Decimal, RiskDataError>;
}

/// Open positions by strategy and symbol.
#[cfg_attr(test, mockall::automock)]
pub trait PositionLookup: Send + Sync {
    /// The open position, if any.
    fn position(
        &self,
        strategy_id: &StrategyId,
        symbol: &Symbol,
    ) -> Result<Option<Position>, RiskDataError>;
}

/// Sliding-window counter of order submissions.
#[cfg_attr(test, mockall::automock)]
pub trait OrderRateTracker: Send + Sync {
    /// Orders submitted by the strategy within the trailing `window`.
    fn orders_in_window(
        &self,
        strategy_id: &StrategyId,
        window: Duration,
    ) -> Result<u32, RiskDataError>;

    /// Record one submission at the current time.
    fn record_submission(&self, strategy_id: &StrategyId);
}

/// Trading-session calendar.
pub trait MarketHours: Send + Sync {
    /// True if `symbol` can trade at `at`.
    fn is_open(&self, symbol: &Symbol, at: DateTime<Utc>) -> bool;
}

/// Calendar for 24/7 venues.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysOpen;

impl MarketHours for AlwaysOpen {
    fn is_open(&self, _symbol: &Symbol, _at: DateTime<Utc>) -> bool {
        true
    }
}

/// Registry of strategies and their run state.
#[cfg_attr(test, mockall::automock)]
pub trait StrategyDirectory: Send + Sync {
    /// True if the strategy is currently running.
    fn is_running(&self, strategy_id: &StrategyId) -> Result<bool, RiskDataError>;

    /// Strategies that should be monitored.
    fn active_strategies(&self) -> Result<Vec<StrategyId>, RiskDataError>;
}

/// The data sources a [`RiskChecker`](super::RiskChecker) reads from.
#[derive(Clone)]
pub struct RiskDataSources {
    /// Limits store.
    pub limits: Arc<dyn RiskLimitsStore>,
    /// Exposure calculator.
    pub exposure: Arc<dyn ExposureCalculator>,
    /// Drawdown calculator.
    pub drawdown: Arc<dyn DrawdownCalculator>,
    /// Position lookup.
    pub positions: Arc<dyn PositionLookup>,
    /// Order-rate tracker.
    pub order_rate: Arc<dyn OrderRateTracker>,
    /// Market calendar.
    pub market_hours: Arc<dyn MarketHours>,
}

impl RiskDataSources {
    /// Use one adapter for every source, with an always-open calendar.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: RiskLimitsStore
            + ExposureCalculator
            + DrawdownCalculator
            + PositionLookup
            + OrderRateTracker
            + 'static,
    {
        Self {
            limits: store.clone(),
            exposure: store.clone(),
            drawdown: store.clone(),
            positions: store.clone(),
            order_rate: store,
            market_hours: Arc::new(AlwaysOpen),
        }
    }

    /// Replace the market calendar.
    #[must_use]
    pub fn with_market_hours(mut self, market_hours: Arc<dyn MarketHours>) -> Self {
        self.market_hours = market_hours;
        self
    }
}

impl std::fmt::Debug for RiskDataSources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RiskDataSources").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn always_open_is_open() {
        assert!(AlwaysOpen.is_open(&Symbol::new("BTCUSDT"), Utc::now()));
    }

    #[test]
    fn mocked_directory_answers() {
        let mut directory = MockStrategyDirectory::new();
        directory
            .expect_is_running()
            .returning(|id| Ok(id.as_str() == "live"));

        assert!(directory.is_running(&StrategyId::new("live")).unwrap());
        assert!(!directory.is_running(&StrategyId::new("paused")).unwrap());
    }
}
