//! In-memory risk data store.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use rust_decimal::Decimal;

use crate::domain::risk_management::{
    DrawdownCalculator, ExposureCalculator, OrderRateTracker, Position, PositionLookup,
    RiskDataError, RiskLimits, RiskLimitsStore, StrategyDirectory,
};
use crate::domain::shared::{StrategyId, Symbol};

/// Submissions older than this are discarded.
const SUBMISSION_RETENTION: Duration = Duration::from_secs(60);

/// In-memory implementation of every risk data port.
///
/// Exposure is the sum of position notionals at the mark price unless an
/// explicit value was set with [`set_exposure`](Self::set_exposure).
///
/// Suitable for testing and development. Not for production use.
#[derive(Debug, Default)]
pub struct InMemoryRiskStore {
    limits: RwLock<HashMap<StrategyId, RiskLimits>>,
    positions: RwLock<HashMap<(StrategyId, Symbol), Position>>,
    exposure: RwLock<HashMap<StrategyId, Decimal>>,
    drawdown: RwLock<HashMap<StrategyId, Decimal>>,
    submissions: RwLock<HashMap<StrategyId, VecDeque<Instant>>>,
    strategies: RwLock<HashMap<StrategyId, bool>>,
}

impl InMemoryRiskStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure limits for a strategy.
    pub fn set_limits(&self, strategy_id: StrategyId, limits: RiskLimits) {
        self.limits.write().insert(strategy_id, limits);
    }

    /// Store or replace a position.
    pub fn set_position(&self, position: Position) {
        let key = (position.strategy_id.clone(), position.symbol.clone());
        self.positions.write().insert(key, position);
    }

    /// Remove a position.
    pub fn remove_position(&self, strategy_id: &StrategyId, symbol: &Symbol) -> Option<Position> {
        self.positions
            .write()
            .remove(&(strategy_id.clone(), symbol.clone()))
    }

    /// Pin the exposure of a strategy.
    pub fn set_exposure(&self, strategy_id: StrategyId, exposure: Decimal) {
        self.exposure.write().insert(strategy_id, exposure);
    }

    /// Set the drawdown percent of a strategy.
    pub fn set_drawdown(&self, strategy_id: StrategyId, drawdown_percent: Decimal) {
        self.drawdown.write().insert(strategy_id, drawdown_percent);
    }

    /// Register a strategy and its run state.
    pub fn set_strategy_running(&self, strategy_id: StrategyId, running: bool) {
        self.strategies.write().insert(strategy_id, running);
    }
}

impl RiskLimitsStore for InMemoryRiskStore {
    fn limits(&self, strategy_id: &StrategyId) -> Result<RiskLimits, RiskDataError> {
        self.limits
            .read()
            .get(strategy_id)
            .cloned()
            .ok_or_else(|| RiskDataError::NotFound {
                what: format!("risk limits for strategy {strategy_id}"),
            })
    }
}

impl ExposureCalculator for InMemoryRiskStore {
    fn current_exposure(&self, strategy_id: &StrategyId) -> Result<Decimal, RiskDataError> {
        if let Some(exposure) = self.exposure.read().get(strategy_id) {
            return Ok(*exposure);
        }
        Ok(self
            .positions
            .read()
            .values()
            .filter(|p| &p.strategy_id == strategy_id)
            .map(|p| p.notional().map_or(Decimal::MAX, |n| n.abs()))
            .fold(Decimal::ZERO, Decimal::saturating_add))
    }
}

impl DrawdownCalculator for InMemoryRiskStore {
    fn current_drawdown_percent(&self, strategy_id: &StrategyId) -> Result<Decimal, RiskDataError> {
        Ok(self
            .drawdown
            .read()
            .get(strategy_id)
            .copied()
            .unwrap_or(Decimal::ZERO))
    }
}

impl PositionLookup for InMemoryRiskStore {
    fn position(
        &self,
        strategy_id: &StrategyId,
        symbol: &Symbol,
    ) -> Result<Option<Position>, RiskDataError> {
        Ok(self
            .positions
            .read()
            .get(&(strategy_id.clone(), symbol.clone()))
            .cloned())
    }
}

impl OrderRateTracker for InMemoryRiskStore {
    fn orders_in_window(
        &self,
        strategy_id: &StrategyId,
        window: Duration,
    ) -> Result<u32, RiskDataError> {
        let now = Instant::now();
        let submissions = self.submissions.read();
        let count = submissions.get(strategy_id).map_or(0, |times| {
            times
                .iter()
                .rev()
                .take_while(|at| now.duration_since(**at) < window)
                .count()
        });
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    fn record_submission(&self, strategy_id: &StrategyId) {
        let now = Instant::now();
        let mut submissions = self.submissions.write();
        let times = submissions.entry(strategy_id.clone()).or_default();
        while times
            .front()
            .is_some_and(|at| now.duration_since(*at) > SUBMISSION_RETENTION)
        {
            times.pop_front();
        }
        times.push_back(now);
    }
}

impl StrategyDirectory for InMemoryRiskStore {
    fn is_running(&self, strategy_id: &StrategyId) -> Result<bool, RiskDataError> {
        self.strategies
            .read()
            .get(strategy_id)
            .copied()
            .ok_or_else(|| RiskDataError::NotFound {
                what: format!("strategy {strategy_id}"),
            })
    }

    fn active_strategies(&self) -> Result<Vec<StrategyId>, RiskDataError> {
        let mut active: Vec<StrategyId> = self
            .strategies
            .read()
            .iter()
            .filter(|(_, running)| **running)
            .map(|(id, _)| id.clone())
            .collect();
        active.sort();
        Ok(active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::risk_management::PositionSide;
    use crate::domain::shared::{Price, Quantity};
    use rust_decimal_macros::dec;

    fn position(strategy: &str, symbol: &str, size: Decimal, mark: Decimal) -> Position {
        Position {
            strategy_id: StrategyId::new(strategy),
            symbol: Symbol::new(symbol),
            side: PositionSide::Long,
            size: Quantity::new(size),
            entry_price: Price::new(mark),
            mark_price: Price::new(mark),
            unrealized_pnl: Decimal::ZERO,
            margin: dec!(100),
            maintenance_margin: dec!(10),
        }
    }

    #[test]
    fn limits_not_found_until_set() {
        let store = InMemoryRiskStore::new();
        let strategy = StrategyId::new("s1");

        assert!(matches!(
            store.limits(&strategy),
            Err(RiskDataError::NotFound { .. })
        ));

        let limits = RiskLimits {
            max_order_size: dec!(5),
            ..RiskLimits::default()
        };
        store.set_limits(strategy.clone(), limits.clone());
        assert_eq!(store.limits(&strategy).unwrap(), limits);
    }

    #[test]
    fn exposure_sums_positions_unless_pinned() {
        let store = InMemoryRiskStore::new();
        let strategy = StrategyId::new("s1");
        store.set_position(position("s1", "BTCUSDT", dec!(0.5), dec!(40000)));
        store.set_position(position("s1", "ETHUSDT", dec!(2), dec!(2000)));
        store.set_position(position("s2", "ETHUSDT", dec!(100), dec!(2000)));

        assert_eq!(store.current_exposure(&strategy).unwrap(), dec!(24000));

        store.set_exposure(strategy.clone(), dec!(49000));
        assert_eq!(store.current_exposure(&strategy).unwrap(), dec!(49000));
    }

    #[test]
    fn exposure_saturates_instead_of_overflowing() {
        let store = InMemoryRiskStore::new();
        let strategy = StrategyId::new("s1");
        store.set_position(position("s1", "BTCUSDT", dec!(10), Decimal::MAX / dec!(5)));
        store.set_position(position("s1", "ETHUSDT", dec!(1), Decimal::MAX));

        assert_eq!(store.current_exposure(&strategy).unwrap(), Decimal::MAX);
    }

    #[test]
    fn positions_by_strategy_and_symbol() {
        let store = InMemoryRiskStore::new();
        let strategy = StrategyId::new("s1");
        let symbol = Symbol::new("BTCUSDT");
        store.set_position(position("s1", "BTCUSDT", dec!(1), dec!(100)));

        assert!(store.position(&strategy, &symbol).unwrap().is_some());
        assert!(
            store
                .position(&StrategyId::new("s2"), &symbol)
                .unwrap()
                .is_none()
        );

        assert!(store.remove_position(&strategy, &symbol).is_some());
        assert!(store.position(&strategy, &symbol).unwrap().is_none());
    }

    #[test]
    fn drawdown_defaults_to_zero() {
        let store = InMemoryRiskStore::new();
        let strategy = StrategyId::new("s1");
        assert_eq!(store.current_drawdown_percent(&strategy).unwrap(), dec!(0));

        store.set_drawdown(strategy.clone(), dec!(7.5));
        assert_eq!(store.current_drawdown_percent(&strategy).unwrap(), dec!(7.5));
    }

    #[test]
    fn submissions_counted_in_window() {
        let store = InMemoryRiskStore::new();
        let strategy = StrategyId::new("s1");

        for _ in 0..3 {
            store.record_submission(&strategy);
        }

        assert_eq!(
            store
                .orders_in_window(&strategy, Duration::from_secs(1))
                .unwrap(),
            3
        );
        assert_eq!(
            store
                .orders_in_window(&strategy, Duration::ZERO)
                .unwrap(),
            0
        );
        assert_eq!(
            store
                .orders_in_window(&StrategyId::new("other"), Duration::from_secs(1))
                .unwrap(),
            0
        );
    }

    #[test]
    fn directory_lists_running_strategies() {
        let store = InMemoryRiskStore::new();
        store.set_strategy_running(StrategyId::new("b"), true);
        store.set_strategy_running(StrategyId::new("a"), true);
        store.set_strategy_running(StrategyId::new("c"), false);

        assert_eq!(
            store.active_strategies().unwrap(),
            vec![StrategyId::new("a"), StrategyId::new("b")]
        );
        assert!(store.is_running(&StrategyId::new("a")).unwrap());
        assert!(!store.is_running(&StrategyId::new("c")).unwrap());
        assert!(store.is_running(&StrategyId::new("missing")).is_err());
    }
}
