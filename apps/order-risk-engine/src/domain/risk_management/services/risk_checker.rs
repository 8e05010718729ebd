//! Risk Checker
//!
//! Stateless, synchronous evaluation of risk rules. Every rule returns on the
//! first failure. A data source that cannot answer never blocks trading on
//! its own: limits fall back to the injected defaults and calculator errors
//! let the check pass with a warning.

use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;

use crate::domain::order_execution::aggregate::Order;
use crate::domain::order_execution::services::OrderRiskValidator;
use crate::domain::risk_management::errors::{RiskDataError, RiskViolation, ViolationKind};
use crate::domain::risk_management::providers::RiskDataSources;
use crate::domain::risk_management::value_objects::{Position, RiskLimits};
use crate::domain::shared::{Price, StrategyId};

/// Window used for `max_orders_per_second`.
pub const DEFAULT_RATE_WINDOW: Duration = Duration::from_secs(1);

/// Risk Checker - validates orders, positions and strategy aggregates.
#[derive(Debug, Clone)]
pub struct RiskChecker {
    sources: RiskDataSources,
    default_limits: RiskLimits,
    rate_window: Duration,
}

impl RiskChecker {
    /// Create a checker over `sources` with the fallback `default_limits`.
    #[must_use]
    pub fn new(sources: RiskDataSources, default_limits: RiskLimits) -> Self {
        Self {
            sources,
            default_limits,
            rate_window: DEFAULT_RATE_WINDOW,
        }
    }

    /// Override the order-rate window.
    #[must_use]
    pub fn with_rate_window(mut self, window: Duration) -> Self {
        self.rate_window = window;
        self
    }

    /// The fallback limits.
    #[must_use]
    pub const fn default_limits(&self) -> &RiskLimits {
        &self.default_limits
    }

    /// Limits for `strategy_id`, falling back to the defaults.
    #[must_use]
    pub fn limits_for(&self, strategy_id: &StrategyId) -> RiskLimits {
        match self.sources.limits.limits(strategy_id) {
            Ok(limits) => limits,
            Err(RiskDataError::NotFound { .. }) => {
                tracing::debug!(strategy_id = %strategy_id, "No risk limits configured, using defaults");
                self.default_limits.clone()
            }
            Err(e) => {
                tracing::warn!(strategy_id = %strategy_id, error = %e, "Risk limits unavailable, using defaults");
                self.default_limits.clone()
            }
        }
    }

    // ========================================================================
    // Order validation
    // ========================================================================

    /// Validate an order before submission.
    ///
    /// Rules, in order: order size, position limits, exposure, order rate,
    /// market hours.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule.
    pub fn validate_order(&self, order: &Order) -> Result<(), RiskViolation> {
        let limits = self.limits_for(order.strategy_id());

        Self::check_order_size(order, &limits)?;
        self.check_position_limits(order, &limits)?;
        self.check_order_exposure(order, &limits)?;
        self.check_order_rate(order, &limits)?;
        self.check_market_hours(order)?;

        Ok(())
    }

    fn check_order_size(order: &Order, limits: &RiskLimits) -> Result<(), RiskViolation> {
        let size = order.quantity().amount();
        if size > limits.max_order_size {
            return Err(violation(
                order,
                ViolationKind::OrderSize,
                format!(
                    "order size {} exceeds maximum {}",
                    size.normalize(),
                    limits.max_order_size.normalize()
                ),
            )
            .with_values(size, limits.max_order_size));
        }
        Ok(())
    }

    fn check_position_limits(&self, order: &Order, limits: &RiskLimits) -> Result<(), RiskViolation> {
        let position = match self
            .sources
            .positions
            .position(order.strategy_id(), order.symbol())
        {
            Ok(Some(position)) => position,
            Ok(None) => return Ok(()),
            Err(e) => {
                tracing::warn!(
                    strategy_id = %order.strategy_id(),
                    symbol = %order.symbol(),
                    error = %e,
                    "Position lookup failed, skipping position limit check"
                );
                return Ok(());
            }
        };

        let new_size = position.size_after(order.side(), order.quantity()).amount();
        if new_size > limits.max_position_size {
            return Err(violation(
                order,
                ViolationKind::PositionSize,
                format!(
                    "position size would be {}, exceeding maximum {}",
                    new_size.normalize(),
                    limits.max_position_size.normalize()
                ),
            )
            .with_values(new_size, limits.max_position_size));
        }
        Ok(())
    }

    fn check_order_exposure(&self, order: &Order, limits: &RiskLimits) -> Result<(), RiskViolation> {
        let current = match self.sources.exposure.current_exposure(order.strategy_id()) {
            Ok(exposure) => exposure,
            Err(e) => {
                tracing::warn!(
                    strategy_id = %order.strategy_id(),
                    error = %e,
                    "Exposure calculation failed, allowing order"
                );
                return Ok(());
            }
        };

        let Some(new_exposure) = reference_price(order)
            .notional(order.quantity())
            .and_then(|value| current.checked_add(value))
        else {
            return Err(violation(
                order,
                ViolationKind::Exposure,
                format!(
                    "exposure overflows, exceeding maximum {}",
                    limits.max_exposure.normalize()
                ),
            ));
        };
        if new_exposure > limits.max_exposure {
            return Err(violation(
                order,
                ViolationKind::Exposure,
                format!(
                    "exposure would be {}, exceeding maximum {}",
                    new_exposure.normalize(),
                    limits.max_exposure.normalize()
                ),
            )
            .with_values(new_exposure, limits.max_exposure));
        }
        Ok(())
    }

    fn check_order_rate(&self, order: &Order, limits: &RiskLimits) -> Result<(), RiskViolation> {
        let count = match self
            .sources
            .order_rate
            .orders_in_window(order.strategy_id(), self.rate_window)
        {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!(
                    strategy_id = %order.strategy_id(),
                    error = %e,
                    "Order rate lookup failed, allowing order"
                );
                return Ok(());
            }
        };

        if count >= limits.max_orders_per_second {
            return Err(violation(
                order,
                ViolationKind::OrderRate,
                format!(
                    "order rate {count} per {:?} reached maximum {}",
                    self.rate_window, limits.max_orders_per_second
                ),
            )
            .with_values(
                Decimal::from(count),
                Decimal::from(limits.max_orders_per_second),
            ));
        }
        Ok(())
    }

    fn check_market_hours(&self, order: &Order) -> Result<(), RiskViolation> {
        if self.sources.market_hours.is_open(order.symbol(), Utc::now()) {
            Ok(())
        } else {
            Err(violation(
                order,
                ViolationKind::MarketClosed,
                format!("market closed for {}", order.symbol()),
            ))
        }
    }

    // ========================================================================
    // Position and strategy checks
    // ========================================================================

    /// Validate an open position: size, unrealized loss, margin.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule.
    pub fn validate_position(&self, position: &Position) -> Result<(), RiskViolation> {
        let limits = self.limits_for(&position.strategy_id);
        let base = |kind, message: String| {
            RiskViolation::new(kind, position.strategy_id.clone(), message)
                .with_symbol(position.symbol.clone())
        };

        let size = position.size.amount();
        if size > limits.max_position_size {
            return Err(base(
                ViolationKind::PositionSize,
                format!(
                    "position size {} exceeds maximum {}",
                    size.normalize(),
                    limits.max_position_size.normalize()
                ),
            )
            .with_values(size, limits.max_position_size));
        }

        let loss = position.unrealized_loss();
        if loss > limits.max_daily_loss {
            return Err(base(
                ViolationKind::DailyLoss,
                format!(
                    "unrealized loss {} exceeds maximum daily loss {}",
                    loss.normalize(),
                    limits.max_daily_loss.normalize()
                ),
            )
            .with_values(loss, limits.max_daily_loss));
        }

        if position.margin < position.maintenance_margin {
            return Err(base(
                ViolationKind::Margin,
                format!(
                    "margin {} below maintenance margin {}",
                    position.margin.normalize(),
                    position.maintenance_margin.normalize()
                ),
            )
            .with_values(position.margin, position.maintenance_margin));
        }

        Ok(())
    }

    /// Check total exposure of a strategy.
    ///
    /// Returns the observed exposure, or `None` if it could not be computed.
    ///
    /// # Errors
    ///
    /// Returns a violation if exposure exceeds `max_exposure`.
    pub fn check_exposure(&self, strategy_id: &StrategyId) -> Result<Option<Decimal>, RiskViolation> {
        let limits = self.limits_for(strategy_id);
        let exposure = match self.sources.exposure.current_exposure(strategy_id) {
            Ok(exposure) => exposure,
            Err(e) => {
                tracing::warn!(strategy_id = %strategy_id, error = %e, "Exposure calculation failed");
                return Ok(None);
            }
        };

        if exposure > limits.max_exposure {
            return Err(RiskViolation::new(
                ViolationKind::Exposure,
                strategy_id.clone(),
                format!(
                    "exposure {} exceeds maximum {}",
                    exposure.normalize(),
                    limits.max_exposure.normalize()
                ),
            )
            .with_values(exposure, limits.max_exposure));
        }
        Ok(Some(exposure))
    }

    /// Check drawdown of a strategy.
    ///
    /// Returns the observed drawdown percent, or `None` if it could not be
    /// computed.
    ///
    /// # Errors
    ///
    /// Returns a violation if drawdown exceeds `max_drawdown_percent`.
    pub fn check_drawdown(&self, strategy_id: &StrategyId) -> Result<Option<Decimal>, RiskViolation> {
        let limits = self.limits_for(strategy_id);
        let drawdown = match self.sources.drawdown.current_drawdown_percent(strategy_id) {
            Ok(drawdown) => drawdown,
            Err(e) => {
                tracing::warn!(strategy_id = %strategy_id, error = %e, "Drawdown calculation failed");
                return Ok(None);
            }
        };

        if drawdown > limits.max_drawdown_percent {
            return Err(RiskViolation::new(
                ViolationKind::Drawdown,
                strategy_id.clone(),
                format!(
                    "drawdown {}% exceeds maximum {}%",
                    drawdown.normalize(),
                    limits.max_drawdown_percent.normalize()
                ),
            )
            .with_values(drawdown, limits.max_drawdown_percent));
        }
        Ok(Some(drawdown))
    }
}

impl OrderRiskValidator for RiskChecker {
    fn validate_order(&self, order: &Order) -> Result<(), RiskViolation> {
        Self::validate_order(self, order)
    }
}

/// Price used to value an order for exposure: the limit price, else the
/// stop price. Market orders carry no price and add no exposure here.
fn reference_price(order: &Order) -> Price {
    if order.price().is_positive() {
        order.price()
    } else {
        order.stop_price().unwrap_or(Price::ZERO)
    }
}

fn violation(order: &Order, kind: ViolationKind, message: String) -> RiskViolation {
    RiskViolation::new(kind, order.strategy_id().clone(), message)
        .with_symbol(order.symbol().clone())
}
