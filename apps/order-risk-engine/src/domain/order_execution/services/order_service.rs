//! Order Domain Service
//!
//! Builds validated orders and prices them. Execution and persistence are
//! left to the caller.

use std::sync::Arc;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::order_execution::aggregate::{CreateOrderRequest, Order};
use crate::domain::order_execution::errors::OrderError;
use crate::domain::order_execution::value_objects::{CommissionSchedule, OrderType};
use crate::domain::risk_management::errors::RiskViolation;
use crate::domain::risk_management::providers::StrategyDirectory;
use crate::domain::shared::{Commission, ExchangeId, StrategyId};

/// Pre-trade risk validation used by the order service.
#[cfg_attr(test, mockall::automock)]
pub trait OrderRiskValidator: Send + Sync {
    /// Validate an order against risk limits.
    ///
    /// # Errors
    ///
    /// Returns the violated rule.
    fn validate_order(&self, order: &Order) -> Result<(), RiskViolation>;
}

impl<T: OrderRiskValidator + ?Sized> OrderRiskValidator for Arc<T> {
    fn validate_order(&self, order: &Order) -> Result<(), RiskViolation> {
        (**self).validate_order(order)
    }
}

/// Errors from the order service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderServiceError {
    /// Malformed request or illegal order operation.
    #[error("order validation failed: {0}")]
    Validation(#[from] OrderError),

    /// A risk rule refused the order.
    #[error("order blocked by risk management: {0}")]
    RiskBlocked(RiskViolation),

    /// Market orders have no price to value them with.
    #[error("cannot calculate value without current market price")]
    MissingMarketPrice,

    /// Order value or commission does not fit in a `Decimal`.
    #[error("order value overflows")]
    ValueOverflow,

    /// The order belongs to another strategy.
    #[error("order belongs to strategy {actual}, not {expected}")]
    StrategyMismatch {
        /// Strategy asked about.
        expected: StrategyId,
        /// Strategy on the order.
        actual: StrategyId,
    },

    /// The strategy is not running.
    #[error("strategy {0} is not running")]
    StrategyNotRunning(StrategyId),
}

impl OrderServiceError {
    /// True when a risk rule (not malformed input) refused the order.
    #[must_use]
    pub const fn is_risk_blocked(&self) -> bool {
        matches!(self, Self::RiskBlocked(_))
    }
}

/// Order Domain Service.
pub struct OrderService<V> {
    validator: V,
    commission: CommissionSchedule,
    strategies: Option<Arc<dyn StrategyDirectory>>,
}

impl<V: OrderRiskValidator> OrderService<V> {
    /// Create a service validating through `validator`.
    pub fn new(validator: V, commission: CommissionSchedule) -> Self {
        Self {
            validator,
            commission,
            strategies: None,
        }
    }

    /// Consult `directory` for strategy run state in placement checks.
    #[must_use]
    pub fn with_strategy_directory(mut self, directory: Arc<dyn StrategyDirectory>) -> Self {
        self.strategies = Some(directory);
        self
    }

    /// The commission schedule in use.
    pub const fn commission_schedule(&self) -> &CommissionSchedule {
        &self.commission
    }

    /// Validate `request`, build the order and run it past the risk checks.
    ///
    /// # Errors
    ///
    /// `Validation` for malformed requests, `RiskBlocked` when a risk rule
    /// refuses the order.
    pub fn create_order(&self, request: CreateOrderRequest) -> Result<Order, OrderServiceError> {
        let order = Order::new(request)?;

        self.validator
            .validate_order(&order)
            .map_err(OrderServiceError::RiskBlocked)?;

        tracing::debug!(
            order_id = %order.id(),
            strategy_id = %order.strategy_id(),
            symbol = %order.symbol(),
            side = %order.side(),
            quantity = %order.quantity(),
            "Order created"
        );

        Ok(order)
    }

    /// Notional value: quantity times the limit price, or the stop price for
    /// stop orders.
    ///
    /// # Errors
    ///
    /// `MissingMarketPrice` for market orders, `ValueOverflow` when the
    /// notional does not fit in a `Decimal`.
    pub fn calculate_order_value(&self, order: &Order) -> Result<Decimal, OrderServiceError> {
        let price = match order.order_type() {
            OrderType::Market => return Err(OrderServiceError::MissingMarketPrice),
            OrderType::Limit | OrderType::StopLimit => order.price(),
            OrderType::Stop => order
                .stop_price()
                .ok_or(OrderServiceError::MissingMarketPrice)?,
        };
        price
            .notional(order.quantity())
            .ok_or(OrderServiceError::ValueOverflow)
    }

    /// Estimated commission of `order` on `exchange`.
    ///
    /// # Errors
    ///
    /// Propagates `calculate_order_value` failures.
    pub fn calculate_commission(
        &self,
        order: &Order,
        exchange: &ExchangeId,
    ) -> Result<Commission, OrderServiceError> {
        let value = self.calculate_order_value(order)?;
        let rate = self.commission.rate_for(exchange);
        let asset = self.commission.settlement_asset(exchange, order.symbol());
        let amount = value
            .checked_mul(rate)
            .ok_or(OrderServiceError::ValueOverflow)?;
        Ok(Commission::new(amount, asset))
    }

    /// Check that `strategy_id` may place `order` right now.
    ///
    /// The strategy must own the order and be running. When the strategy
    /// directory cannot answer, only the risk checks apply.
    ///
    /// # Errors
    ///
    /// The first reason the order may not be placed.
    pub fn check_placement(
        &self,
        strategy_id: &StrategyId,
        order: &Order,
    ) -> Result<(), OrderServiceError> {
        if order.strategy_id() != strategy_id {
            return Err(OrderServiceError::StrategyMismatch {
                expected: strategy_id.clone(),
                actual: order.strategy_id().clone(),
            });
        }

        if let Some(directory) = &self.strategies {
            match directory.is_running(strategy_id) {
                Ok(true) => {}
                Ok(false) => {
                    return Err(OrderServiceError::StrategyNotRunning(strategy_id.clone()));
                }
                Err(e) => {
                    tracing::warn!(
                        strategy_id = %strategy_id,
                        error = %e,
                        "Strategy directory unavailable, falling back to risk checks only"
                    );
                }
            }
        }

        self.validator
            .validate_order(order)
            .map_err(OrderServiceError::RiskBlocked)
    }

    /// Boolean form of [`check_placement`](Self::check_placement).
    pub fn can_place_order(&self, strategy_id: &StrategyId, order: &Order) -> bool {
        match self.check_placement(strategy_id, order) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(order_id = %order.id(), reason = %e, "Order cannot be placed");
                false
            }
        }
    }
}
