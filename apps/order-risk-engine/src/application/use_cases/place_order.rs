//! Place Order Use Case
//!
//! Takes an external command through creation, risk validation and
//! submission, leaving the order in `New` on success or `Rejected` when
//! risk or the venue refuses it.

use std::sync::Arc;
use std::time::Instant;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::application::dto::PlaceOrderCommand;
use crate::application::ports::{ExecutionError, ExecutionPort};
use crate::application::services::{RiskService, RiskServiceError};
use crate::domain::order_execution::aggregate::Order;
use crate::domain::order_execution::errors::OrderError;
use crate::domain::order_execution::services::{OrderService, OrderServiceError};
use crate::domain::order_execution::value_objects::CommissionSchedule;
use crate::domain::risk_management::{OrderRateTracker, StrategyDirectory};
use crate::domain::shared::{Commission, StrategyId};
use crate::observability;

/// Result of a successful placement.
#[derive(Debug, Clone)]
pub struct PlaceOrderResult {
    /// The acknowledged order.
    pub order: Order,
    /// Notional value, when the order type carries a price.
    pub estimated_value: Option<Decimal>,
    /// Estimated commission, when the value is known.
    pub commission: Option<Commission>,
}

/// Errors from placing an order.
#[derive(Debug, Error)]
pub enum PlaceOrderError {
    /// The strategy directory reports the strategy as stopped.
    #[error("strategy {0} is not running")]
    StrategyNotRunning(StrategyId),

    /// A command field could not be parsed.
    #[error("invalid order command: {0}")]
    InvalidCommand(#[source] OrderError),

    /// The order could not be created.
    #[error(transparent)]
    Order(#[from] OrderServiceError),

    /// Risk refused the order at submission.
    #[error("{source}")]
    RiskBlocked {
        /// The order, now rejected.
        order: Box<Order>,
        /// The block.
        source: RiskServiceError,
    },

    /// The venue refused or never acknowledged the order.
    #[error("execution failed: {source}")]
    ExecutionFailed {
        /// The order, now rejected.
        order: Box<Order>,
        /// Venue error.
        source: ExecutionError,
    },
}

impl PlaceOrderError {
    /// True when a risk rule refused the order, at creation or submission.
    #[must_use]
    pub const fn is_risk_blocked(&self) -> bool {
        matches!(
            self,
            Self::RiskBlocked { .. } | Self::Order(OrderServiceError::RiskBlocked(_))
        )
    }

    /// The rejected order, if one was created.
    #[must_use]
    pub fn order(&self) -> Option<&Order> {
        match self {
            Self::RiskBlocked { order, .. } | Self::ExecutionFailed { order, .. } => Some(&**order),
            _ => None,
        }
    }
}

/// Use case for placing a single order.
pub struct PlaceOrderUseCase<E>
where
    E: ExecutionPort,
{
    order_service: OrderService<RiskService>,
    risk_service: RiskService,
    order_rate: Arc<dyn OrderRateTracker>,
    execution: Arc<E>,
    strategies: Option<Arc<dyn StrategyDirectory>>,
}

impl<E> PlaceOrderUseCase<E>
where
    E: ExecutionPort,
{
    /// Create a new PlaceOrderUseCase.
    ///
    /// Orders are created through `risk_service`, so blocks at creation are
    /// counted and recorded like blocks at submission.
    pub fn new(
        risk_service: RiskService,
        commission: CommissionSchedule,
        order_rate: Arc<dyn OrderRateTracker>,
        execution: Arc<E>,
    ) -> Self {
        Self {
            order_service: OrderService::new(risk_service.clone(), commission),
            risk_service,
            order_rate,
            execution,
            strategies: None,
        }
    }

    /// Refuse orders from strategies `directory` reports as stopped.
    #[must_use]
    pub fn with_strategy_directory(mut self, directory: Arc<dyn StrategyDirectory>) -> Self {
        self.strategies = Some(directory);
        self
    }

    /// Execute the use case.
    ///
    /// # Errors
    ///
    /// See [`PlaceOrderError`]. Errors after creation carry the rejected order.
    pub async fn execute(
        &self,
        command: PlaceOrderCommand,
    ) -> Result<PlaceOrderResult, PlaceOrderError> {
        let started = Instant::now();

        // 1. Strategy must be running
        let strategy_id = StrategyId::new(command.strategy_id.trim());
        self.ensure_running(&strategy_id)?;

        // 2. Parse and create
        let request = command
            .to_request()
            .map_err(PlaceOrderError::InvalidCommand)?;
        let mut order = match self.order_service.create_order(request) {
            Ok(order) => order,
            Err(e) => {
                if e.is_risk_blocked() {
                    observability::record_order_rejection(
                        command.exchange.trim(),
                        "risk_blocked",
                    );
                }
                return Err(e.into());
            }
        };

        // 3. Re-check at submission
        if let Err(e) = self.risk_service.validate_order(&order) {
            reject(&mut order, e.to_string());
            observability::record_order_rejection(order.exchange().as_str(), "risk_blocked");
            return Err(PlaceOrderError::RiskBlocked {
                order: Box::new(order),
                source: e,
            });
        }

        // 4. Estimates
        let estimated_value = match self.order_service.calculate_order_value(&order) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!(order_id = %order.id(), reason = %e, "Order value not estimated");
                None
            }
        };
        let commission = estimated_value.and_then(|_| {
            self.order_service
                .calculate_commission(&order, order.exchange())
                .ok()
        });

        // 5. Submit
        self.order_rate.record_submission(order.strategy_id());
        match self.execution.submit(&order).await {
            Ok(ack) => {
                if let Err(e) = order.set_exchange_order_id(ack.exchange_order_id) {
                    tracing::warn!(order_id = %order.id(), error = %e, "Exchange order id not recorded");
                }
                order.confirm().map_err(OrderServiceError::from)?;
                let latency = started.elapsed();
                order.set_latency(latency);

                observability::record_order_submission(
                    order.exchange().as_str(),
                    "accepted",
                    &order.order_type().to_string(),
                    latency.as_secs_f64(),
                );
                tracing::info!(
                    order_id = %order.id(),
                    strategy_id = %order.strategy_id(),
                    symbol = %order.symbol(),
                    exchange_order_id = ?order.exchange_order_id(),
                    latency_us = latency.as_micros() as u64,
                    "Order placed"
                );

                Ok(PlaceOrderResult {
                    order,
                    estimated_value,
                    commission,
                })
            }
            Err(e) => {
                reject(&mut order, format!("execution failed: {e}"));
                observability::record_order_submission(
                    order.exchange().as_str(),
                    "failed",
                    &order.order_type().to_string(),
                    started.elapsed().as_secs_f64(),
                );
                observability::record_order_rejection(order.exchange().as_str(), "execution");
                Err(PlaceOrderError::ExecutionFailed {
                    order: Box::new(order),
                    source: e,
                })
            }
        }
    }

    fn ensure_running(&self, strategy_id: &StrategyId) -> Result<(), PlaceOrderError> {
        let Some(directory) = &self.strategies else {
            return Ok(());
        };
        match directory.is_running(strategy_id) {
            Ok(true) => Ok(()),
            Ok(false) => Err(PlaceOrderError::StrategyNotRunning(strategy_id.clone())),
            Err(e) => {
                tracing::warn!(
                    strategy_id = %strategy_id,
                    error = %e,
                    "Strategy directory unavailable, continuing with risk checks"
                );
                Ok(())
            }
        }
    }
}

fn reject(order: &mut Order, reason: String) {
    tracing::warn!(order_id = %order.id(), reason = %reason, "Order rejected");
    if let Err(e) = order.reject(reason) {
        tracing::error!(order_id = %order.id(), error = %e, "Failed to mark order rejected");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::NoOpRiskEventSink;
    use crate::domain::order_execution::value_objects::OrderStatus;
    use crate::domain::risk_management::{RiskChecker, RiskDataSources, RiskEventType, RiskLimits};
    use crate::domain::shared::Symbol;
    use crate::infrastructure::execution::PaperExecutionAdapter;
    use crate::infrastructure::persistence::InMemoryRiskStore;
    use rust_decimal_macros::dec;

    struct Harness {
        store: Arc<InMemoryRiskStore>,
        risk: RiskService,
        execution: Arc<PaperExecutionAdapter>,
        use_case: PlaceOrderUseCase<PaperExecutionAdapter>,
    }

    fn harness() -> Harness {
        let store = Arc::new(InMemoryRiskStore::new());
        store.set_strategy_running(StrategyId::new("momentum-1"), true);
        store.set_strategy_running(StrategyId::new("paused"), false);

        let checker = RiskChecker::new(
            RiskDataSources::from_store(store.clone()),
            RiskLimits::default(),
        );
        let risk = RiskService::new(checker, Arc::new(NoOpRiskEventSink));
        let execution = Arc::new(PaperExecutionAdapter::default());
        let use_case = PlaceOrderUseCase::new(
            risk.clone(),
            CommissionSchedule::default(),
            store.clone(),
            execution.clone(),
        )
        .with_strategy_directory(store.clone());

        Harness {
            store,
            risk,
            execution,
            use_case,
        }
    }

    fn command() -> PlaceOrderCommand {
        PlaceOrderCommand {
            strategy_id: "momentum-1".to_string(),
            client_order_id: None,
            symbol: "BTCUSDT".to_string(),
            exchange: "binance".to_string(),
            side: "BUY".to_string(),
            order_type: "LIMIT".to_string(),
            quantity: "0.1".to_string(),
            price: Some("50000".to_string()),
            stop_price: None,
            time_in_force: None,
            expires_at: None,
        }
    }

    #[tokio::test]
    async fn places_limit_order() {
        let h = harness();

        let result = h.use_case.execute(command()).await.unwrap();

        assert_eq!(result.order.status(), OrderStatus::New);
        assert_eq!(
            result.order.exchange_order_id().map(|id| id.as_str()),
            Some("PAPER-1")
        );
        assert!(result.order.latency().is_some());
        assert_eq!(result.estimated_value, Some(dec!(5000)));
        let commission = result.commission.unwrap();
        assert_eq!(commission.amount, dec!(5));
        assert_eq!(commission.asset, "USDT");

        assert_eq!(h.execution.submitted(), 1);
        assert_eq!(
            h.store
                .orders_in_window(&StrategyId::new("momentum-1"), std::time::Duration::from_secs(1))
                .unwrap(),
            1
        );
        let metrics = h.risk.metrics();
        assert_eq!(metrics.violations, 0);
        assert!(metrics.total_checks >= 1);
    }

    #[tokio::test]
    async fn market_order_has_no_estimate() {
        let h = harness();
        let cmd = PlaceOrderCommand {
            order_type: "MARKET".to_string(),
            price: None,
            ..command()
        };

        let result = h.use_case.execute(cmd).await.unwrap();

        assert_eq!(result.order.status(), OrderStatus::New);
        assert!(result.estimated_value.is_none());
        assert!(result.commission.is_none());
    }

    #[tokio::test]
    async fn stopped_strategy_is_refused() {
        let h = harness();
        let cmd = PlaceOrderCommand {
            strategy_id: "paused".to_string(),
            ..command()
        };

        let err = h.use_case.execute(cmd).await.unwrap_err();

        assert!(matches!(err, PlaceOrderError::StrategyNotRunning(id) if id.as_str() == "paused"));
        assert_eq!(h.execution.submitted(), 0);
        assert_eq!(h.risk.metrics().total_checks, 0);
    }

    #[tokio::test]
    async fn unparsable_command_is_refused() {
        let h = harness();
        let cmd = PlaceOrderCommand {
            quantity: "lots".to_string(),
            ..command()
        };

        let err = h.use_case.execute(cmd).await.unwrap_err();

        assert!(matches!(err, PlaceOrderError::InvalidCommand(_)));
        assert!(err.order().is_none());
    }

    #[tokio::test]
    async fn invalid_order_is_refused() {
        let h = harness();
        let cmd = PlaceOrderCommand {
            quantity: "0".to_string(),
            ..command()
        };

        let err = h.use_case.execute(cmd).await.unwrap_err();

        assert!(matches!(
            err,
            PlaceOrderError::Order(OrderServiceError::Validation(_))
        ));
        assert!(!err.is_risk_blocked());
    }

    #[tokio::test]
    async fn oversize_order_is_blocked_and_recorded() {
        let h = harness();
        let cmd = PlaceOrderCommand {
            quantity: "150".to_string(),
            price: Some("1".to_string()),
            ..command()
        };

        let err = h.use_case.execute(cmd).await.unwrap_err();

        assert!(err.is_risk_blocked());
        assert_eq!(h.execution.submitted(), 0);

        let metrics = h.risk.metrics();
        assert_eq!(metrics.blocked_orders, 1);
        assert_eq!(metrics.violations, 1);
        let events = h.risk.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, RiskEventType::OrderValidation);
    }

    #[tokio::test]
    async fn venue_rejection_rejects_order() {
        let h = harness();
        h.execution.reject_symbol(Symbol::new("BTCUSDT"));

        let err = h.use_case.execute(command()).await.unwrap_err();

        assert!(matches!(err, PlaceOrderError::ExecutionFailed { .. }));
        let order = err.order().unwrap();
        assert_eq!(order.status(), OrderStatus::Rejected);
        assert!(
            order
                .error_message()
                .unwrap()
                .starts_with("execution failed:")
        );
    }
}
