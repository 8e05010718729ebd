//! Order Aggregate Root

use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::order_execution::errors::OrderError;
use crate::domain::order_execution::events::{
    ExchangeOrderIdAssigned, OrderCanceled, OrderConfirmed, OrderCreated, OrderEvent,
    OrderPartiallyFilled, OrderRejected,
};
use crate::domain::order_execution::services::OrderStateMachine;
use crate::domain::order_execution::value_objects::{
    OrderSide, OrderStatus, OrderType, TimeInForce,
};
use crate::domain::shared::{
    ClientOrderId, Commission, ExchangeId, ExchangeOrderId, OrderId, Price, Quantity, StrategyId,
    Symbol,
};

/// Request to create a new order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    /// Strategy that owns the order.
    pub strategy_id: StrategyId,
    /// Optional caller-supplied id.
    pub client_order_id: Option<ClientOrderId>,
    /// Symbol to trade.
    pub symbol: Symbol,
    /// Venue to route to.
    pub exchange: ExchangeId,
    /// Order side.
    pub side: OrderSide,
    /// Order type.
    pub order_type: OrderType,
    /// Quantity to trade.
    pub quantity: Quantity,
    /// Limit price (zero for market and stop orders).
    pub price: Price,
    /// Stop price (required for Stop/StopLimit).
    pub stop_price: Option<Price>,
    /// Time in force.
    pub time_in_force: TimeInForce,
    /// Expiry, required for GTD orders only.
    pub expires_at: Option<DateTime<Utc>>,
}

impl CreateOrderRequest {
    /// Validate the request parameters.
    ///
    /// # Errors
    ///
    /// Returns error if required parameters are missing or invalid.
    pub fn validate(&self) -> Result<(), OrderError> {
        if self.strategy_id.is_blank() {
            return Err(OrderError::invalid("strategy_id", "strategy ID cannot be empty"));
        }
        self.symbol.validate()?;
        if self.exchange.is_blank() {
            return Err(OrderError::invalid("exchange", "exchange cannot be empty"));
        }

        self.quantity.validate_for_order()?;
        self.price.validate_for_order("price")?;

        if self.order_type.requires_price() && !self.price.is_positive() {
            return Err(OrderError::invalid(
                "price",
                format!("price must be positive for {} orders", self.order_type),
            ));
        }

        match self.stop_price {
            Some(stop) if !stop.is_positive() => {
                return Err(OrderError::invalid("stop_price", "stop price must be positive"));
            }
            None if self.order_type.requires_stop_price() => {
                return Err(OrderError::invalid(
                    "stop_price",
                    format!("stop price required for {} orders", self.order_type),
                ));
            }
            _ => {}
        }

        match (self.time_in_force.requires_expiry(), self.expires_at) {
            (true, None) => Err(OrderError::invalid(
                "expires_at",
                "GTD orders require an expiry",
            )),
            (true, Some(at)) if at <= Utc::now() => Err(OrderError::invalid(
                "expires_at",
                "expiry must be in the future",
            )),
            (false, Some(_)) => Err(OrderError::invalid(
                "expires_at",
                format!("expiry is only valid for GTD orders, not {}", self.time_in_force),
            )),
            _ => Ok(()),
        }
    }
}

/// Order Aggregate Root.
///
/// Fields are private; every mutation goes through a lifecycle method that
/// checks the transition, updates `updated_at`, and (except for latency)
/// appends to the event log. A method that returns an error leaves the
/// order untouched.
#[allow(clippy::struct_field_names)]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    client_order_id: Option<ClientOrderId>,
    strategy_id: StrategyId,
    symbol: Symbol,
    exchange: ExchangeId,
    side: OrderSide,
    order_type: OrderType,
    time_in_force: TimeInForce,
    quantity: Quantity,
    price: Price,
    stop_price: Option<Price>,
    status: OrderStatus,
    filled_quantity: Quantity,
    remaining_quantity: Quantity,
    avg_fill_price: Option<Price>,
    commission: Commission,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
    exchange_order_id: Option<ExchangeOrderId>,
    error_message: Option<String>,
    latency: Option<Duration>,
    events: Vec<OrderEvent>,
}

impl Order {
    /// Create a new order in `Pending` status.
    ///
    /// Generates an `OrderCreated` event.
    ///
    /// # Errors
    ///
    /// Returns error if request validation fails.
    pub fn new(request: CreateOrderRequest) -> Result<Self, OrderError> {
        request.validate()?;

        let id = OrderId::generate();
        let now = Utc::now();

        let created = OrderEvent::Created(OrderCreated {
            order_id: id.clone(),
            strategy_id: request.strategy_id.clone(),
            symbol: request.symbol.clone(),
            side: request.side,
            order_type: request.order_type,
            quantity: request.quantity,
            price: request.price,
            occurred_at: now,
        });

        Ok(Self {
            id,
            client_order_id: request.client_order_id,
            strategy_id: request.strategy_id,
            symbol: request.symbol,
            exchange: request.exchange,
            side: request.side,
            order_type: request.order_type,
            time_in_force: request.time_in_force,
            quantity: request.quantity,
            price: request.price,
            stop_price: request.stop_price,
            status: OrderStatus::Pending,
            filled_quantity: Quantity::ZERO,
            remaining_quantity: request.quantity,
            avg_fill_price: None,
            commission: Commission::default(),
            created_at: now,
            updated_at: now,
            expires_at: request.expires_at,
            exchange_order_id: None,
            error_message: None,
            latency: None,
            events: vec![created],
        })
    }

    // ========================================================================
    // Getters
    // ========================================================================

    /// Internal order id.
    #[must_use]
    pub const fn id(&self) -> &OrderId {
        &self.id
    }

    /// Caller-supplied id, if any.
    #[must_use]
    pub const fn client_order_id(&self) -> Option<&ClientOrderId> {
        self.client_order_id.as_ref()
    }

    /// Owning strategy.
    #[must_use]
    pub const fn strategy_id(&self) -> &StrategyId {
        &self.strategy_id
    }

    /// Traded symbol.
    #[must_use]
    pub const fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Target exchange.
    #[must_use]
    pub const fn exchange(&self) -> &ExchangeId {
        &self.exchange
    }

    /// Order side.
    #[must_use]
    pub const fn side(&self) -> OrderSide {
        self.side
    }

    /// Order type.
    #[must_use]
    pub const fn order_type(&self) -> OrderType {
        self.order_type
    }

    /// Time in force.
    #[must_use]
    pub const fn time_in_force(&self) -> TimeInForce {
        self.time_in_force
    }

    /// Ordered quantity.
    #[must_use]
    pub const fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// Limit price (zero for market and stop orders).
    #[must_use]
    pub const fn price(&self) -> Price {
        self.price
    }

    /// Stop price.
    #[must_use]
    pub const fn stop_price(&self) -> Option<Price> {
        self.stop_price
    }

    /// Current status.
    #[must_use]
    pub const fn status(&self) -> OrderStatus {
        self.status
    }

    /// Cumulative filled quantity.
    #[must_use]
    pub const fn filled_quantity(&self) -> Quantity {
        self.filled_quantity
    }

    /// Quantity still open.
    #[must_use]
    pub const fn remaining_quantity(&self) -> Quantity {
        self.remaining_quantity
    }

    /// Quantity-weighted average fill price; `None` before the first fill.
    #[must_use]
    pub const fn avg_fill_price(&self) -> Option<Price> {
        self.avg_fill_price
    }

    /// Accumulated commission.
    #[must_use]
    pub const fn commission(&self) -> &Commission {
        &self.commission
    }

    /// Creation time.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Time of the last mutation.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Expiry for GTD orders.
    #[must_use]
    pub const fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Id assigned by the exchange.
    #[must_use]
    pub const fn exchange_order_id(&self) -> Option<&ExchangeOrderId> {
        self.exchange_order_id.as_ref()
    }

    /// Rejection reason.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Processing latency, if measured.
    #[must_use]
    pub const fn latency(&self) -> Option<Duration> {
        self.latency
    }

    /// Append-only event log.
    #[must_use]
    pub fn events(&self) -> &[OrderEvent] {
        &self.events
    }

    // ========================================================================
    // Predicates
    // ========================================================================

    /// True while working at the exchange (`New` or `PartiallyFilled`).
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// True once completely filled.
    #[must_use]
    pub fn is_filled(&self) -> bool {
        self.status == OrderStatus::Filled
    }

    /// True once canceled.
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.status == OrderStatus::Canceled
    }

    /// True once rejected.
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        self.status == OrderStatus::Rejected
    }

    /// True in any terminal status.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Mark the order as acknowledged by the exchange (`Pending -> New`).
    ///
    /// # Errors
    ///
    /// Returns error unless the order is `Pending`.
    pub fn confirm(&mut self) -> Result<(), OrderError> {
        self.ensure_transition("confirm", OrderStatus::New)?;

        self.status = OrderStatus::New;
        self.updated_at = Utc::now();
        self.events.push(OrderEvent::Confirmed(OrderConfirmed {
            order_id: self.id.clone(),
            occurred_at: self.updated_at,
        }));

        Ok(())
    }

    /// Apply an execution.
    ///
    /// The average fill price is weighted by quantity and commission
    /// accumulates. Status becomes `Filled` when nothing remains, otherwise
    /// `PartiallyFilled`. A `PartiallyFilled` event carrying the post-fill
    /// snapshot is recorded for every fill, including the last.
    ///
    /// # Errors
    ///
    /// Returns error if the order is not `New`/`PartiallyFilled`, the fill
    /// is not positive, it exceeds the remaining quantity, or its notional
    /// does not fit in a `Decimal`. The order is unchanged on error.
    pub fn partial_fill(
        &mut self,
        quantity: Quantity,
        price: Price,
        commission: Commission,
    ) -> Result<(), OrderError> {
        if !self.status.can_fill() {
            return Err(OrderError::CannotFill {
                status: self.status,
            });
        }
        if !quantity.is_positive() {
            return Err(OrderError::invalid("fill_quantity", "must be positive"));
        }
        if !price.is_positive() {
            return Err(OrderError::invalid("fill_price", "must be positive"));
        }
        if quantity > self.remaining_quantity {
            return Err(OrderError::FillExceedsRemaining {
                fill_qty: quantity,
                remaining_qty: self.remaining_quantity,
            });
        }

        let previous_notional = match self.avg_fill_price {
            Some(avg) => avg.notional(self.filled_quantity),
            None => Some(Decimal::ZERO),
        };
        let filled = self.filled_quantity + quantity;
        let avg = previous_notional
            .zip(price.notional(quantity))
            .and_then(|(previous, fill)| previous.checked_add(fill))
            .and_then(|total| total.checked_div(filled.amount()))
            .map(Price::new)
            .ok_or_else(|| OrderError::invalid("fill_price", "fill notional overflows"))?;
        if self.commission.amount.checked_add(commission.amount).is_none() {
            return Err(OrderError::invalid("commission", "accumulated commission overflows"));
        }

        self.filled_quantity = filled;
        self.remaining_quantity = self.quantity - filled;
        self.avg_fill_price = Some(avg);
        self.commission.accumulate(&commission);
        self.status = if self.remaining_quantity.is_zero() {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };
        self.updated_at = Utc::now();

        self.events
            .push(OrderEvent::PartiallyFilled(OrderPartiallyFilled {
                order_id: self.id.clone(),
                fill_quantity: quantity,
                fill_price: price,
                commission,
                filled_quantity: self.filled_quantity,
                remaining_quantity: self.remaining_quantity,
                avg_fill_price: avg,
                status: self.status,
                occurred_at: self.updated_at,
            }));

        Ok(())
    }

    /// Cancel the order.
    ///
    /// # Errors
    ///
    /// Returns error if the order is already terminal.
    pub fn cancel(&mut self) -> Result<(), OrderError> {
        if !OrderStateMachine::is_valid_transition(self.status, OrderStatus::Canceled) {
            return Err(OrderError::CannotCancel {
                status: self.status,
            });
        }

        self.status = OrderStatus::Canceled;
        self.updated_at = Utc::now();
        self.events.push(OrderEvent::Canceled(OrderCanceled {
            order_id: self.id.clone(),
            filled_quantity: self.filled_quantity,
            occurred_at: self.updated_at,
        }));

        Ok(())
    }

    /// Reject the order, storing the reason.
    ///
    /// # Errors
    ///
    /// Returns error if the order is already terminal.
    pub fn reject(&mut self, reason: impl Into<String>) -> Result<(), OrderError> {
        self.ensure_transition("reject", OrderStatus::Rejected)?;

        let reason = reason.into();
        self.status = OrderStatus::Rejected;
        self.error_message = Some(reason.clone());
        self.updated_at = Utc::now();
        self.events.push(OrderEvent::Rejected(OrderRejected {
            order_id: self.id.clone(),
            reason,
            occurred_at: self.updated_at,
        }));

        Ok(())
    }

    /// Record the id assigned by the exchange.
    ///
    /// # Errors
    ///
    /// Returns error if the id is blank, the order is terminal, or an id is
    /// already assigned.
    pub fn set_exchange_order_id(&mut self, id: ExchangeOrderId) -> Result<(), OrderError> {
        if id.is_blank() {
            return Err(OrderError::invalid(
                "exchange_order_id",
                "exchange order id cannot be empty",
            ));
        }
        if self.status.is_terminal() {
            return Err(OrderError::InvalidStateTransition {
                action: "assign exchange order id to",
                from: self.status,
            });
        }
        if let Some(existing) = &self.exchange_order_id {
            return Err(OrderError::ExchangeOrderIdAlreadyAssigned {
                existing: existing.to_string(),
            });
        }

        self.exchange_order_id = Some(id.clone());
        self.updated_at = Utc::now();
        self.events
            .push(OrderEvent::ExchangeOrderIdAssigned(ExchangeOrderIdAssigned {
                order_id: self.id.clone(),
                exchange_order_id: id,
                occurred_at: self.updated_at,
            }));

        Ok(())
    }

    /// Record processing latency. Legal in any status; records no event.
    ///
    /// Terminal orders keep their `updated_at`.
    pub fn set_latency(&mut self, latency: Duration) {
        self.latency = Some(latency);
        if !self.is_terminal() {
            self.updated_at = Utc::now();
        }
    }

    // ========================================================================
    // Private Helpers
    // ========================================================================

    fn ensure_transition(&self, action: &'static str, target: OrderStatus) -> Result<(), OrderError> {
        if OrderStateMachine::is_valid_transition(self.status, target) {
            Ok(())
        } else {
            Err(OrderError::InvalidStateTransition {
                action,
                from: self.status,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use rust_decimal_macros::dec;

    fn limit_request() -> CreateOrderRequest {
        CreateOrderRequest {
            strategy_id: StrategyId::new("momentum-1"),
            client_order_id: Some(ClientOrderId::new("cl-1")),
            symbol: Symbol::new("BTCUSDT"),
            exchange: ExchangeId::new("binance"),
            side: OrderSide::Buy,
            order_type: OrderType::Limit,
            quantity: Quantity::new(dec!(0.1)),
            price: Price::new(dec!(50000)),
            stop_price: None,
            time_in_force: TimeInForce::Gtc,
            expires_at: None,
        }
    }

    fn confirmed_order() -> Order {
        let mut order = Order::new(limit_request()).unwrap();
        order.confirm().unwrap();
        order
    }

    fn fee(amount: Decimal) -> Commission {
        Commission::new(amount, "USDT")
    }

    #[test]
    fn overflowing_fill_is_refused_without_side_effects() {
        let mut order = Order::new(CreateOrderRequest {
            quantity: Quantity::new(dec!(10)),
            price: Price::new(dec!(100)),
            ..limit_request()
        })
        .unwrap();
        order.confirm().unwrap();
        let before = order.clone();

        let result = order.partial_fill(
            Quantity::new(dec!(10)),
            Price::new(Decimal::MAX / dec!(5)),
            fee(dec!(1)),
        );

        assert!(matches!(
            result,
            Err(OrderError::InvalidParameters { ref field, .. }) if field == "fill_price"
        ));
        assert_eq!(order.status(), OrderStatus::New);
        assert_eq!(order.filled_quantity(), Quantity::ZERO);
        assert_eq!(order.commission(), before.commission());
        assert_eq!(order.events().len(), before.events().len());
    }

    #[test]
    fn overflowing_commission_is_refused() {
        let mut order = confirmed_order();
        order
            .partial_fill(Quantity::new(dec!(0.05)), Price::new(dec!(50000)), fee(Decimal::MAX))
            .unwrap();

        let result =
            order.partial_fill(Quantity::new(dec!(0.05)), Price::new(dec!(50000)), fee(dec!(1)));

        assert!(matches!(
            result,
            Err(OrderError::InvalidParameters { ref field, .. }) if field == "commission"
        ));
        assert_eq!(order.filled_quantity(), Quantity::new(dec!(0.05)));
        assert_eq!(order.status(), OrderStatus::PartiallyFilled);
    }

    #[test]
    fn new_order_is_pending_with_single_created_event() {
        let order = Order::new(limit_request()).unwrap();

        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.filled_quantity(), Quantity::ZERO);
        assert_eq!(order.remaining_quantity(), order.quantity());
        assert!(order.avg_fill_price().is_none());
        assert_eq!(order.events().len(), 1);
        assert!(matches!(order.events()[0], OrderEvent::Created(_)));
        assert_eq!(order.created_at(), order.updated_at());
    }

    #[test]
    fn generated_ids_are_unique() {
        let a = Order::new(limit_request()).unwrap();
        let b = Order::new(limit_request()).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn empty_strategy_is_rejected() {
        let mut req = limit_request();
        req.strategy_id = StrategyId::new("");
        let err = Order::new(req).unwrap_err();
        assert!(err.to_string().contains("strategy ID cannot be empty"));
    }

    #[test]
    fn empty_symbol_is_rejected() {
        let mut req = limit_request();
        req.symbol = Symbol::new("");
        let err = Order::new(req).unwrap_err();
        assert!(err.to_string().contains("symbol"));
    }

    #[test]
    fn empty_exchange_is_rejected() {
        let mut req = limit_request();
        req.exchange = ExchangeId::new(" ");
        assert!(Order::new(req).is_err());
    }

    #[test]
    fn non_positive_quantity_is_rejected() {
        let mut req = limit_request();
        req.quantity = Quantity::ZERO;
        let err = Order::new(req).unwrap_err();
        assert!(err.to_string().contains("quantity"));
    }

    #[test]
    fn limit_order_requires_positive_price() {
        let mut req = limit_request();
        req.price = Price::ZERO;
        assert!(Order::new(req).is_err());
    }

    #[test]
    fn market_order_allows_zero_price() {
        let mut req = limit_request();
        req.order_type = OrderType::Market;
        req.price = Price::ZERO;
        assert!(Order::new(req).is_ok());
    }

    #[test]
    fn stop_orders_require_stop_price() {
        let mut req = limit_request();
        req.order_type = OrderType::Stop;
        req.price = Price::ZERO;
        assert!(Order::new(req.clone()).is_err());

        req.stop_price = Some(Price::new(dec!(48000)));
        assert!(Order::new(req).is_ok());
    }

    #[test]
    fn gtd_requires_future_expiry() {
        let mut req = limit_request();
        req.time_in_force = TimeInForce::Gtd;
        assert!(Order::new(req.clone()).is_err());

        req.expires_at = Some(Utc::now() - ChronoDuration::minutes(1));
        assert!(Order::new(req.clone()).is_err());

        req.expires_at = Some(Utc::now() + ChronoDuration::hours(1));
        assert!(Order::new(req).is_ok());
    }

    #[test]
    fn expiry_on_non_gtd_is_rejected() {
        let mut req = limit_request();
        req.expires_at = Some(Utc::now() + ChronoDuration::hours(1));
        assert!(Order::new(req).is_err());
    }

    #[test]
    fn confirm_only_from_pending() {
        let mut order = confirmed_order();
        assert_eq!(order.status(), OrderStatus::New);
        assert!(order.is_active());

        let err = order.confirm().unwrap_err();
        assert!(err.to_string().contains("cannot confirm order in status NEW"));
    }

    #[test]
    fn fill_before_confirm_fails() {
        let mut order = Order::new(limit_request()).unwrap();
        let err = order
            .partial_fill(Quantity::new(dec!(0.01)), Price::new(dec!(50000)), fee(dec!(0)))
            .unwrap_err();
        assert_eq!(
            err,
            OrderError::CannotFill {
                status: OrderStatus::Pending
            }
        );
    }

    #[test]
    fn fills_compute_weighted_average_and_complete() {
        let mut order = confirmed_order();

        order
            .partial_fill(Quantity::new(dec!(0.05)), Price::new(dec!(50100)), fee(dec!(2.505)))
            .unwrap();
        assert_eq!(order.status(), OrderStatus::PartiallyFilled);
        assert_eq!(order.avg_fill_price(), Some(Price::new(dec!(50100))));

        order
            .partial_fill(Quantity::new(dec!(0.05)), Price::new(dec!(50200)), fee(dec!(2.51)))
            .unwrap();

        assert_eq!(order.status(), OrderStatus::Filled);
        assert!(order.is_filled());
        assert_eq!(order.filled_quantity(), Quantity::new(dec!(0.1)));
        assert!(order.remaining_quantity().is_zero());
        assert_eq!(order.avg_fill_price(), Some(Price::new(dec!(50150))));
        assert_eq!(order.commission().amount, dec!(5.015));
        assert_eq!(order.commission().asset, "USDT");

        let fills: Vec<_> = order
            .events()
            .iter()
            .filter(|e| matches!(e, OrderEvent::PartiallyFilled(_)))
            .collect();
        assert_eq!(fills.len(), 2);
        if let OrderEvent::PartiallyFilled(last) = fills[1] {
            assert_eq!(last.status, OrderStatus::Filled);
            assert!(last.remaining_quantity.is_zero());
        }
    }

    #[test]
    fn overfill_fails_without_side_effects() {
        let mut order = confirmed_order();
        order
            .partial_fill(Quantity::new(dec!(0.05)), Price::new(dec!(50000)), fee(dec!(1)))
            .unwrap();
        let before = order.clone();

        let err = order
            .partial_fill(Quantity::new(dec!(0.06)), Price::new(dec!(50000)), fee(dec!(1)))
            .unwrap_err();

        assert!(matches!(err, OrderError::FillExceedsRemaining { .. }));
        assert_eq!(order.filled_quantity(), before.filled_quantity());
        assert_eq!(order.remaining_quantity(), before.remaining_quantity());
        assert_eq!(order.avg_fill_price(), before.avg_fill_price());
        assert_eq!(order.commission(), before.commission());
        assert_eq!(order.events().len(), before.events().len());
        assert_eq!(order.updated_at(), before.updated_at());
    }

    #[test]
    fn non_positive_fill_is_rejected() {
        let mut order = confirmed_order();
        assert!(
            order
                .partial_fill(Quantity::ZERO, Price::new(dec!(1)), fee(dec!(0)))
                .is_err()
        );
        assert!(
            order
                .partial_fill(Quantity::new(dec!(0.01)), Price::ZERO, fee(dec!(0)))
                .is_err()
        );
    }

    #[test]
    fn cancel_from_pending_new_and_partial() {
        let mut pending = Order::new(limit_request()).unwrap();
        pending.cancel().unwrap();
        assert!(pending.is_canceled());

        let mut partial = confirmed_order();
        partial
            .partial_fill(Quantity::new(dec!(0.02)), Price::new(dec!(50000)), fee(dec!(1)))
            .unwrap();
        partial.cancel().unwrap();
        assert!(partial.is_canceled());
        assert_eq!(partial.filled_quantity(), Quantity::new(dec!(0.02)));
    }

    #[test]
    fn cancel_fails_from_terminal_states() {
        let mut filled = confirmed_order();
        filled
            .partial_fill(Quantity::new(dec!(0.1)), Price::new(dec!(50000)), fee(dec!(5)))
            .unwrap();
        let err = filled.cancel().unwrap_err();
        assert!(err.to_string().contains("cannot cancel order in status FILLED"));

        let mut canceled = confirmed_order();
        canceled.cancel().unwrap();
        assert!(canceled.cancel().is_err());

        let mut rejected = confirmed_order();
        rejected.reject("risk").unwrap();
        assert!(rejected.cancel().is_err());
    }

    #[test]
    fn reject_stores_reason_from_any_live_state() {
        let mut pending = Order::new(limit_request()).unwrap();
        pending.reject("max order size exceeded").unwrap();
        assert!(pending.is_rejected());
        assert_eq!(pending.error_message(), Some("max order size exceeded"));
        match pending.events().last() {
            Some(OrderEvent::Rejected(e)) => assert_eq!(e.reason, "max order size exceeded"),
            other => panic!("unexpected event {other:?}"),
        }

        let mut partial = confirmed_order();
        partial
            .partial_fill(Quantity::new(dec!(0.01)), Price::new(dec!(50000)), fee(dec!(0)))
            .unwrap();
        assert!(partial.reject("exchange halt").is_ok());
    }

    #[test]
    fn reject_fails_when_terminal() {
        let mut order = confirmed_order();
        order.cancel().unwrap();
        assert!(order.reject("late").is_err());
        assert!(order.error_message().is_none());
    }

    #[test]
    fn exchange_order_id_is_set_once() {
        let mut order = Order::new(limit_request()).unwrap();
        order
            .set_exchange_order_id(ExchangeOrderId::new("ex-1"))
            .unwrap();
        assert_eq!(order.exchange_order_id().unwrap().as_str(), "ex-1");
        assert!(matches!(
            order.events().last(),
            Some(OrderEvent::ExchangeOrderIdAssigned(_))
        ));

        let err = order
            .set_exchange_order_id(ExchangeOrderId::new("ex-2"))
            .unwrap_err();
        assert!(matches!(
            err,
            OrderError::ExchangeOrderIdAlreadyAssigned { .. }
        ));
    }

    #[test]
    fn exchange_order_id_rejected_on_terminal_order() {
        let mut order = Order::new(limit_request()).unwrap();
        order.reject("blocked").unwrap();
        assert!(
            order
                .set_exchange_order_id(ExchangeOrderId::new("ex-1"))
                .is_err()
        );
    }

    #[test]
    fn set_latency_records_no_event() {
        let mut order = confirmed_order();
        order.cancel().unwrap();
        let events = order.events().len();
        let updated_at = order.updated_at();

        order.set_latency(Duration::from_micros(850));

        assert_eq!(order.latency(), Some(Duration::from_micros(850)));
        assert_eq!(order.events().len(), events);
        assert_eq!(order.updated_at(), updated_at);
    }

    #[test]
    fn set_latency_touches_live_order() {
        let mut order = confirmed_order();
        let updated_at = order.updated_at();
        std::thread::sleep(std::time::Duration::from_millis(2));

        order.set_latency(Duration::from_micros(850));

        assert!(order.updated_at() > updated_at);
    }

    #[test]
    fn order_serializes_to_json() {
        let order = confirmed_order();
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["status"], "NEW");
        assert_eq!(json["symbol"], "BTCUSDT");
        assert_eq!(json["quantity"], "0.1");
    }
}
