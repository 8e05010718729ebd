//! Domain events for the order lifecycle.
//!
//! Every state-changing operation on an [`Order`](super::Order) appends one
//! event; the log is never rewritten.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::value_objects::{OrderSide, OrderStatus, OrderType};
use crate::domain::shared::{
    Commission, ExchangeOrderId, OrderId, Price, Quantity, StrategyId, Symbol,
};

/// All possible order events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderEvent {
    /// Order created locally.
    Created(OrderCreated),
    /// Order acknowledged by the exchange.
    Confirmed(OrderConfirmed),
    /// Fill applied (recorded for the final fill as well).
    PartiallyFilled(OrderPartiallyFilled),
    /// Order canceled.
    Canceled(OrderCanceled),
    /// Order rejected.
    Rejected(OrderRejected),
    /// Exchange order id recorded.
    ExchangeOrderIdAssigned(ExchangeOrderIdAssigned),
}

impl OrderEvent {
    /// Get the order ID for this event.
    #[must_use]
    pub const fn order_id(&self) -> &OrderId {
        match self {
            Self::Created(e) => &e.order_id,
            Self::Confirmed(e) => &e.order_id,
            Self::PartiallyFilled(e) => &e.order_id,
            Self::Canceled(e) => &e.order_id,
            Self::Rejected(e) => &e.order_id,
            Self::ExchangeOrderIdAssigned(e) => &e.order_id,
        }
    }

    /// Get the timestamp when this event occurred.
    #[must_use]
    pub const fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            Self::Created(e) => e.occurred_at,
            Self::Confirmed(e) => e.occurred_at,
            Self::PartiallyFilled(e) => e.occurred_at,
            Self::Canceled(e) => e.occurred_at,
            Self::Rejected(e) => e.occurred_at,
            Self::ExchangeOrderIdAssigned(e) => e.occurred_at,
        }
    }

    /// Get the event type name.
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::Created(_) => "ORDER_CREATED",
            Self::Confirmed(_) => "ORDER_CONFIRMED",
            Self::PartiallyFilled(_) => "ORDER_PARTIALLY_FILLED",
            Self::Canceled(_) => "ORDER_CANCELED",
            Self::Rejected(_) => "ORDER_REJECTED",
            Self::ExchangeOrderIdAssigned(_) => "EXCHANGE_ORDER_ID_ASSIGNED",
        }
    }
}

/// Event: order created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCreated {
    /// Order ID.
    pub order_id: OrderId,
    /// Owning strategy.
    pub strategy_id: StrategyId,
    /// Symbol.
    pub symbol: Symbol,
    /// Side.
    pub side: OrderSide,
    /// Order type.
    pub order_type: OrderType,
    /// Quantity.
    pub quantity: Quantity,
    /// Limit price (zero for market/stop orders).
    pub price: Price,
    /// When the event occurred.
    pub occurred_at: DateTime<Utc>,
}

/// Event: order acknowledged by the exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderConfirmed {
    /// Order ID.
    pub order_id: OrderId,
    /// When the event occurred.
    pub occurred_at: DateTime<Utc>,
}

/// Event: fill applied, carrying the post-fill snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPartiallyFilled {
    /// Order ID.
    pub order_id: OrderId,
    /// Quantity of this execution.
    pub fill_quantity: Quantity,
    /// Price of this execution.
    pub fill_price: Price,
    /// Commission charged for this execution.
    pub commission: Commission,
    /// Cumulative quantity filled.
    pub filled_quantity: Quantity,
    /// Quantity still working.
    pub remaining_quantity: Quantity,
    /// Quantity-weighted average fill price.
    pub avg_fill_price: Price,
    /// Status after the fill.
    pub status: OrderStatus,
    /// When the event occurred.
    pub occurred_at: DateTime<Utc>,
}

/// Event: order canceled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCanceled {
    /// Order ID.
    pub order_id: OrderId,
    /// Quantity filled before cancellation.
    pub filled_quantity: Quantity,
    /// When the event occurred.
    pub occurred_at: DateTime<Utc>,
}

/// Event: order rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRejected {
    /// Order ID.
    pub order_id: OrderId,
    /// Rejection reason.
    pub reason: String,
    /// When the event occurred.
    pub occurred_at: DateTime<Utc>,
}

/// Event: exchange order id recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeOrderIdAssigned {
    /// Order ID.
    pub order_id: OrderId,
    /// Id assigned by the exchange.
    pub exchange_order_id: ExchangeOrderId,
    /// When the event occurred.
    pub occurred_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_accessors() {
        let now = Utc::now();
        let event = OrderEvent::Rejected(OrderRejected {
            order_id: OrderId::new("ord-1"),
            reason: "insufficient margin".to_string(),
            occurred_at: now,
        });
        assert_eq!(event.order_id().as_str(), "ord-1");
        assert_eq!(event.occurred_at(), now);
        assert_eq!(event.event_type(), "ORDER_REJECTED");
    }

    #[test]
    fn serialization_is_tagged() {
        let event = OrderEvent::Confirmed(OrderConfirmed {
            order_id: OrderId::new("ord-1"),
            occurred_at: Utc::now(),
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "CONFIRMED");
        assert_eq!(json["order_id"], "ord-1");
    }
}
