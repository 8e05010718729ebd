//! Order DTOs

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::order_execution::aggregate::{CreateOrderRequest, Order};
use crate::domain::order_execution::errors::OrderError;
use crate::domain::order_execution::value_objects::{OrderSide, OrderType, TimeInForce};
use crate::domain::shared::{ClientOrderId, ExchangeId, Price, Quantity, StrategyId, Symbol};

/// Command for placing an order, as received from an external caller.
///
/// Decimals are strings so no precision is lost in transport; enums accept
/// any casing (`"buy"`, `"LIMIT"`, `"gtc"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceOrderCommand {
    /// Strategy placing the order.
    pub strategy_id: String,
    /// Caller-assigned id.
    #[serde(default)]
    pub client_order_id: Option<String>,
    /// Trading pair.
    pub symbol: String,
    /// Target exchange.
    pub exchange: String,
    /// Side.
    pub side: String,
    /// Type.
    pub order_type: String,
    /// Quantity.
    pub quantity: String,
    /// Limit price; omitted for market and stop orders.
    #[serde(default)]
    pub price: Option<String>,
    /// Stop trigger price.
    #[serde(default)]
    pub stop_price: Option<String>,
    /// Time in force, GTC when omitted.
    #[serde(default)]
    pub time_in_force: Option<String>,
    /// RFC 3339 expiry, for GTD orders.
    #[serde(default)]
    pub expires_at: Option<String>,
}

impl PlaceOrderCommand {
    /// Parse into a domain creation request.
    ///
    /// Only parses; domain rules are checked when the order is created.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::InvalidParameters` naming the first malformed field.
    pub fn to_request(&self) -> Result<CreateOrderRequest, OrderError> {
        let time_in_force = match &self.time_in_force {
            Some(tif) => TimeInForce::from_str(tif)?,
            None => TimeInForce::default(),
        };
        let price = match &self.price {
            Some(price) => Price::new(parse_decimal("price", price)?),
            None => Price::ZERO,
        };
        let stop_price = self
            .stop_price
            .as_deref()
            .map(|stop| parse_decimal("stop_price", stop).map(Price::new))
            .transpose()?;
        let expires_at = self
            .expires_at
            .as_deref()
            .map(parse_timestamp)
            .transpose()?;

        Ok(CreateOrderRequest {
            strategy_id: StrategyId::new(self.strategy_id.trim()),
            client_order_id: self
                .client_order_id
                .as_deref()
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(ClientOrderId::new),
            symbol: Symbol::new(self.symbol.as_str()),
            exchange: ExchangeId::new(self.exchange.trim()),
            side: OrderSide::from_str(&self.side)?,
            order_type: OrderType::from_str(&self.order_type)?,
            quantity: Quantity::new(parse_decimal("quantity", &self.quantity)?),
            price,
            stop_price,
            time_in_force,
            expires_at,
        })
    }
}

fn parse_decimal(field: &str, value: &str) -> Result<Decimal, OrderError> {
    Decimal::from_str(value.trim())
        .map_err(|e| OrderError::invalid(field, format!("'{value}' is not a decimal: {e}")))
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, OrderError> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| OrderError::invalid("expires_at", format!("'{value}' is not RFC 3339: {e}")))
}

/// DTO representing an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDto {
    /// Order ID.
    pub order_id: String,
    /// Client order ID.
    pub client_order_id: Option<String>,
    /// Strategy ID.
    pub strategy_id: String,
    /// Symbol.
    pub symbol: String,
    /// Exchange.
    pub exchange: String,
    /// Exchange order ID.
    pub exchange_order_id: Option<String>,
    /// Side.
    pub side: String,
    /// Type.
    pub order_type: String,
    /// Status.
    pub status: String,
    /// Time in force.
    pub time_in_force: String,
    /// Quantity.
    pub quantity: String,
    /// Limit price.
    pub price: String,
    /// Stop price.
    pub stop_price: Option<String>,
    /// Filled quantity.
    pub filled_quantity: String,
    /// Remaining quantity.
    pub remaining_quantity: String,
    /// Average fill price.
    pub avg_fill_price: Option<String>,
    /// Accumulated commission.
    pub commission: String,
    /// Commission asset.
    pub commission_asset: String,
    /// Rejection reason.
    pub error_message: Option<String>,
    /// Submission latency in microseconds.
    pub latency_us: Option<u64>,
    /// Created at.
    pub created_at: DateTime<Utc>,
    /// Updated at.
    pub updated_at: DateTime<Utc>,
    /// Expiry.
    pub expires_at: Option<DateTime<Utc>>,
}

impl OrderDto {
    /// Create from domain Order.
    #[must_use]
    pub fn from_order(order: &Order) -> Self {
        Self {
            order_id: order.id().to_string(),
            client_order_id: order.client_order_id().map(|id| id.to_string()),
            strategy_id: order.strategy_id().to_string(),
            symbol: order.symbol().to_string(),
            exchange: order.exchange().to_string(),
            exchange_order_id: order.exchange_order_id().map(|id| id.to_string()),
            side: order.side().to_string(),
            order_type: order.order_type().to_string(),
            status: order.status().to_string(),
            time_in_force: order.time_in_force().to_string(),
            quantity: order.quantity().to_string(),
            price: order.price().to_string(),
            stop_price: order.stop_price().map(|p| p.to_string()),
            filled_quantity: order.filled_quantity().to_string(),
            remaining_quantity: order.remaining_quantity().to_string(),
            avg_fill_price: order.avg_fill_price().map(|p| p.to_string()),
            commission: order.commission().amount.normalize().to_string(),
            commission_asset: order.commission().asset.clone(),
            error_message: order.error_message().map(str::to_string),
            latency_us: order
                .latency()
                .map(|l| u64::try_from(l.as_micros()).unwrap_or(u64::MAX)),
            created_at: order.created_at(),
            updated_at: order.updated_at(),
            expires_at: order.expires_at(),
        }
    }
}
