//! Order Execution Bounded Context
//!
//! Manages the order lifecycle from creation to a terminal state.
//!
//! # Key Concepts
//!
//! - **Order Aggregate**: Owns its state machine and append-only event log
//! - **Fill Accounting**: `quantity = filled_quantity + remaining_quantity`
//! - **Order Service**: Validates requests and prices orders for the caller

pub mod aggregate;
pub mod errors;
pub mod events;
pub mod services;
pub mod value_objects;

pub use aggregate::{CreateOrderRequest, Order};
pub use errors::OrderError;
pub use events::{
    ExchangeOrderIdAssigned, OrderCanceled, OrderConfirmed, OrderCreated, OrderEvent,
    OrderPartiallyFilled, OrderRejected,
};
pub use services::{OrderRiskValidator, OrderService, OrderServiceError, OrderStateMachine};
pub use value_objects::{CommissionSchedule, OrderSide, OrderStatus, OrderType, TimeInForce};
