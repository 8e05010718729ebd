//! Order Execution Domain Services
//!
//! Stateless business logic that doesn't fit in aggregates.

mod order_service;
mod order_state_machine;

pub use order_service::{OrderRiskValidator, OrderService, OrderServiceError};
pub use order_state_machine::OrderStateMachine;
