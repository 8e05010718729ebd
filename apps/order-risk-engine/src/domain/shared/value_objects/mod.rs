//! Shared Value Objects
//!
//! Immutable domain types used across bounded contexts.
//! Value objects are compared by value, not identity.

mod commission;
mod identifiers;
mod price;
mod quantity;
mod symbol;

pub use commission::Commission;
pub use identifiers::{
    ClientOrderId, ExchangeId, ExchangeOrderId, OrderId, RiskEventId, StrategyId,
};
pub use price::Price;
pub use quantity::Quantity;
pub use symbol::Symbol;
