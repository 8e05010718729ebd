//! Domain Layer
//!
//! The innermost layer containing business logic with no transport or
//! storage dependencies. This layer defines:
//!
//! - **Aggregates**: Consistency boundaries with invariants
//! - **Value Objects**: Immutable domain types with equality by value
//! - **Domain Events**: Records of state transitions
//! - **Domain Services**: Stateless business logic
//! - **Provider Traits**: Data-source abstractions (implemented in adapters)
//!
//! # Bounded Contexts
//!
//! - [`order_execution`]: Order lifecycle, order service, commission
//! - [`risk_management`]: Risk limits, rule evaluation, risk events

pub mod order_execution;
pub mod risk_management;
pub mod shared;
