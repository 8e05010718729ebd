// Allow unwrap/expect in tests - tests should panic on unexpected errors
// Allow test-specific patterns and pedantic lints in test code
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::needless_collect,
        clippy::option_if_let_else,
        clippy::default_trait_access,
        clippy::items_after_statements,
        clippy::or_fun_call
    )
)]

//! Order Risk Engine - Rust Core Library
//!
//! Pre-trade risk validation and order lifecycle core for a high-frequency
//! trading system. Every order passes the risk checks before it can reach an
//! exchange; background monitors re-check exposure and drawdown.
//!
//! # Architecture (Clean Architecture + DDD + Hexagonal)
//!
//! ## Layers (inside → outside)
//!
//! - **Domain**: Core business logic (aggregates, value objects, domain events)
//!   - `order_execution`: Order aggregate, state machine, order service
//!   - `risk_management`: Risk limits, risk checker, risk events, provider ports
//!
//! - **Application**: Services, use cases and orchestration
//!   - `ports`: Interfaces for external systems (`ExecutionPort`, `RiskEventSink`)
//!   - `services`: `RiskService` with its event processor and monitors
//!   - `use_cases`: `PlaceOrder`
//!   - `dto`: Data transfer objects for API boundaries
//!
//! - **Infrastructure**: Adapters (implementations)
//!   - `persistence`: In-memory risk data store
//!   - `execution`: Paper execution adapter
//!   - `messaging`: Risk event sinks
//!
//! Cross-cutting: `config` (YAML + env interpolation) and `observability`
//! (tracing subscriber, Prometheus metrics).

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Clean Architecture Layers
// =============================================================================

/// Domain layer - Core business logic with no external dependencies.
pub mod domain;

/// Application layer - Services, use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

/// Configuration loading and validation.
pub mod config;

/// Tracing and metrics.
pub mod observability;

// =============================================================================
// Re-exports from Clean Architecture
// =============================================================================

// Domain re-exports
pub use domain::order_execution::{
    CommissionSchedule, CreateOrderRequest, Order, OrderError, OrderService, OrderServiceError,
    OrderSide, OrderStatus, OrderType, TimeInForce,
};
pub use domain::risk_management::{
    Position, RiskChecker, RiskDataSources, RiskEvent, RiskLimits, RiskViolation, ViolationKind,
};
pub use domain::shared::{
    Commission, ExchangeId, OrderId, Price, Quantity, RiskEventId, StrategyId, Symbol,
};

// Application re-exports
pub use application::dto::{OrderDto, PlaceOrderCommand, RiskEventDto};
pub use application::ports::{ExecutionPort, NoOpRiskEventSink, RiskEventSink};
pub use application::services::{RiskMetrics, RiskService, RiskServiceConfig, RiskServiceError};
pub use application::use_cases::{PlaceOrderError, PlaceOrderResult, PlaceOrderUseCase};

// Infrastructure re-exports
pub use infrastructure::execution::PaperExecutionAdapter;
pub use infrastructure::messaging::{InMemoryRiskEventSink, LoggingRiskEventSink};
pub use infrastructure::persistence::InMemoryRiskStore;
