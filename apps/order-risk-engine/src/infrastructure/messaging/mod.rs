//! Messaging Adapters
//!
//! Implementations of `RiskEventSink`.

pub mod risk_event_sink;

pub use risk_event_sink::{InMemoryRiskEventSink, LoggingRiskEventSink};
