//! Application Ports (Driven)
//!
//! Interfaces the application uses to reach external systems.

mod execution_port;
mod risk_event_sink_port;

pub use execution_port::{ExecutionAck, ExecutionError, ExecutionPort};
pub use risk_event_sink_port::{NoOpRiskEventSink, RiskEventSink, RiskEventSinkError};
