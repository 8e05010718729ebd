//! Execution Port (Driven Port)
//!
//! Hands a risk-approved order to the venue connectivity layer.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::order_execution::aggregate::Order;
use crate::domain::shared::ExchangeOrderId;

/// Acknowledgment returned by the venue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionAck {
    /// Id assigned by the exchange.
    pub exchange_order_id: ExchangeOrderId,
    /// Round-trip time to the acknowledgment.
    pub latency: Duration,
}

/// Execution errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExecutionError {
    /// Venue refused the order.
    #[error("Order rejected by exchange: {reason}")]
    Rejected {
        /// Exchange's reason.
        reason: String,
    },

    /// Venue unreachable.
    #[error("Exchange connection error: {message}")]
    ConnectionError {
        /// Error message.
        message: String,
    },

    /// No acknowledgment in time.
    #[error("Exchange acknowledgment timed out after {0:?}")]
    Timeout(Duration),
}

/// Port for submitting orders to an exchange.
#[async_trait]
pub trait ExecutionPort: Send + Sync {
    /// Submit an order and wait for the exchange acknowledgment.
    async fn submit(&self, order: &Order) -> Result<ExecutionAck, ExecutionError>;
}
