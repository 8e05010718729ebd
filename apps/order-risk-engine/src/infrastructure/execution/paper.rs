//! Paper execution adapter implementing ExecutionPort.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::application::ports::{ExecutionAck, ExecutionError, ExecutionPort};
use crate::domain::order_execution::aggregate::Order;
use crate::domain::shared::{ExchangeOrderId, Symbol};

/// Paper execution configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaperExecutionConfig {
    /// Simulated venue round trip.
    pub ack_delay: Duration,
    /// Prefix of generated exchange order ids.
    pub id_prefix: String,
}

impl Default for PaperExecutionConfig {
    fn default() -> Self {
        Self {
            ack_delay: Duration::ZERO,
            id_prefix: "PAPER".to_string(),
        }
    }
}

/// Acknowledges every order locally without touching a venue.
///
/// Symbols can be marked as rejected to exercise failure paths.
#[derive(Debug, Default)]
pub struct PaperExecutionAdapter {
    config: PaperExecutionConfig,
    sequence: AtomicU64,
    rejected_symbols: RwLock<HashSet<Symbol>>,
}

impl PaperExecutionAdapter {
    /// Create a new paper adapter.
    #[must_use]
    pub fn new(config: PaperExecutionConfig) -> Self {
        Self {
            config,
            sequence: AtomicU64::new(0),
            rejected_symbols: RwLock::new(HashSet::new()),
        }
    }

    /// Reject every order for `symbol`.
    pub fn reject_symbol(&self, symbol: Symbol) {
        self.rejected_symbols.write().insert(symbol);
    }

    /// Orders acknowledged so far.
    #[must_use]
    pub fn submitted(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExecutionPort for PaperExecutionAdapter {
    async fn submit(&self, order: &Order) -> Result<ExecutionAck, ExecutionError> {
        let started = Instant::now();

        if self.rejected_symbols.read().contains(order.symbol()) {
            return Err(ExecutionError::Rejected {
                reason: format!("symbol {} not tradable", order.symbol()),
            });
        }

        if !self.config.ack_delay.is_zero() {
            tokio::time::sleep(self.config.ack_delay).await;
        }

        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let exchange_order_id =
            ExchangeOrderId::new(format!("{}-{sequence}", self.config.id_prefix));

        tracing::debug!(
            order_id = %order.id(),
            exchange_order_id = %exchange_order_id,
            "Paper order acknowledged"
        );

        Ok(ExecutionAck {
            exchange_order_id,
            latency: started.elapsed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order_execution::aggregate::CreateOrderRequest;
    use crate::domain::order_execution::value_objects::{OrderSide, OrderType, TimeInForce};
    use crate::domain::shared::{ExchangeId, Price, Quantity, StrategyId};
    use rust_decimal_macros::dec;

    fn order(symbol: &str) -> Order {
        Order::new(CreateOrderRequest {
            strategy_id: StrategyId::new("s1"),
            client_order_id: None,
            symbol: Symbol::new(symbol),
            exchange: ExchangeId::new("paper"),
            side: OrderSide::Sell,
            order_type: OrderType::Limit,
            quantity: Quantity::new(dec!(1)),
            price: Price::new(dec!(10)),
            stop_price: None,
            time_in_force: TimeInForce::Gtc,
            expires_at: None,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn acknowledges_with_sequential_ids() {
        let adapter = PaperExecutionAdapter::new(PaperExecutionConfig::default());

        let first = adapter.submit(&order("BTCUSDT")).await.unwrap();
        let second = adapter.submit(&order("BTCUSDT")).await.unwrap();

        assert_eq!(first.exchange_order_id.as_str(), "PAPER-1");
        assert_eq!(second.exchange_order_id.as_str(), "PAPER-2");
        assert_eq!(adapter.submitted(), 2);
    }

    #[tokio::test]
    async fn rejected_symbol_fails() {
        let adapter = PaperExecutionAdapter::default();
        adapter.reject_symbol(Symbol::new("DOGEUSDT"));

        let err = adapter.submit(&order("DOGEUSDT")).await.unwrap_err();
        assert!(matches!(err, ExecutionError::Rejected { .. }));
        assert_eq!(adapter.submitted(), 0);
    }
}
