//! Background tasks of the risk service.
//!
//! Three tasks run between `start` and `stop`: the event processor drains
//! the event channel into the sink, and two monitors re-check exposure and
//! drawdown of every tracked strategy on their own interval.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::Inner;
use crate::application::ports::RiskEventSink;
use crate::domain::risk_management::{RiskAction, RiskEvent};

/// Which aggregate a monitor re-checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum MonitorKind {
    Exposure,
    Drawdown,
}

impl MonitorKind {
    const fn name(self) -> &'static str {
        match self {
            Self::Exposure => "exposure",
            Self::Drawdown => "drawdown",
        }
    }
}

/// Spawn the event processor. The task hands the receiver back on exit so
/// the service can be started again.
///
/// A sink write in flight when shutdown is requested is abandoned; the event
/// stays in the service's event map.
pub(super) fn spawn_event_processor(
    inner: Arc<Inner>,
    mut events: mpsc::Receiver<RiskEvent>,
    shutdown: CancellationToken,
) -> JoinHandle<mpsc::Receiver<RiskEvent>> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                received = events.recv() => {
                    let Some(event) = received else {
                        tracing::info!("Risk event channel closed");
                        break;
                    };
                    tokio::select! {
                        () = process_event(inner.sink.as_ref(), &event) => {}
                        () = shutdown.cancelled() => {
                            tracing::warn!(
                                event_id = %event.id,
                                "Risk event processor shutting down with a sink write in flight"
                            );
                            break;
                        }
                    }
                }
                () = shutdown.cancelled() => {
                    tracing::info!("Risk event processor shutting down");
                    break;
                }
            }
        }
        events
    })
}

/// Spawn a monitor that re-checks every tracked strategy each `period`.
pub(super) fn spawn_monitor(
    inner: Arc<Inner>,
    kind: MonitorKind,
    period: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        // First pass after one full period, not at start.
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => run_monitor_pass(&inner, kind),
                () = shutdown.cancelled() => {
                    tracing::info!(monitor = kind.name(), "Risk monitor shutting down");
                    break;
                }
            }
        }
    })
}

fn run_monitor_pass(inner: &Inner, kind: MonitorKind) {
    let strategies = inner.monitored_strategies();
    let mut breaches = 0_usize;

    for strategy_id in &strategies {
        let result = match kind {
            MonitorKind::Exposure => inner.check_exposure(strategy_id),
            MonitorKind::Drawdown => inner.check_drawdown(strategy_id),
        };
        if result.is_err() {
            breaches += 1;
        }
    }

    tracing::debug!(
        monitor = kind.name(),
        strategies = strategies.len(),
        breaches,
        "Risk monitor pass complete"
    );
}

async fn process_event(sink: &dyn RiskEventSink, event: &RiskEvent) {
    if let Err(e) = sink.persist(event).await {
        tracing::warn!(
            event_id = %event.id,
            error = %e,
            "Failed to persist risk event"
        );
    }
    handle_action(event);
}

/// Follow-up for each action. Order blocks already happened synchronously.
fn handle_action(event: &RiskEvent) {
    match event.action {
        RiskAction::StopStrategy => {
            tracing::error!(
                strategy_id = %event.strategy_id,
                event_id = %event.id,
                description = %event.description,
                "Risk action: stop strategy"
            );
        }
        RiskAction::ReduceExposure => {
            tracing::warn!(
                strategy_id = %event.strategy_id,
                event_id = %event.id,
                description = %event.description,
                "Risk action: reduce exposure"
            );
        }
        RiskAction::MonitorPosition => {
            tracing::info!(
                strategy_id = %event.strategy_id,
                event_id = %event.id,
                symbol = ?event.symbol,
                "Risk action: monitor position"
            );
        }
        RiskAction::BlockOrder => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::RiskEventSinkError;
    use crate::domain::risk_management::{RiskEventType, RiskSeverity};
    use crate::domain::shared::StrategyId;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FailingSink {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RiskEventSink for FailingSink {
        async fn persist(&self, _event: &RiskEvent) -> Result<(), RiskEventSinkError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(RiskEventSinkError::PersistFailed {
                message: "disk full".to_string(),
            })
        }
    }

    fn event(action: RiskAction) -> RiskEvent {
        RiskEvent::new(
            RiskEventType::DrawdownLimit,
            RiskSeverity::Critical,
            StrategyId::new("s1"),
            "drawdown 7% exceeds maximum 5%",
            action,
        )
    }

    #[test]
    fn monitor_names() {
        assert_eq!(MonitorKind::Exposure.name(), "exposure");
        assert_eq!(MonitorKind::Drawdown.name(), "drawdown");
    }

    #[test]
    fn every_action_is_handled() {
        for action in [
            RiskAction::BlockOrder,
            RiskAction::ReduceExposure,
            RiskAction::StopStrategy,
            RiskAction::MonitorPosition,
        ] {
            handle_action(&event(action));
        }
    }

    #[tokio::test]
    async fn sink_failure_does_not_stop_processing() {
        let sink = FailingSink::default();

        process_event(&sink, &event(RiskAction::StopStrategy)).await;
        process_event(&sink, &event(RiskAction::ReduceExposure)).await;

        assert_eq!(sink.calls.load(Ordering::SeqCst), 2);
    }
}
