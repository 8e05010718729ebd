//! Risk Service
//!
//! Stateful wrapper around the [`RiskChecker`]: counts checks, keeps the
//! latest exposure and drawdown per strategy, turns violations into
//! [`RiskEvent`]s and runs the background monitors.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────┐   validate_*   ┌──────────────┐
//! │    callers     │───────────────▶│ RiskService  │──▶ RiskChecker
//! └────────────────┘                └──────┬───────┘
//!                                 try_send │ (drop on full)
//!                         ┌────────────────┼──────────────────┐
//!                         ▼                                   ▼
//!                 ┌───────────────┐                 ┌──────────────────┐
//!                 │ event channel │                 │ violation channel│
//!                 └───────┬───────┘                 │  (high/critical) │
//!                         ▼                         └──────────────────┘
//!                 ┌───────────────┐
//!                 │ event processor│──▶ RiskEventSink + action handler
//!                 └───────────────┘
//! ```
//!
//! Validation never waits on the background tasks. Shared state sits behind
//! one `parking_lot::RwLock` that is never held across an `.await`.

mod monitors;
mod state;

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::application::ports::RiskEventSink;
use crate::domain::order_execution::{Order, OrderRiskValidator};
use crate::domain::risk_management::{
    Position, RiskAction, RiskChecker, RiskEvent, RiskEventType, RiskSeverity, RiskViolation,
    StrategyDirectory, ViolationKind,
};
use crate::domain::shared::{RiskEventId, StrategyId};
use crate::observability;

use self::monitors::MonitorKind;
use self::state::RiskState;
pub use self::state::RiskMetrics;

// ============================================================================
// Configuration
// ============================================================================

/// Risk service configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskServiceConfig {
    /// Capacity of the event channel.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
    /// Capacity of the high/critical violation channel.
    #[serde(default = "default_violation_buffer")]
    pub violation_buffer: usize,
    /// Exposure monitor period in milliseconds.
    #[serde(default = "default_exposure_interval_ms")]
    pub exposure_check_interval_ms: u64,
    /// Drawdown monitor period in milliseconds.
    #[serde(default = "default_drawdown_interval_ms")]
    pub drawdown_check_interval_ms: u64,
    /// Events kept in memory. Over this, the oldest resolved event is
    /// evicted first.
    #[serde(default = "default_event_retention")]
    pub event_retention: usize,
}

const fn default_event_buffer() -> usize {
    1000
}

const fn default_violation_buffer() -> usize {
    100
}

const fn default_exposure_interval_ms() -> u64 {
    5_000
}

const fn default_drawdown_interval_ms() -> u64 {
    10_000
}

const fn default_event_retention() -> usize {
    state::DEFAULT_EVENT_RETENTION
}

impl Default for RiskServiceConfig {
    fn default() -> Self {
        Self {
            event_buffer: default_event_buffer(),
            violation_buffer: default_violation_buffer(),
            exposure_check_interval_ms: default_exposure_interval_ms(),
            drawdown_check_interval_ms: default_drawdown_interval_ms(),
            event_retention: default_event_retention(),
        }
    }
}

impl RiskServiceConfig {
    /// Exposure monitor period, at least one millisecond.
    #[must_use]
    pub fn exposure_check_interval(&self) -> Duration {
        Duration::from_millis(self.exposure_check_interval_ms.max(1))
    }

    /// Drawdown monitor period, at least one millisecond.
    #[must_use]
    pub fn drawdown_check_interval(&self) -> Duration {
        Duration::from_millis(self.drawdown_check_interval_ms.max(1))
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Risk service errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RiskServiceError {
    /// The order failed pre-trade validation.
    #[error("order blocked by risk management: {0}")]
    OrderBlocked(RiskViolation),

    /// A position or strategy aggregate is over its limit.
    #[error("risk limit breached: {0}")]
    LimitBreached(RiskViolation),

    /// `start` was called while the background tasks are running.
    #[error("risk service already running")]
    AlreadyRunning,

    /// The event receiver was lost when the processor task failed.
    #[error("risk event stream unavailable, service cannot be restarted")]
    EventStreamUnavailable,

    /// No event with this id.
    #[error("unknown risk event: {0}")]
    UnknownEvent(RiskEventId),
}

impl RiskServiceError {
    /// The violation behind this error, if any.
    #[must_use]
    pub const fn violation(&self) -> Option<&RiskViolation> {
        match self {
            Self::OrderBlocked(v) | Self::LimitBreached(v) => Some(v),
            _ => None,
        }
    }

    /// True if an order was refused.
    #[must_use]
    pub const fn is_order_blocked(&self) -> bool {
        matches!(self, Self::OrderBlocked(_))
    }
}

// ============================================================================
// Service
// ============================================================================

/// Running background tasks.
struct Runtime {
    shutdown: CancellationToken,
    processor: JoinHandle<mpsc::Receiver<RiskEvent>>,
    monitors: Vec<JoinHandle<()>>,
}

struct Inner {
    checker: RiskChecker,
    config: RiskServiceConfig,
    state: RwLock<RiskState>,
    event_tx: mpsc::Sender<RiskEvent>,
    event_rx: Mutex<Option<mpsc::Receiver<RiskEvent>>>,
    violation_tx: mpsc::Sender<RiskEvent>,
    violation_rx: Mutex<Option<mpsc::Receiver<RiskEvent>>>,
    sink: Arc<dyn RiskEventSink>,
    strategies: Option<Arc<dyn StrategyDirectory>>,
    runtime: Mutex<Option<Runtime>>,
}

/// Outcome of queueing one event.
struct Delivery {
    queued: bool,
    alerted: Option<bool>,
    tracked: usize,
    evicted: Option<RiskEvent>,
}

/// Risk service.
///
/// Cheap to clone; clones share state and background tasks.
#[derive(Clone)]
pub struct RiskService {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for RiskService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RiskService")
            .field("config", &self.inner.config)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl RiskService {
    /// Create a risk service with the default configuration.
    #[must_use]
    pub fn new(checker: RiskChecker, sink: Arc<dyn RiskEventSink>) -> Self {
        Self::with_config(RiskServiceConfig::default(), checker, sink, None)
    }

    /// Create with custom configuration and an optional strategy directory
    /// used by the monitors to discover active strategies.
    #[must_use]
    pub fn with_config(
        config: RiskServiceConfig,
        checker: RiskChecker,
        sink: Arc<dyn RiskEventSink>,
        strategies: Option<Arc<dyn StrategyDirectory>>,
    ) -> Self {
        let (event_tx, event_rx) = mpsc::channel(config.event_buffer.max(1));
        let (violation_tx, violation_rx) = mpsc::channel(config.violation_buffer.max(1));
        let state = RiskState::with_capacity(config.event_retention);

        Self {
            inner: Arc::new(Inner {
                checker,
                config,
                state: RwLock::new(state),
                event_tx,
                event_rx: Mutex::new(Some(event_rx)),
                violation_tx,
                violation_rx: Mutex::new(Some(violation_rx)),
                sink,
                strategies,
                runtime: Mutex::new(None),
            }),
        }
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &RiskServiceConfig {
        &self.inner.config
    }

    /// The wrapped checker.
    #[must_use]
    pub fn checker(&self) -> &RiskChecker {
        &self.inner.checker
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Start the event processor and both monitors.
    ///
    /// The tasks stop on [`stop`](Self::stop) or when `parent` is cancelled.
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyRunning` if started twice, or `EventStreamUnavailable`
    /// if a previous processor task panicked.
    pub fn start(&self, parent: &CancellationToken) -> Result<(), RiskServiceError> {
        let mut runtime = self.inner.runtime.lock();
        if runtime.is_some() {
            return Err(RiskServiceError::AlreadyRunning);
        }
        let events = self
            .inner
            .event_rx
            .lock()
            .take()
            .ok_or(RiskServiceError::EventStreamUnavailable)?;

        let shutdown = parent.child_token();
        let processor =
            monitors::spawn_event_processor(Arc::clone(&self.inner), events, shutdown.clone());
        let monitors = vec![
            monitors::spawn_monitor(
                Arc::clone(&self.inner),
                MonitorKind::Exposure,
                self.inner.config.exposure_check_interval(),
                shutdown.clone(),
            ),
            monitors::spawn_monitor(
                Arc::clone(&self.inner),
                MonitorKind::Drawdown,
                self.inner.config.drawdown_check_interval(),
                shutdown.clone(),
            ),
        ];

        *runtime = Some(Runtime {
            shutdown,
            processor,
            monitors,
        });

        tracing::info!(
            event_buffer = self.inner.config.event_buffer,
            violation_buffer = self.inner.config.violation_buffer,
            "Risk service started"
        );
        Ok(())
    }

    /// Stop the background tasks and wait for all of them to exit.
    ///
    /// A no-op before `start` or after a previous `stop`.
    pub async fn stop(&self) {
        let Some(runtime) = self.inner.runtime.lock().take() else {
            tracing::debug!("Risk service not running, stop is a no-op");
            return;
        };

        runtime.shutdown.cancel();

        match runtime.processor.await {
            Ok(events) => {
                *self.inner.event_rx.lock() = Some(events);
            }
            Err(e) => {
                tracing::error!(error = %e, "Risk event processor task failed");
            }
        }
        for handle in runtime.monitors {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Risk monitor task failed");
            }
        }

        tracing::info!("Risk service stopped");
    }

    /// True between `start` and `stop`.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.runtime.lock().is_some()
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Validate an order at submission.
    ///
    /// # Errors
    ///
    /// Returns `OrderBlocked` with the first violated rule. The block is
    /// counted and recorded as a `block_order` event.
    pub fn validate_order(&self, order: &Order) -> Result<(), RiskServiceError> {
        self.inner
            .validate_order(order)
            .map_err(RiskServiceError::OrderBlocked)
    }

    /// Validate an open position.
    ///
    /// # Errors
    ///
    /// Returns `LimitBreached` if size, unrealized loss or margin is out of bounds.
    pub fn validate_position(&self, position: &Position) -> Result<(), RiskServiceError> {
        self.inner.validate_position(position)
    }

    /// Check a strategy's exposure and record the snapshot.
    ///
    /// # Errors
    ///
    /// Returns `LimitBreached` if exposure exceeds the limit.
    pub fn check_exposure(&self, strategy_id: &StrategyId) -> Result<(), RiskServiceError> {
        self.inner.check_exposure(strategy_id)
    }

    /// Check a strategy's drawdown and record the snapshot.
    ///
    /// # Errors
    ///
    /// Returns `LimitBreached` if drawdown exceeds the limit.
    pub fn check_drawdown(&self, strategy_id: &StrategyId) -> Result<(), RiskServiceError> {
        self.inner.check_drawdown(strategy_id)
    }

    /// Record an event and queue it without blocking.
    ///
    /// A full channel drops the event from the stream; it stays in memory.
    pub fn emit_risk_event(&self, event: RiskEvent) {
        let delivery = {
            let mut state = self.inner.state.write();
            self.inner.enqueue(&mut state, event.clone())
        };
        Inner::report(&event, &delivery);
    }

    // ========================================================================
    // Readers
    // ========================================================================

    /// Snapshot of the counters.
    #[must_use]
    pub fn metrics(&self) -> RiskMetrics {
        self.inner.state.read().metrics()
    }

    /// Retained events in arrival order.
    #[must_use]
    pub fn events(&self) -> Vec<RiskEvent> {
        self.inner.state.read().events().cloned().collect()
    }

    /// Unresolved events in arrival order.
    #[must_use]
    pub fn unresolved_events(&self) -> Vec<RiskEvent> {
        self.inner
            .state
            .read()
            .events()
            .filter(|e| !e.resolved)
            .cloned()
            .collect()
    }

    /// Acknowledge an event. Resolving twice is not an error.
    ///
    /// # Errors
    ///
    /// Returns `UnknownEvent` if no event has this id.
    pub fn resolve_event(&self, id: &RiskEventId) -> Result<(), RiskServiceError> {
        let tracked = {
            let mut state = self.inner.state.write();
            if !state.resolve_event(id) {
                return Err(RiskServiceError::UnknownEvent(id.clone()));
            }
            state.unresolved_events()
        };
        observability::update_tracked_events(tracked);
        tracing::info!(event_id = %id, "Risk event resolved");
        Ok(())
    }

    /// Last exposure seen for `strategy_id`.
    #[must_use]
    pub fn exposure_snapshot(&self, strategy_id: &StrategyId) -> Option<Decimal> {
        self.inner.state.read().exposure.get(strategy_id).copied()
    }

    /// Last drawdown percent seen for `strategy_id`.
    #[must_use]
    pub fn drawdown_snapshot(&self, strategy_id: &StrategyId) -> Option<Decimal> {
        self.inner.state.read().drawdown.get(strategy_id).copied()
    }

    /// Strategies the monitors will re-check.
    #[must_use]
    pub fn tracked_strategies(&self) -> Vec<StrategyId> {
        self.inner.monitored_strategies()
    }

    /// Hand the high/critical violation stream to its single consumer.
    ///
    /// Returns `None` once taken.
    pub fn take_violation_receiver(&self) -> Option<mpsc::Receiver<RiskEvent>> {
        self.inner.violation_rx.lock().take()
    }
}

impl OrderRiskValidator for RiskService {
    fn validate_order(&self, order: &Order) -> Result<(), RiskViolation> {
        self.inner.validate_order(order)
    }
}

// ============================================================================
// Check bookkeeping
// ============================================================================

impl Inner {
    fn validate_order(&self, order: &Order) -> Result<(), RiskViolation> {
        let started = Instant::now();
        let result = self.checker.validate_order(order);
        let elapsed = started.elapsed();

        match result {
            Ok(()) => {
                self.record_pass(order.strategy_id(), "order", elapsed);
                Ok(())
            }
            Err(violation) => {
                let (event_type, severity) = if violation.kind == ViolationKind::Exposure {
                    (RiskEventType::ExposureLimit, RiskSeverity::High)
                } else {
                    (RiskEventType::OrderValidation, RiskSeverity::Medium)
                };
                let event = violation_event(&violation, event_type, severity, RiskAction::BlockOrder)
                    .with_data("order_id", order.id().as_str())
                    .with_data("side", order.side().to_string())
                    .with_data("quantity", order.quantity().to_string())
                    .with_data("price", order.price().to_string());

                self.record_violation("order", event, true, elapsed);
                Err(violation)
            }
        }
    }

    fn validate_position(&self, position: &Position) -> Result<(), RiskServiceError> {
        let started = Instant::now();
        let result = self.checker.validate_position(position);
        let elapsed = started.elapsed();

        match result {
            Ok(()) => {
                self.record_pass(&position.strategy_id, "position", elapsed);
                Ok(())
            }
            Err(violation) => {
                let action = if violation.kind == ViolationKind::DailyLoss {
                    RiskAction::MonitorPosition
                } else {
                    RiskAction::ReduceExposure
                };
                let event = violation_event(
                    &violation,
                    RiskEventType::PositionValidation,
                    RiskSeverity::High,
                    action,
                )
                .with_data("side", position.side.to_string())
                .with_data("size", position.size.to_string());

                self.record_violation("position", event, false, elapsed);
                Err(RiskServiceError::LimitBreached(violation))
            }
        }
    }

    fn check_exposure(&self, strategy_id: &StrategyId) -> Result<(), RiskServiceError> {
        let started = Instant::now();
        let result = self.checker.check_exposure(strategy_id);
        let elapsed = started.elapsed();

        match result {
            Ok(observed) => {
                if let Some(exposure) = observed {
                    self.state.write().exposure.insert(strategy_id.clone(), exposure);
                }
                self.record_pass(strategy_id, "exposure", elapsed);
                Ok(())
            }
            Err(violation) => {
                if let Some(exposure) = violation.observed {
                    self.state.write().exposure.insert(strategy_id.clone(), exposure);
                }
                let event = violation_event(
                    &violation,
                    RiskEventType::ExposureLimit,
                    RiskSeverity::High,
                    RiskAction::ReduceExposure,
                );
                self.record_violation("exposure", event, false, elapsed);
                Err(RiskServiceError::LimitBreached(violation))
            }
        }
    }

    fn check_drawdown(&self, strategy_id: &StrategyId) -> Result<(), RiskServiceError> {
        let started = Instant::now();
        let result = self.checker.check_drawdown(strategy_id);
        let elapsed = started.elapsed();

        match result {
            Ok(observed) => {
                if let Some(drawdown) = observed {
                    self.state.write().drawdown.insert(strategy_id.clone(), drawdown);
                }
                self.record_pass(strategy_id, "drawdown", elapsed);
                Ok(())
            }
            Err(violation) => {
                if let Some(drawdown) = violation.observed {
                    self.state.write().drawdown.insert(strategy_id.clone(), drawdown);
                }
                let event = violation_event(
                    &violation,
                    RiskEventType::DrawdownLimit,
                    RiskSeverity::Critical,
                    RiskAction::StopStrategy,
                );
                self.record_violation("drawdown", event, false, elapsed);
                Err(RiskServiceError::LimitBreached(violation))
            }
        }
    }

    fn record_pass(&self, strategy_id: &StrategyId, check: &'static str, elapsed: Duration) {
        let score = {
            let mut state = self.state.write();
            state.record_check(strategy_id, None);
            state.risk_score
        };
        observability::record_risk_check(check, "passed", elapsed.as_secs_f64());
        observability::update_risk_score(score);
    }

    /// Count the failed check and emit its event under one write guard.
    fn record_violation(
        &self,
        check: &'static str,
        event: RiskEvent,
        blocked: bool,
        elapsed: Duration,
    ) {
        let (delivery, score) = {
            let mut state = self.state.write();
            state.record_check(&event.strategy_id, Some(event.severity));
            if blocked {
                state.blocked_orders += 1;
            }
            let delivery = self.enqueue(&mut state, event.clone());
            (delivery, state.risk_score)
        };

        observability::record_risk_check(check, "violated", elapsed.as_secs_f64());
        observability::record_risk_violation(
            &event.event_type.to_string(),
            &event.severity.to_string(),
        );
        observability::update_risk_score(score);
        Self::report(&event, &delivery);
    }

    /// Insert into the map and queue on the channels. Caller holds the write guard.
    fn enqueue(&self, state: &mut RiskState, event: RiskEvent) -> Delivery {
        let alert = event.severity.escalates().then(|| event.clone());
        let evicted = state.insert_event(event.clone());

        let queued = match self.event_tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_) | TrySendError::Closed(_)) => {
                state.dropped_events += 1;
                false
            }
        };
        let alerted = alert.map(|alert| match self.violation_tx.try_send(alert) {
            Ok(()) => true,
            Err(TrySendError::Full(_) | TrySendError::Closed(_)) => {
                state.dropped_alerts += 1;
                false
            }
        });

        Delivery {
            queued,
            alerted,
            tracked: state.unresolved_events(),
            evicted,
        }
    }

    /// Log and count an emitted event. Runs after the guard is released.
    fn report(event: &RiskEvent, delivery: &Delivery) {
        tracing::warn!(
            event_id = %event.id,
            strategy_id = %event.strategy_id,
            event_type = %event.event_type,
            severity = %event.severity,
            action = %event.action,
            description = %event.description,
            "Risk event emitted"
        );

        if !delivery.queued {
            observability::record_risk_event_dropped("events");
            tracing::warn!(event_id = %event.id, "Risk event channel full, event kept in memory only");
        }
        if delivery.alerted == Some(false) {
            observability::record_risk_event_dropped("violations");
            tracing::warn!(event_id = %event.id, "Risk violation channel full, escalation dropped");
        }
        if let Some(evicted) = &delivery.evicted {
            observability::record_risk_event_evicted();
            if evicted.resolved {
                tracing::debug!(event_id = %evicted.id, "Resolved risk event evicted");
            } else {
                tracing::warn!(
                    event_id = %evicted.id,
                    strategy_id = %evicted.strategy_id,
                    "Unresolved risk event evicted, retention full"
                );
            }
        }
        observability::update_tracked_events(delivery.tracked);
    }

    /// Strategies seen by the service plus those the directory reports active.
    fn monitored_strategies(&self) -> Vec<StrategyId> {
        let mut strategies = self.state.read().strategies.clone();

        if let Some(directory) = &self.strategies {
            match directory.active_strategies() {
                Ok(active) => strategies.extend(active),
                Err(e) => {
                    tracing::warn!(error = %e, "Strategy directory unavailable, monitoring known strategies only");
                }
            }
        }
        strategies.into_iter().collect()
    }
}

/// Base event for a violation, carrying its code and values.
fn violation_event(
    violation: &RiskViolation,
    event_type: RiskEventType,
    severity: RiskSeverity,
    action: RiskAction,
) -> RiskEvent {
    let mut event = RiskEvent::new(
        event_type,
        severity,
        violation.strategy_id.clone(),
        violation.message.clone(),
        action,
    )
    .with_symbol(violation.symbol.clone())
    .with_data("violation", violation.kind.code());

    if let Some(observed) = violation.observed {
        event = event.with_data("observed", observed.normalize().to_string());
    }
    if let Some(limit) = violation.limit {
        event = event.with_data("limit", limit.normalize().to_string());
    }
    event
}
