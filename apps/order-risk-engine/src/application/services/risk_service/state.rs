//! Shared state behind the risk service lock.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::risk_management::{RiskEvent, RiskSeverity};
use crate::domain::shared::{RiskEventId, StrategyId};

/// Smoothing factor of the running risk score.
pub(super) const SCORE_SMOOTHING: f64 = 0.1;

/// Events kept in memory when no retention is configured.
pub(super) const DEFAULT_EVENT_RETENTION: usize = 10_000;

/// Point-in-time view of the risk service counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskMetrics {
    /// Checks run since construction.
    pub total_checks: u64,
    /// Checks that raised a violation.
    pub violations: u64,
    /// Orders refused by `validate_order`.
    pub blocked_orders: u64,
    /// `violations / total_checks`, zero before the first check.
    pub violation_rate: f64,
    /// Exponentially weighted score of recent outcomes, 0 to 100.
    pub risk_score: f64,
    /// Unresolved events held in memory.
    pub tracked_events: usize,
    /// Events that did not fit in the event channel.
    pub dropped_events: u64,
    /// Escalations that did not fit in the violation channel.
    pub dropped_alerts: u64,
    /// Events evicted to stay within the retention cap.
    pub evicted_events: u64,
}

/// Events in arrival order, capped at `capacity`.
///
/// Over capacity the oldest resolved event goes first, then the oldest
/// unresolved one.
#[derive(Debug)]
struct EventLog {
    by_seq: BTreeMap<u64, RiskEvent>,
    seq_of: HashMap<RiskEventId, u64>,
    resolved: BTreeSet<u64>,
    next_seq: u64,
    capacity: usize,
}

impl EventLog {
    fn new(capacity: usize) -> Self {
        Self {
            by_seq: BTreeMap::new(),
            seq_of: HashMap::new(),
            resolved: BTreeSet::new(),
            next_seq: 0,
            capacity: capacity.max(1),
        }
    }

    /// Insert or replace. Returns the event evicted to make room, if any.
    fn insert(&mut self, event: RiskEvent) -> Option<RiskEvent> {
        let seq = match self.seq_of.get(&event.id) {
            Some(&seq) => seq,
            None => {
                let seq = self.next_seq;
                self.next_seq += 1;
                self.seq_of.insert(event.id.clone(), seq);
                seq
            }
        };
        if event.resolved {
            self.resolved.insert(seq);
        } else {
            self.resolved.remove(&seq);
        }
        self.by_seq.insert(seq, event);

        if self.by_seq.len() > self.capacity {
            return self.evict_oldest();
        }
        None
    }

    fn evict_oldest(&mut self) -> Option<RiskEvent> {
        let seq = match self.resolved.pop_first() {
            Some(seq) => seq,
            None => *self.by_seq.keys().next()?,
        };
        let event = self.by_seq.remove(&seq)?;
        self.seq_of.remove(&event.id);
        Some(event)
    }

    fn resolve(&mut self, id: &RiskEventId) -> bool {
        let Some(&seq) = self.seq_of.get(id) else {
            return false;
        };
        if let Some(event) = self.by_seq.get_mut(&seq) {
            event.resolved = true;
            self.resolved.insert(seq);
        }
        true
    }

    fn unresolved(&self) -> usize {
        self.by_seq.len() - self.resolved.len()
    }
}

#[derive(Debug)]
pub(super) struct RiskState {
    events: EventLog,
    pub exposure: HashMap<StrategyId, Decimal>,
    pub drawdown: HashMap<StrategyId, Decimal>,
    pub strategies: BTreeSet<StrategyId>,
    pub total_checks: u64,
    pub violations: u64,
    pub blocked_orders: u64,
    pub risk_score: f64,
    pub dropped_events: u64,
    pub dropped_alerts: u64,
    pub evicted_events: u64,
}

impl Default for RiskState {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_EVENT_RETENTION)
    }
}

impl RiskState {
    /// Count one check. `outcome` is the severity of the raised event, if any.
    pub fn record_check(&mut self, strategy_id: &StrategyId, outcome: Option<RiskSeverity>) {
        self.total_checks += 1;
        if outcome.is_some() {
            self.violations += 1;
        }
        if !self.strategies.contains(strategy_id) {
            self.strategies.insert(strategy_id.clone());
        }

        let sample = outcome.map_or(0.0, |severity| severity.score_weight());
        self.risk_score += SCORE_SMOOTHING * (sample - self.risk_score);
    }

    pub fn with_capacity(event_retention: usize) -> Self {
        Self {
            events: EventLog::new(event_retention),
            exposure: HashMap::new(),
            drawdown: HashMap::new(),
            strategies: BTreeSet::new(),
            total_checks: 0,
            violations: 0,
            blocked_orders: 0,
            risk_score: 0.0,
            dropped_events: 0,
            dropped_alerts: 0,
            evicted_events: 0,
        }
    }

    /// Record an event. Returns the event evicted to stay within retention.
    pub fn insert_event(&mut self, event: RiskEvent) -> Option<RiskEvent> {
        let evicted = self.events.insert(event);
        if evicted.is_some() {
            self.evicted_events += 1;
        }
        evicted
    }

    /// Mark an event resolved. Returns false for an unknown id.
    pub fn resolve_event(&mut self, id: &RiskEventId) -> bool {
        self.events.resolve(id)
    }

    /// Events in arrival order.
    pub fn events(&self) -> impl Iterator<Item = &RiskEvent> {
        self.events.by_seq.values()
    }

    pub fn unresolved_events(&self) -> usize {
        self.events.unresolved()
    }

    pub fn metrics(&self) -> RiskMetrics {
        let violation_rate = if self.total_checks == 0 {
            0.0
        } else {
            self.violations as f64 / self.total_checks as f64
        };

        RiskMetrics {
            total_checks: self.total_checks,
            violations: self.violations,
            blocked_orders: self.blocked_orders,
            violation_rate,
            risk_score: self.risk_score,
            tracked_events: self.unresolved_events(),
            dropped_events: self.dropped_events,
            dropped_alerts: self.dropped_alerts,
            evicted_events: self.evicted_events,
        }
    }
}
