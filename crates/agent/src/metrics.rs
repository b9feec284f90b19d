//! Agent metrics

use core::fmt;
use metrics::{Counter, Gauge};

/// Agent metrics
#[derive(Clone, Debug)]
pub(crate) struct AgentMetrics {
    /// Heartbeats acknowledged by the coordinator
    pub(crate) heartbeats_sent_total: Counter,
    /// Heartbeats that failed in transport or were refused
    pub(crate) heartbeats_failed_total: Counter,
    /// Task polls that failed
    pub(crate) task_polls_failed_total: Counter,
    /// Pin tasks that ended pinned
    pub(crate) pins_pinned_total: Counter,
    /// Pin tasks that ended failed
    pub(crate) pins_failed_total: Counter,
    /// Status reports the coordinator never received
    pub(crate) status_reports_failed_total: Counter,
    /// Pin handlers currently running
    pub(crate) pins_in_flight: Gauge,
    /// Peer addresses connected during mesh formation
    pub(crate) mesh_connected_peers: Gauge,
}

impl Default for AgentMetrics {
    fn default() -> Self {
        Self {
            heartbeats_sent_total: metrics::counter!("agent.heartbeat.sent_total"),
            heartbeats_failed_total: metrics::counter!("agent.heartbeat.failed_total"),
            task_polls_failed_total: metrics::counter!("agent.tasks.poll_failed_total"),
            pins_pinned_total: metrics::counter!("agent.pins.pinned_total"),
            pins_failed_total: metrics::counter!("agent.pins.failed_total"),
            status_reports_failed_total: metrics::counter!("agent.pins.report_failed_total"),
            pins_in_flight: metrics::gauge!("agent.pins.in_flight"),
            mesh_connected_peers: metrics::gauge!("agent.mesh.connected_peers"),
        }
    }
}

impl AgentMetrics {
    pub(crate) fn heartbeat(&self, ok: bool) {
        if ok {
            self.heartbeats_sent_total.increment(1);
        } else {
            self.heartbeats_failed_total.increment(1);
        }
    }

    pub(crate) fn pin_outcome(&self, pinned: bool) {
        if pinned {
            self.pins_pinned_total.increment(1);
        } else {
            self.pins_failed_total.increment(1);
        }
    }

    /// Track one running pin handler until the guard drops.
    pub(crate) fn pin_started(&self) -> InFlightGuard {
        InFlightGuard::new(self.pins_in_flight.clone())
    }
}

/// Raises a gauge on creation and lowers it on drop, even if the task panics.
pub(crate) struct InFlightGuard(Gauge);

impl fmt::Debug for InFlightGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("InFlightGuard").finish()
    }
}

impl InFlightGuard {
    pub(crate) fn new(gauge: Gauge) -> Self {
        gauge.increment(1.0);
        Self(gauge)
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.decrement(1.0);
    }
}
