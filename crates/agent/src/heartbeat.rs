//! Periodic liveness reports.

use std::time::Duration;

use cairn_coordinator::{Coordinator, Heartbeat, RegisteredSession};
use cairn_ipfs_api::StorageApi;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::metrics::AgentMetrics;

/// Send a heartbeat every `period` until `cancel` fires.
///
/// A failed tick is logged and the next one proceeds on schedule.
pub(crate) async fn heartbeat_loop<C: Coordinator>(
    session: &RegisteredSession<C>,
    storage: &dyn StorageApi,
    period: Duration,
    registered_at: Instant,
    cancel: &CancellationToken,
    metrics: &AgentMetrics,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = beat(session, storage, registered_at, metrics) => {}
        }
    }
    debug!("heartbeat loop stopped");
}

async fn beat<C: Coordinator>(
    session: &RegisteredSession<C>,
    storage: &dyn StorageApi,
    registered_at: Instant,
    metrics: &AgentMetrics,
) {
    let storage_used_bytes = match storage.repo_stat().await {
        Ok(stat) => stat.used_bytes_i64(),
        Err(e) => {
            debug!(error = %e, "repo stat unavailable, reporting zero usage");
            0
        }
    };
    let heartbeat = Heartbeat {
        storage_used_bytes,
        uptime: registered_at.elapsed(),
    };

    match session.heartbeat(heartbeat).await {
        Ok(()) => {
            trace!(storage_used_bytes, uptime = ?heartbeat.uptime, "heartbeat sent");
            metrics.heartbeat(true);
        }
        Err(e) => {
            warn!(error = %e, "heartbeat failed");
            metrics.heartbeat(false);
        }
    }
}
