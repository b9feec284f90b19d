//! Readiness polling against the control API.

use cairn_ipfs_api::StorageApi;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::{DaemonError, DaemonResult, ReadinessConfig};

/// Probe `version` every `interval` until it answers, `timeout` elapses, or
/// `cancel` fires. Returns the reported version.
///
/// The first probe is immediate. A probe that hangs is cut off by the overall
/// timeout, so this never waits longer than `timeout`.
pub async fn wait_until_ready(
    api: &dyn StorageApi,
    readiness: ReadinessConfig,
    cancel: &CancellationToken,
) -> DaemonResult<String> {
    let probe = async {
        let mut ticker = tokio::time::interval(readiness.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match api.version().await {
                Ok(version) => return version,
                Err(e) => trace!(error = %e, "IPFS daemon not ready yet"),
            }
        }
    };

    tokio::select! {
        _ = cancel.cancelled() => Err(DaemonError::Cancelled),
        result = tokio::time::timeout(readiness.timeout, probe) => {
            result.map_err(|_| DaemonError::NotReady { timeout: readiness.timeout })
        }
    }
}
