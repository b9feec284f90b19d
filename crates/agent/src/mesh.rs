//! Best-effort peer mesh formation after registration.

use cairn_coordinator::{Coordinator, RegisteredSession};
use cairn_ipfs_daemon::DaemonLifecycle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Outcome of one mesh formation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeshReport {
    /// Peers the coordinator returned.
    pub peers: usize,
    /// Addresses across all of them.
    pub addresses: usize,
    /// Addresses that connected.
    pub connected: usize,
}

impl MeshReport {
    pub fn failed(&self) -> usize {
        self.addresses.saturating_sub(self.connected)
    }
}

/// Dial every advertised address of every peer. Individual failures are
/// logged and counted; nothing here aborts setup.
pub(crate) async fn form_mesh<C: Coordinator>(
    daemon: &dyn DaemonLifecycle,
    session: &RegisteredSession<C>,
    cancel: &CancellationToken,
) -> MeshReport {
    let peers = match session.get_peers().await {
        Ok(peers) => peers,
        Err(e) => {
            warn!(error = %e, "failed to get peers");
            return MeshReport::default();
        }
    };

    let mut report = MeshReport {
        peers: peers.len(),
        ..Default::default()
    };

    for peer in &peers {
        for address in &peer.multiaddrs {
            report.addresses += 1;
            if cancel.is_cancelled() {
                continue;
            }
            match daemon.connect_to_peer(address, cancel).await {
                Ok(()) => report.connected += 1,
                Err(e) => warn!(node_id = %peer.node_id, peer = %address, error = %e, "failed to connect to peer"),
            }
        }
    }

    if report.peers == 0 {
        debug!("coordinator returned no peers");
    }
    info!(
        connected = report.connected,
        total = report.addresses,
        peers = report.peers,
        "connected to peers"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MockCoordinator, MockDaemon};
    use cairn_coordinator::{NodeId, PeerDescriptor, Registration};

    fn peer(id: &str, addrs: &[&str]) -> PeerDescriptor {
        PeerDescriptor {
            node_id: NodeId::new(id),
            multiaddrs: addrs.iter().map(|a| a.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn partial_failure_counts_successes() {
        let coordinator = MockCoordinator {
            peers: vec![
                peer("n2", &["/ip4/10.0.0.2/tcp/4001", "/ip6/::2/tcp/4001"]),
                peer("n3", &["/ip4/10.0.0.3/tcp/4001"]),
                peer("n4", &[]),
            ],
            ..Default::default()
        };
        let mut daemon = MockDaemon::new();
        daemon.unreachable.insert("/ip6/::2/tcp/4001".into());

        let session = RegisteredSession::register(&coordinator, &Registration::default())
            .await
            .unwrap();
        let report = form_mesh(&daemon, &session, &CancellationToken::new()).await;

        assert_eq!(
            report,
            MeshReport {
                peers: 3,
                addresses: 3,
                connected: 2
            }
        );
        assert_eq!(report.failed(), 1);
        assert_eq!(
            daemon.calls().iter().filter(|c| c.starts_with("connect")).count(),
            3
        );
    }

    #[tokio::test]
    async fn peer_list_error_is_not_fatal() {
        let coordinator = MockCoordinator {
            peers_error: Some("node unknown".into()),
            ..Default::default()
        };
        let daemon = MockDaemon::new();
        let session = RegisteredSession::register(&coordinator, &Registration::default())
            .await
            .unwrap();

        let report = form_mesh(&daemon, &session, &CancellationToken::new()).await;
        assert_eq!(report, MeshReport::default());
        assert!(daemon.calls().is_empty());
    }

    #[tokio::test]
    async fn cancellation_stops_dialing() {
        let coordinator = MockCoordinator {
            peers: vec![peer("n2", &["/ip4/10.0.0.2/tcp/4001", "/ip4/10.0.0.3/tcp/4001"])],
            ..Default::default()
        };
        let daemon = MockDaemon::new();
        let session = RegisteredSession::register(&coordinator, &Registration::default())
            .await
            .unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = form_mesh(&daemon, &session, &cancel).await;
        assert_eq!(report.connected, 0);
        assert_eq!(report.addresses, 2);
    }
}
