//! In-memory stand-ins for the daemon, the storage API and the coordinator.

use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use cairn_coordinator::{
    Coordinator, CoordinatorConnector, CoordinatorError, CoordinatorResult, Heartbeat, NodeId,
    PeerDescriptor, PinStatus, PinTask, Registration,
};
use cairn_ipfs_api::{ApiError, ApiResult, PeerInfo, RepoStat, StorageApi};
use cairn_ipfs_daemon::{DaemonError, DaemonLifecycle, DaemonResult, DaemonState};
use parking_lot::Mutex;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::{AgentConfig, NodeProfile};

pub(crate) const NODE_ID: &str = "node-1";
pub(crate) const PEER_ID: &str = "12D3KooWSelf";

pub(crate) fn agent_config() -> AgentConfig {
    AgentConfig {
        profile: NodeProfile {
            name: "cairn-node-test".into(),
            region: "eu".into(),
            wallet_address: "0xwallet".into(),
            capacity_bytes: 1 << 30,
        },
        swarm_key: None,
        bootstrap_peers: vec![],
        heartbeat_interval: Duration::from_secs(60),
        poll_interval: Duration::from_secs(30),
        max_concurrent_pins: 4,
        shutdown_grace: Duration::from_secs(10),
    }
}

pub(crate) struct MockDaemon {
    pub(crate) calls: Mutex<Vec<String>>,
    /// Step that fails with [`DaemonError::Failed`].
    pub(crate) fail_at: Option<&'static str>,
    /// `peer_info` waits for cancellation instead of answering.
    pub(crate) hang_peer_info: bool,
    pub(crate) unreachable: HashSet<String>,
    state: Mutex<DaemonState>,
}

impl MockDaemon {
    pub(crate) fn new() -> Self {
        Self {
            calls: Mutex::default(),
            fail_at: None,
            hang_peer_info: false,
            unreachable: HashSet::new(),
            state: Mutex::new(DaemonState::Uninstalled),
        }
    }

    pub(crate) fn failing_at(mut self, step: &'static str) -> Self {
        self.fail_at = Some(step);
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn step(&self, name: &str, next: DaemonState) -> DaemonResult<()> {
        self.calls.lock().push(name.to_string());
        if self.fail_at == Some(name) {
            *self.state.lock() = DaemonState::Failed;
            return Err(DaemonError::Failed);
        }
        *self.state.lock() = next;
        Ok(())
    }
}

#[async_trait]
impl DaemonLifecycle for MockDaemon {
    async fn ensure_installed(&self) -> DaemonResult<PathBuf> {
        self.step("ensure_installed", DaemonState::RepoUninitialized)?;
        Ok(PathBuf::from("/usr/local/bin/ipfs"))
    }

    async fn initialize_repo(&self, _cancel: &CancellationToken) -> DaemonResult<()> {
        self.step("initialize_repo", DaemonState::RepoReady)
    }

    async fn configure_private_network(
        &self,
        _swarm_key: Option<&str>,
        _bootstrap_peers: &[String],
    ) -> DaemonResult<()> {
        self.step("configure_private_network", DaemonState::Configured)
    }

    async fn start_daemon(&self, _cancel: &CancellationToken) -> DaemonResult<()> {
        self.step("start_daemon", DaemonState::Starting)
    }

    async fn stop_daemon(&self, _cancel: &CancellationToken) -> DaemonResult<()> {
        self.step("stop_daemon", DaemonState::Stopped)
    }

    async fn peer_info(&self, cancel: &CancellationToken) -> DaemonResult<PeerInfo> {
        self.step("peer_info", DaemonState::Ready)?;
        if self.hang_peer_info {
            cancel.cancelled().await;
            return Err(DaemonError::Cancelled);
        }
        Ok(PeerInfo {
            id: PEER_ID.into(),
            addresses: vec![format!("/ip4/10.0.0.1/tcp/4001/p2p/{PEER_ID}")],
        })
    }

    async fn connect_to_peer(&self, address: &str, _cancel: &CancellationToken) -> DaemonResult<()> {
        self.calls.lock().push(format!("connect {address}"));
        if self.unreachable.contains(address) {
            return Err(DaemonError::Command {
                command: format!("swarm connect {address}"),
                status: "exit status: 1".into(),
                stderr: "failure: dial backoff".into(),
            });
        }
        Ok(())
    }

    fn state(&self) -> DaemonState {
        *self.state.lock()
    }
}

#[derive(Default)]
pub(crate) struct MockStorage {
    pub(crate) repo_size: u64,
    pub(crate) repo_stat_fails: bool,
    pub(crate) failing_cids: HashSet<String>,
    pub(crate) hanging_cids: HashSet<String>,
    /// When set, every pin takes one permit before it completes.
    pub(crate) gate: Option<Arc<Semaphore>>,
    pub(crate) pins: Mutex<Vec<String>>,
    pub(crate) active: AtomicUsize,
    pub(crate) max_active: AtomicUsize,
}

#[async_trait]
impl StorageApi for MockStorage {
    async fn version(&self) -> ApiResult<String> {
        Ok("0.29.0".into())
    }

    async fn id(&self) -> ApiResult<PeerInfo> {
        Ok(PeerInfo {
            id: PEER_ID.into(),
            addresses: vec![],
        })
    }

    async fn repo_stat(&self) -> ApiResult<RepoStat> {
        if self.repo_stat_fails {
            return Err(ApiError::Status {
                endpoint: "repo/stat",
                status: 500,
                body: "repo locked".into(),
            });
        }
        Ok(RepoStat {
            repo_size: self.repo_size,
            storage_max: 0,
        })
    }

    async fn pin(&self, cid: &str) -> ApiResult<()> {
        self.pins.lock().push(cid.to_string());
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active, Ordering::SeqCst);

        if self.hanging_cids.contains(cid) {
            std::future::pending::<()>().await;
        }
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }

        self.active.fetch_sub(1, Ordering::SeqCst);
        if self.failing_cids.contains(cid) {
            return Err(ApiError::Status {
                endpoint: "pin/add",
                status: 500,
                body: "context deadline exceeded".into(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Register,
    GetPeers(String),
    Heartbeat { node: String, used: i64, uptime: i64, ok: bool },
    GetPinTasks(String),
    Report { node: String, task_id: String, status: PinStatus },
}

#[derive(Default)]
pub(crate) struct MockCoordinator {
    pub(crate) calls: Mutex<Vec<Call>>,
    pub(crate) reject: Option<String>,
    pub(crate) peers: Vec<PeerDescriptor>,
    pub(crate) peers_error: Option<String>,
    /// Remaining heartbeats that fail.
    pub(crate) heartbeat_failures: AtomicUsize,
    pub(crate) task_batches: Mutex<VecDeque<Vec<PinTask>>>,
    pub(crate) report_fails: bool,
    /// Cancel the token once this many heartbeats have been attempted.
    pub(crate) stop_after_heartbeats: Option<(usize, CancellationToken)>,
    /// Cancel the token once this many polls have been attempted.
    pub(crate) stop_after_polls: Option<(usize, CancellationToken)>,
    /// Cancel the token when peers are requested.
    pub(crate) stop_on_get_peers: Option<CancellationToken>,
}

impl MockCoordinator {
    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub(crate) fn reports(&self) -> Vec<(String, PinStatus)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Report { task_id, status, .. } => Some((task_id, status)),
                _ => None,
            })
            .collect()
    }

    fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().iter().filter(|c| pred(c)).count()
    }

    fn maybe_stop(&self, trigger: &Option<(usize, CancellationToken)>, seen: usize) {
        if let Some((limit, token)) = trigger {
            if seen >= *limit {
                token.cancel();
            }
        }
    }
}

#[async_trait]
impl Coordinator for MockCoordinator {
    async fn register(&self, _registration: &Registration) -> CoordinatorResult<NodeId> {
        self.calls.lock().push(Call::Register);
        match &self.reject {
            Some(reason) => Err(CoordinatorError::Rejected(reason.clone())),
            None => Ok(NodeId::new(NODE_ID)),
        }
    }

    async fn get_peers(&self, node: &NodeId) -> CoordinatorResult<Vec<PeerDescriptor>> {
        self.calls.lock().push(Call::GetPeers(node.to_string()));
        if let Some(token) = &self.stop_on_get_peers {
            token.cancel();
        }
        match &self.peers_error {
            Some(reason) => Err(CoordinatorError::Protocol(reason.clone())),
            None => Ok(self.peers.clone()),
        }
    }

    async fn heartbeat(&self, node: &NodeId, heartbeat: Heartbeat) -> CoordinatorResult<()> {
        let ok = self
            .heartbeat_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_err();
        self.calls.lock().push(Call::Heartbeat {
            node: node.to_string(),
            used: heartbeat.storage_used_bytes,
            uptime: heartbeat.uptime_seconds(),
            ok,
        });
        let seen = self.count(|c| matches!(c, Call::Heartbeat { .. }));
        self.maybe_stop(&self.stop_after_heartbeats, seen);
        if ok {
            Ok(())
        } else {
            Err(CoordinatorError::Protocol("coordinator unavailable".into()))
        }
    }

    async fn get_pin_tasks(&self, node: &NodeId) -> CoordinatorResult<Vec<PinTask>> {
        self.calls.lock().push(Call::GetPinTasks(node.to_string()));
        let seen = self.count(|c| matches!(c, Call::GetPinTasks(_)));
        self.maybe_stop(&self.stop_after_polls, seen);
        Ok(self.task_batches.lock().pop_front().unwrap_or_default())
    }

    async fn report_pin_status(
        &self,
        node: &NodeId,
        task_id: &str,
        status: PinStatus,
    ) -> CoordinatorResult<()> {
        self.calls.lock().push(Call::Report {
            node: node.to_string(),
            task_id: task_id.to_string(),
            status,
        });
        if self.report_fails {
            return Err(CoordinatorError::Protocol("task unknown".into()));
        }
        Ok(())
    }
}

pub(crate) struct MockConnector {
    pub(crate) coordinator: Arc<MockCoordinator>,
    pub(crate) fail: bool,
    pub(crate) connects: AtomicUsize,
}

impl MockConnector {
    pub(crate) fn new(coordinator: Arc<MockCoordinator>) -> Self {
        Self {
            coordinator,
            fail: false,
            connects: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl CoordinatorConnector for MockConnector {
    type Client = Arc<MockCoordinator>;

    async fn connect(&self) -> CoordinatorResult<Arc<MockCoordinator>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(CoordinatorError::InvalidEndpoint {
                address: "nowhere".into(),
                reason: "unreachable".into(),
            });
        }
        Ok(Arc::clone(&self.coordinator))
    }
}
