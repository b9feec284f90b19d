use std::fmt;
use std::time::Duration;

use strum::{Display, IntoStaticStr};

use crate::proto;

/// Identifier the coordinator assigns to this node at registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the node announces about itself when registering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registration {
    pub peer_id: String,
    pub name: String,
    pub region: String,
    pub multiaddrs: Vec<String>,
    pub capacity_bytes: i64,
    pub wallet_address: String,
}

/// A peer the coordinator suggests connecting to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerDescriptor {
    pub node_id: NodeId,
    pub multiaddrs: Vec<String>,
}

impl From<proto::Peer> for PeerDescriptor {
    fn from(peer: proto::Peer) -> Self {
        Self {
            node_id: NodeId(peer.node_id),
            multiaddrs: peer.multiaddrs,
        }
    }
}

/// Liveness report payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Heartbeat {
    pub storage_used_bytes: i64,
    pub uptime: Duration,
}

impl Heartbeat {
    /// Uptime in whole seconds, saturating at `i64::MAX`.
    pub fn uptime_seconds(&self) -> i64 {
        i64::try_from(self.uptime.as_secs()).unwrap_or(i64::MAX)
    }
}

/// Progress of a pin task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum PinStatus {
    Pending,
    Pinned,
    Failed,
}

impl PinStatus {
    /// Outcome of a pin attempt.
    pub fn from_outcome<T, E>(outcome: &Result<T, E>) -> Self {
        if outcome.is_ok() { Self::Pinned } else { Self::Failed }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl From<PinStatus> for proto::PinStatus {
    fn from(status: PinStatus) -> Self {
        match status {
            PinStatus::Pending => Self::Unspecified,
            PinStatus::Pinned => Self::Pinned,
            PinStatus::Failed => Self::Failed,
        }
    }
}

/// Work item dispatched by the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinTask {
    pub task_id: String,
    pub cid: String,
    pub status: PinStatus,
}

impl PinTask {
    pub fn new(task_id: impl Into<String>, cid: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            cid: cid.into(),
            status: PinStatus::Pending,
        }
    }
}

impl From<proto::PinTask> for PinTask {
    fn from(task: proto::PinTask) -> Self {
        Self::new(task.task_id, task.cid)
    }
}
