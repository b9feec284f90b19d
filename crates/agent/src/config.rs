use std::time::Duration;

use cairn_coordinator::Registration;
use cairn_ipfs_api::PeerInfo;

use crate::{AgentError, AgentResult};

/// Fixed node attributes announced at registration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeProfile {
    pub name: String,
    pub region: String,
    pub wallet_address: String,
    pub capacity_bytes: i64,
}

/// Fully resolved agent settings. No defaulting happens past this point.
#[derive(Clone)]
pub struct AgentConfig {
    pub profile: NodeProfile,
    /// Swarm key file contents, if private networking is configured.
    pub swarm_key: Option<String>,
    pub bootstrap_peers: Vec<String>,
    pub heartbeat_interval: Duration,
    pub poll_interval: Duration,
    /// Upper bound on concurrently running pin handlers.
    pub max_concurrent_pins: usize,
    /// How long shutdown waits for in-flight pin handlers.
    pub shutdown_grace: Duration,
}

impl AgentConfig {
    pub(crate) fn validate(&self) -> AgentResult<()> {
        if self.heartbeat_interval.is_zero() {
            return Err(AgentError::InvalidConfig("heartbeat interval must be positive"));
        }
        if self.poll_interval.is_zero() {
            return Err(AgentError::InvalidConfig("poll interval must be positive"));
        }
        if self.max_concurrent_pins == 0 {
            return Err(AgentError::InvalidConfig("max concurrent pins must be at least 1"));
        }
        if self.profile.capacity_bytes < 0 {
            return Err(AgentError::InvalidConfig("capacity must not be negative"));
        }
        Ok(())
    }

    pub(crate) fn registration(&self, peer: PeerInfo) -> Registration {
        Registration {
            peer_id: peer.id,
            name: self.profile.name.clone(),
            region: self.profile.region.clone(),
            multiaddrs: peer.addresses,
            capacity_bytes: self.profile.capacity_bytes,
            wallet_address: self.profile.wallet_address.clone(),
        }
    }
}

impl std::fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentConfig")
            .field("profile", &self.profile)
            .field("swarm_key", &self.swarm_key.as_ref().map(|_| "<redacted>"))
            .field("bootstrap_peers", &self.bootstrap_peers)
            .field("heartbeat_interval", &self.heartbeat_interval)
            .field("poll_interval", &self.poll_interval)
            .field("max_concurrent_pins", &self.max_concurrent_pins)
            .field("shutdown_grace", &self.shutdown_grace)
            .finish()
    }
}
