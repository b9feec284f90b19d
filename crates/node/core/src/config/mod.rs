//! Node configuration.
//!
//! [`NodeConfig`] is the full, serializable configuration. Loading and CLI
//! overrides are handled by the command layer; this module owns the sections,
//! their defaults and [`NodeConfig::resolve`], which fills in everything left
//! to auto-detection exactly once.

mod coordinator;
mod duration;
mod host;
mod ipfs;
mod network;
mod node;
mod schedule;
mod storage;
mod telemetry;

pub use coordinator::{AuthConfig, CoordinatorConfig, REDACTED};
pub use host::{HostInfo, free_space};
pub use ipfs::IpfsConfig;
pub use network::NetworkConfig;
pub use node::{NodeIdentityConfig, generate_node_name, region_from_timezone};
pub use schedule::{IntervalsConfig, TasksConfig};
pub use storage::{StorageConfig, usable_capacity_gb};
pub use telemetry::{LogConfig, MetricsConfig};

use crate::{
    constants::{LEGACY_AUTH_TOKEN_VAR, LEGACY_COORDINATOR_ADDR_VAR},
    dirs::DataDirs,
};
use eyre::{Result, ensure};
use serde::{Deserialize, Serialize};

/// Complete node configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub auth: AuthConfig,
    pub coordinator: CoordinatorConfig,
    pub ipfs: IpfsConfig,
    pub node: NodeIdentityConfig,
    pub storage: StorageConfig,
    pub intervals: IntervalsConfig,
    pub network: NetworkConfig,
    pub tasks: TasksConfig,
    pub log: LogConfig,
    pub metrics: MetricsConfig,
}

impl NodeConfig {
    /// Fill fields that are still empty from the legacy environment variables.
    pub fn apply_legacy_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.auth.token.is_empty()
            && let Some(token) = lookup(LEGACY_AUTH_TOKEN_VAR)
        {
            self.auth.token = token;
        }
        if self.coordinator.address.is_empty()
            && let Some(address) = lookup(LEGACY_COORDINATOR_ADDR_VAR)
        {
            self.coordinator.address = address;
        }
    }

    /// Resolve every auto-detected field against the running host.
    pub fn resolve(&mut self, dirs: &DataDirs) {
        let data_dir = self.ipfs.data_dir.clone().unwrap_or_else(|| dirs.ipfs_dir());
        self.resolve_with(dirs, &HostInfo::current(&data_dir));
    }

    /// Resolve against the given host facts.
    pub fn resolve_with(&mut self, dirs: &DataDirs, host: &HostInfo) {
        if self.ipfs.data_dir.is_none() {
            self.ipfs.data_dir = Some(dirs.ipfs_dir());
        }
        self.node.resolve(host);
        self.storage.resolve(host);
    }

    /// Checks for settings the node cannot start without.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            !self.auth.token.trim().is_empty(),
            "auth.token is required (set it in the config file, CAIRN_AUTH__TOKEN or {LEGACY_AUTH_TOKEN_VAR})"
        );
        ensure!(
            !self.coordinator.address.trim().is_empty(),
            "coordinator.address must not be empty"
        );
        ensure!(!self.ipfs.api_url.trim().is_empty(), "ipfs.api_url must not be empty");
        ensure!(!self.intervals.heartbeat.is_zero(), "intervals.heartbeat must be positive");
        ensure!(!self.intervals.poll.is_zero(), "intervals.poll must be positive");
        ensure!(
            self.tasks.max_concurrent_pins > 0,
            "tasks.max_concurrent_pins must be at least 1"
        );
        Ok(())
    }

    /// Copy safe to print: secrets are replaced by a placeholder.
    pub fn redacted(&self) -> Self {
        Self {
            auth: self.auth.redacted(),
            ..self.clone()
        }
    }
}
