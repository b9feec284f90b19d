//! Manager configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Name of the repository directory inside the data directory.
pub const REPO_DIR_NAME: &str = ".ipfs";

/// Interval between readiness probes.
pub const DEFAULT_READY_INTERVAL: Duration = Duration::from_secs(1);

/// Total time to wait for the control API to answer.
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(30);

/// Grace period between the interrupt and a forced kill.
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bound for a single `swarm connect`.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Whether a private swarm key is mandatory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IsolationPolicy {
    /// A missing key is accepted and the node joins the public network.
    #[default]
    Optional,
    /// A missing key aborts setup.
    Required,
}

/// Readiness polling protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessConfig {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_READY_INTERVAL,
            timeout: DEFAULT_READY_TIMEOUT,
        }
    }
}

/// Everything the manager needs to supervise one daemon.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// Explicit binary path. When unset or missing, `ipfs` is looked up on `PATH`.
    pub binary: Option<PathBuf>,
    /// Directory holding the repository.
    pub data_dir: PathBuf,
    pub readiness: ReadinessConfig,
    pub stop_timeout: Duration,
    pub connect_timeout: Duration,
    pub isolation: IsolationPolicy,
    /// Extra arguments for `ipfs daemon`.
    pub daemon_args: Vec<String>,
}

impl DaemonConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            binary: None,
            data_dir: data_dir.into(),
            readiness: ReadinessConfig::default(),
            stop_timeout: DEFAULT_STOP_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            isolation: IsolationPolicy::default(),
            daemon_args: vec!["--enable-pubsub-experiment".to_string()],
        }
    }

    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = Some(binary.into());
        self
    }

    pub fn with_readiness(mut self, readiness: ReadinessConfig) -> Self {
        self.readiness = readiness;
        self
    }

    pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }

    pub fn with_isolation(mut self, isolation: IsolationPolicy) -> Self {
        self.isolation = isolation;
        self
    }

    /// Repository root, exported to every daemon command as `IPFS_PATH`.
    pub fn repo_path(&self) -> PathBuf {
        self.data_dir.join(REPO_DIR_NAME)
    }

    /// The repository's config file. Its presence marks an initialized repo.
    pub fn repo_config(&self) -> PathBuf {
        repo_config_in(&self.repo_path())
    }

    pub fn swarm_key_path(&self) -> PathBuf {
        self.repo_path().join("swarm.key")
    }
}

pub(crate) fn repo_config_in(repo: &Path) -> PathBuf {
    repo.join("config")
}
