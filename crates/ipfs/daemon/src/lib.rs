//! Supervision of the local IPFS daemon.
//!
//! The [`DaemonManager`] walks the daemon through its setup lifecycle:
//! locate the binary, initialize the repository, apply private-network
//! settings, launch the process and wait for the control API. It also owns
//! graceful shutdown and peer-connection commands.
//!
//! Progress is published through a [`DaemonState`] watch channel so other
//! components can wait on it without polling.

mod config;
mod error;
mod install;
mod manager;
mod readiness;
mod repo;
mod state;

use std::path::PathBuf;

use async_trait::async_trait;
use cairn_ipfs_api::PeerInfo;
use tokio_util::sync::CancellationToken;

pub use config::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_READY_INTERVAL, DEFAULT_READY_TIMEOUT, DEFAULT_STOP_TIMEOUT,
    DaemonConfig, IsolationPolicy, REPO_DIR_NAME, ReadinessConfig,
};
pub use error::{DaemonError, DaemonResult};
pub use install::{BINARY_NAME, Distribution, resolve_binary};
pub use manager::DaemonManager;
pub use readiness::wait_until_ready;
pub use repo::SwarmKey;
pub use state::DaemonState;

/// The daemon operations the agent drives.
///
/// Implemented by [`DaemonManager`]; tests substitute scripted fakes.
#[async_trait]
#[auto_impl::auto_impl(&, Arc)]
pub trait DaemonLifecycle: Send + Sync {
    /// Locate the binary. Idempotent.
    async fn ensure_installed(&self) -> DaemonResult<PathBuf>;

    /// Create the repository unless one already exists.
    async fn initialize_repo(&self, cancel: &CancellationToken) -> DaemonResult<()>;

    /// Install the swarm key and replace the bootstrap list.
    async fn configure_private_network(
        &self,
        swarm_key: Option<&str>,
        bootstrap_peers: &[String],
    ) -> DaemonResult<()>;

    /// Launch the daemon. Returns once the process is spawned; readiness is
    /// reported asynchronously through the state channel.
    async fn start_daemon(&self, cancel: &CancellationToken) -> DaemonResult<()>;

    /// Interrupt the daemon, force-killing it after the stop timeout.
    async fn stop_daemon(&self, cancel: &CancellationToken) -> DaemonResult<()>;

    /// This node's identity, waiting for readiness first if needed.
    async fn peer_info(&self, cancel: &CancellationToken) -> DaemonResult<PeerInfo>;

    /// Dial a single multiaddress.
    async fn connect_to_peer(&self, address: &str, cancel: &CancellationToken) -> DaemonResult<()>;

    fn state(&self) -> DaemonState;
}
