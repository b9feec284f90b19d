//! Supervision of the external daemon process.

use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cairn_ipfs_api::{PeerInfo, StorageApi};
use parking_lot::{Mutex, RwLock};
use tokio::process::{Child, Command};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::install;
use crate::readiness::wait_until_ready;
use crate::repo::{self, SwarmKey};
use crate::state::StateCell;
use crate::{DaemonConfig, DaemonError, DaemonLifecycle, DaemonResult, DaemonState, IsolationPolicy};

/// Owns the daemon process and its lifecycle state.
///
/// All methods take `&self`; the manager is shared behind an `Arc` between the
/// agent and the readiness watcher.
pub struct DaemonManager {
    config: DaemonConfig,
    api: Arc<dyn StorageApi>,
    state: Arc<StateCell>,
    binary: RwLock<Option<PathBuf>>,
    process: Mutex<Option<Child>>,
    watcher: Mutex<Option<CancellationToken>>,
}

impl DaemonManager {
    pub fn new(config: DaemonConfig, api: Arc<dyn StorageApi>) -> Self {
        Self {
            config,
            api,
            state: Arc::new(StateCell::new(DaemonState::Uninstalled)),
            binary: RwLock::new(None),
            process: Mutex::new(None),
            watcher: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &DaemonConfig {
        &self.config
    }

    pub fn state(&self) -> DaemonState {
        self.state.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<DaemonState> {
        self.state.subscribe()
    }

    /// Resolved binary path, once [`ensure_installed`](Self::ensure_installed) succeeded.
    pub fn binary(&self) -> Option<PathBuf> {
        self.binary.read().clone()
    }

    /// PID of the launched daemon, if one is tracked.
    pub fn pid(&self) -> Option<u32> {
        self.process.lock().as_ref().and_then(Child::id)
    }

    /// Block until the lifecycle reaches `target`.
    ///
    /// Fails if the lifecycle enters `Failed` first or `cancel` fires.
    pub async fn wait_for_state(
        &self,
        target: DaemonState,
        cancel: &CancellationToken,
    ) -> DaemonResult<()> {
        let mut rx = self.state.subscribe();
        let reached = tokio::select! {
            _ = cancel.cancelled() => return Err(DaemonError::Cancelled),
            result = rx.wait_for(|s| *s == target || s.is_failed()) => {
                result.map(|state| *state).map_err(|_| DaemonError::Failed)?
            }
        };
        if reached == target {
            Ok(())
        } else {
            Err(DaemonError::Failed)
        }
    }

    pub async fn ensure_installed(&self) -> DaemonResult<PathBuf> {
        if let Some(path) = self.binary() {
            return Ok(path);
        }
        let path = self.record(install::resolve_binary(self.config.binary.as_deref()))?;
        *self.binary.write() = Some(path.clone());
        self.state.advance(DaemonState::RepoUninitialized)?;
        Ok(path)
    }

    pub async fn initialize_repo(&self, cancel: &CancellationToken) -> DaemonResult<()> {
        let binary = self.require_binary()?;
        let repo = self.config.repo_path();

        if self.config.repo_config().exists() {
            info!(path = %repo.display(), "IPFS repository already initialized");
            return self.state.advance(DaemonState::RepoReady);
        }

        self.record(
            std::fs::create_dir_all(&self.config.data_dir)
                .map_err(|e| DaemonError::io("create data directory", &self.config.data_dir, e)),
        )?;

        info!(path = %repo.display(), "initializing IPFS repository");
        let output = self.record(self.run(&binary, &["init"], None, cancel).await)?;
        debug!(stdout = %String::from_utf8_lossy(&output.stdout).trim(), "ipfs init");
        info!("IPFS repository initialized");

        self.state.advance(DaemonState::RepoReady)
    }

    pub async fn configure_private_network(
        &self,
        swarm_key: Option<&str>,
        bootstrap_peers: &[String],
    ) -> DaemonResult<()> {
        let config_path = self.config.repo_config();
        if !config_path.exists() {
            return Err(DaemonError::InvalidTransition {
                from: self.state(),
                to: DaemonState::Configured,
            });
        }

        match swarm_key.map(str::trim).filter(|k| !k.is_empty()) {
            Some(raw) => {
                let key = self.record(SwarmKey::parse(raw))?;
                let path = self.config.swarm_key_path();
                self.record(repo::write_swarm_key(&path, &key))?;
                info!(path = %path.display(), "swarm key configured");
            }
            None => match self.config.isolation {
                IsolationPolicy::Required => {
                    self.state.fail();
                    return Err(DaemonError::IsolationRequired);
                }
                IsolationPolicy::Optional => {
                    warn!("no swarm key configured, the node will join the public IPFS network");
                }
            },
        }

        if !bootstrap_peers.is_empty() {
            self.record(repo::replace_bootstrap_peers(&config_path, bootstrap_peers))?;
            info!(count = bootstrap_peers.len(), "bootstrap peers configured");
        }

        self.state.advance(DaemonState::Configured)
    }

    pub async fn start_daemon(&self, cancel: &CancellationToken) -> DaemonResult<()> {
        let binary = self.require_binary()?;

        {
            let mut process = self.process.lock();
            if let Some(child) = process.as_mut() {
                match child.try_wait() {
                    Ok(None) => {
                        info!(pid = child.id(), "IPFS daemon already running");
                        return Ok(());
                    }
                    Ok(Some(status)) => warn!(%status, "IPFS daemon exited, relaunching"),
                    Err(e) => warn!(error = %e, "lost track of IPFS daemon, relaunching"),
                }
                *process = None;
                if self.state().is_running() {
                    self.state.transition(DaemonState::Stopping)?;
                    self.state.transition(DaemonState::Stopped)?;
                }
            }

            self.state.transition(DaemonState::Starting)?;

            let child = self
                .command(&binary)
                .arg("daemon")
                .args(&self.config.daemon_args)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::inherit())
                .kill_on_drop(true)
                .spawn()
                .map_err(|e| DaemonError::io("spawn", &binary, e));
            let child = self.record(child)?;

            info!(pid = child.id(), "IPFS daemon started");
            *process = Some(child);
        }

        self.spawn_watcher(cancel.child_token());
        Ok(())
    }

    pub async fn stop_daemon(&self, cancel: &CancellationToken) -> DaemonResult<()> {
        if let Some(watcher) = self.watcher.lock().take() {
            watcher.cancel();
        }

        let Some(mut child) = self.process.lock().take() else {
            return Ok(());
        };

        let _ = self.state.transition(DaemonState::Stopping);
        info!(pid = child.id(), "stopping IPFS daemon");

        if let Err(e) = interrupt(&mut child) {
            warn!(error = %e, "failed to interrupt IPFS daemon");
        }

        let exited = tokio::select! {
            status = child.wait() => Some(status),
            _ = tokio::time::sleep(self.config.stop_timeout) => {
                warn!(timeout = ?self.config.stop_timeout, "IPFS daemon did not stop gracefully, forcing kill");
                None
            }
            _ = cancel.cancelled() => {
                warn!("stop cancelled, forcing kill");
                None
            }
        };

        let result = match exited {
            Some(Ok(status)) => {
                info!(%status, "IPFS daemon stopped");
                Ok(())
            }
            Some(Err(e)) => Err(DaemonError::io("wait for", Path::new("ipfs daemon"), e)),
            None => child
                .kill()
                .await
                .map_err(|e| DaemonError::io("kill", Path::new("ipfs daemon"), e)),
        };

        let _ = self.state.transition(DaemonState::Stopped);
        result
    }

    pub async fn peer_info(&self, cancel: &CancellationToken) -> DaemonResult<PeerInfo> {
        if self.state() != DaemonState::Ready {
            let version = wait_until_ready(self.api.as_ref(), self.config.readiness, cancel).await?;
            if let Ok(true) = self.state.transition(DaemonState::Ready) {
                info!(%version, "IPFS daemon is ready");
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => Err(DaemonError::Cancelled),
            info = self.api.id() => Ok(info?),
        }
    }

    pub async fn connect_to_peer(&self, address: &str, cancel: &CancellationToken) -> DaemonResult<()> {
        let binary = self.require_binary()?;
        self.run(
            &binary,
            &["swarm", "connect", address],
            Some(self.config.connect_timeout),
            cancel,
        )
        .await?;
        info!(peer = address, "connected to peer");
        Ok(())
    }

    fn spawn_watcher(&self, token: CancellationToken) {
        if let Some(previous) = self.watcher.lock().replace(token.clone()) {
            previous.cancel();
        }

        let api = Arc::clone(&self.api);
        let state = Arc::clone(&self.state);
        let readiness = self.config.readiness;

        tokio::spawn(async move {
            match wait_until_ready(api.as_ref(), readiness, &token).await {
                Ok(version) => {
                    if let Ok(true) = state.transition(DaemonState::Ready) {
                        info!(%version, "IPFS daemon is ready");
                    }
                }
                Err(DaemonError::Cancelled) => debug!("readiness watcher cancelled"),
                Err(e) => error!(error = %e, "IPFS daemon failed to start within timeout"),
            }
        });
    }

    fn require_binary(&self) -> DaemonResult<PathBuf> {
        if self.state().is_failed() {
            return Err(DaemonError::Failed);
        }
        self.binary().ok_or(DaemonError::NotInstalled)
    }

    /// Mark the lifecycle failed on any error other than cancellation.
    fn record<T>(&self, result: DaemonResult<T>) -> DaemonResult<T> {
        if let Err(e) = &result {
            if !matches!(e, DaemonError::Cancelled) {
                self.state.fail();
            }
        }
        result
    }

    fn command(&self, binary: &Path) -> Command {
        let mut command = Command::new(binary);
        command.env("IPFS_PATH", self.config.repo_path());
        command
    }

    /// Run a one-shot daemon command, bounded by `timeout` and `cancel`.
    async fn run(
        &self,
        binary: &Path,
        args: &[&str],
        timeout: Option<Duration>,
        cancel: &CancellationToken,
    ) -> DaemonResult<Output> {
        let label = args.join(" ");
        let child = self
            .command(binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| DaemonError::io("spawn", binary, e))?;

        let timeout_label = label.clone();
        let wait = async move {
            let output = match timeout {
                Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                    Ok(output) => output,
                    Err(_) => {
                        return Err(DaemonError::CommandTimeout {
                            command: timeout_label,
                            timeout: limit,
                        });
                    }
                },
                None => child.wait_with_output().await,
            };
            output.map_err(|e| DaemonError::io("wait for", binary, e))
        };

        let output = tokio::select! {
            _ = cancel.cancelled() => return Err(DaemonError::Cancelled),
            output = wait => output?,
        };

        if !output.status.success() {
            return Err(DaemonError::Command {
                command: label,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output)
    }
}

impl std::fmt::Debug for DaemonManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DaemonManager")
            .field("config", &self.config)
            .field("state", &self.state())
            .field("pid", &self.pid())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl DaemonLifecycle for DaemonManager {
    async fn ensure_installed(&self) -> DaemonResult<PathBuf> {
        DaemonManager::ensure_installed(self).await
    }

    async fn initialize_repo(&self, cancel: &CancellationToken) -> DaemonResult<()> {
        DaemonManager::initialize_repo(self, cancel).await
    }

    async fn configure_private_network(
        &self,
        swarm_key: Option<&str>,
        bootstrap_peers: &[String],
    ) -> DaemonResult<()> {
        DaemonManager::configure_private_network(self, swarm_key, bootstrap_peers).await
    }

    async fn start_daemon(&self, cancel: &CancellationToken) -> DaemonResult<()> {
        DaemonManager::start_daemon(self, cancel).await
    }

    async fn stop_daemon(&self, cancel: &CancellationToken) -> DaemonResult<()> {
        DaemonManager::stop_daemon(self, cancel).await
    }

    async fn peer_info(&self, cancel: &CancellationToken) -> DaemonResult<PeerInfo> {
        DaemonManager::peer_info(self, cancel).await
    }

    async fn connect_to_peer(&self, address: &str, cancel: &CancellationToken) -> DaemonResult<()> {
        DaemonManager::connect_to_peer(self, address, cancel).await
    }

    fn state(&self) -> DaemonState {
        DaemonManager::state(self)
    }
}

#[cfg(unix)]
fn interrupt(child: &mut Child) -> std::io::Result<()> {
    let Some(pid) = child.id() else {
        // Already reaped.
        return Ok(());
    };
    let pid = libc::pid_t::try_from(pid).map_err(std::io::Error::other)?;
    // SAFETY: `pid` is a child we spawned and have not reaped, so it cannot have been recycled.
    let rc = unsafe { libc::kill(pid, libc::SIGINT) };
    if rc == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn interrupt(child: &mut Child) -> std::io::Result<()> {
    child.start_kill()
}
