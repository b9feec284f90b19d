use std::sync::Arc;

use cairn_coordinator::{CoordinatorConnector, RegisteredSession};
use cairn_ipfs_api::StorageApi;
use cairn_ipfs_daemon::DaemonLifecycle;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::heartbeat::heartbeat_loop;
use crate::mesh::form_mesh;
use crate::metrics::AgentMetrics;
use crate::tasks::{PinPool, poll_loop};
use crate::{AgentConfig, AgentError, AgentResult, AgentState};

/// Drives one node from daemon setup through steady-state coordination.
pub struct Agent<K> {
    config: AgentConfig,
    daemon: Arc<dyn DaemonLifecycle>,
    storage: Arc<dyn StorageApi>,
    connector: K,
    state: watch::Sender<AgentState>,
    metrics: AgentMetrics,
    #[cfg(test)]
    visited: parking_lot::Mutex<Vec<AgentState>>,
}

impl<K> Agent<K>
where
    K: CoordinatorConnector,
{
    pub fn new(
        config: AgentConfig,
        daemon: Arc<dyn DaemonLifecycle>,
        storage: Arc<dyn StorageApi>,
        connector: K,
    ) -> AgentResult<Self> {
        config.validate()?;
        let (state, _) = watch::channel(AgentState::Init);
        Ok(Self {
            config,
            daemon,
            storage,
            connector,
            state,
            metrics: AgentMetrics::default(),
            #[cfg(test)]
            visited: parking_lot::Mutex::default(),
        })
    }

    pub fn state(&self) -> AgentState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<AgentState> {
        self.state.subscribe()
    }

    /// Run until `shutdown` fires.
    ///
    /// Returns an error only for setup failures. A shutdown requested before
    /// setup completes is a clean exit.
    pub async fn run(&self, shutdown: CancellationToken) -> AgentResult<()> {
        let (session, registered_at) = match self.setup(&shutdown).await {
            Ok(registered) => registered,
            Err(AgentError::Cancelled) => {
                info!("shutdown requested during setup");
                self.set(AgentState::ShuttingDown);
                self.stop_daemon_if_launched().await;
                self.set(AgentState::Stopped);
                return Ok(());
            }
            Err(e) => {
                error!(error = %e, state = %self.state(), "node setup failed");
                self.stop_daemon_if_launched().await;
                self.set(AgentState::Aborted);
                return Err(e);
            }
        };
        let session = Arc::new(session);

        let mesh = form_mesh(self.daemon.as_ref(), &session, &shutdown).await;
        self.metrics.mesh_connected_peers.set(mesh.connected as f64);

        let pool = PinPool::new(
            Arc::clone(&self.storage),
            Arc::clone(&session),
            self.config.max_concurrent_pins,
            self.metrics.clone(),
        );
        if shutdown.is_cancelled() {
            info!("shutdown requested during mesh formation");
        } else {
            self.set(AgentState::Running);
            info!(node_id = %session.node_id(), "node agent running");

            tokio::join!(
                heartbeat_loop(
                    &session,
                    self.storage.as_ref(),
                    self.config.heartbeat_interval,
                    registered_at,
                    &shutdown,
                    &self.metrics,
                ),
                poll_loop(&pool, self.config.poll_interval, &shutdown, &self.metrics),
            );
        }

        self.set(AgentState::ShuttingDown);
        pool.shutdown(self.config.shutdown_grace).await;
        drop(pool);

        if let Err(e) = self.daemon.stop_daemon(&CancellationToken::new()).await {
            warn!(error = %e, "failed to stop IPFS daemon");
        }

        match Arc::try_unwrap(session) {
            Ok(session) => session.close(),
            Err(_) => debug!("coordinator session still held by abandoned pin tasks"),
        }

        self.set(AgentState::Stopped);
        info!("node agent stopped");
        Ok(())
    }

    async fn setup(
        &self,
        cancel: &CancellationToken,
    ) -> AgentResult<(RegisteredSession<K::Client>, Instant)> {
        self.set(AgentState::SettingUpDaemon);
        self.setup_daemon(cancel).await?;

        self.set(AgentState::AcquiringIdentity);
        let peer = self
            .daemon
            .peer_info(cancel)
            .await
            .map_err(AgentError::daemon(AgentError::PeerInfo))?;
        debug!(peer_id = %peer.id, addresses = peer.addresses.len(), "acquired peer identity");

        self.set(AgentState::Connecting);
        let client = tokio::select! {
            _ = cancel.cancelled() => return Err(AgentError::Cancelled),
            client = self.connector.connect() => client.map_err(AgentError::Connect)?,
        };

        self.set(AgentState::Registering);
        let registration = self.config.registration(peer);
        let session = tokio::select! {
            _ = cancel.cancelled() => return Err(AgentError::Cancelled),
            session = RegisteredSession::register(client, &registration) => {
                session.map_err(AgentError::Register)?
            }
        };
        let registered_at = Instant::now();
        self.set(AgentState::Registered);

        Ok((session, registered_at))
    }

    async fn setup_daemon(&self, cancel: &CancellationToken) -> AgentResult<()> {
        info!("setting up IPFS");
        checkpoint(cancel)?;
        self.daemon
            .ensure_installed()
            .await
            .map_err(AgentError::daemon(AgentError::Install))?;

        checkpoint(cancel)?;
        self.daemon
            .initialize_repo(cancel)
            .await
            .map_err(AgentError::daemon(AgentError::InitializeRepo))?;

        checkpoint(cancel)?;
        self.daemon
            .configure_private_network(
                self.config.swarm_key.as_deref(),
                &self.config.bootstrap_peers,
            )
            .await
            .map_err(AgentError::daemon(AgentError::ConfigureNetwork))?;

        checkpoint(cancel)?;
        self.daemon
            .start_daemon(cancel)
            .await
            .map_err(AgentError::daemon(AgentError::StartDaemon))?;

        info!("IPFS setup completed");
        Ok(())
    }

    async fn stop_daemon_if_launched(&self) {
        if !self.daemon.state().is_running() {
            return;
        }
        if let Err(e) = self.daemon.stop_daemon(&CancellationToken::new()).await {
            warn!(error = %e, "failed to stop IPFS daemon");
        }
    }

    fn set(&self, next: AgentState) {
        #[cfg(test)]
        self.visited.lock().push(next);
        let previous = self.state.send_replace(next);
        if previous != next {
            debug!(from = %previous, to = %next, "agent state transition");
        }
    }
}

impl<K> std::fmt::Debug for Agent<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("config", &self.config)
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

fn checkpoint(cancel: &CancellationToken) -> AgentResult<()> {
    if cancel.is_cancelled() {
        Err(AgentError::Cancelled)
    } else {
        Ok(())
    }
}
