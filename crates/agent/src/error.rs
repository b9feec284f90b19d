use cairn_coordinator::CoordinatorError;
use cairn_ipfs_daemon::DaemonError;
use thiserror::Error;

pub type AgentResult<T> = Result<T, AgentError>;

/// Fatal setup failures. Anything after registration is logged, not returned.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("invalid agent configuration: {0}")]
    InvalidConfig(&'static str),

    #[error("failed to ensure IPFS is installed")]
    Install(#[source] DaemonError),

    #[error("failed to initialize IPFS repository")]
    InitializeRepo(#[source] DaemonError),

    #[error("failed to configure private network")]
    ConfigureNetwork(#[source] DaemonError),

    #[error("failed to start IPFS daemon")]
    StartDaemon(#[source] DaemonError),

    #[error("failed to get peer info")]
    PeerInfo(#[source] DaemonError),

    #[error("failed to connect to coordinator")]
    Connect(#[source] CoordinatorError),

    #[error("initial registration failed")]
    Register(#[source] CoordinatorError),

    /// Shutdown was requested before setup completed.
    #[error("setup cancelled")]
    Cancelled,
}

impl AgentError {
    /// Wrap a daemon error for `stage`, keeping cancellation distinct.
    pub(crate) fn daemon(stage: fn(DaemonError) -> Self) -> impl FnOnce(DaemonError) -> Self {
        move |e| match e {
            DaemonError::Cancelled => Self::Cancelled,
            e => stage(e),
        }
    }
}
