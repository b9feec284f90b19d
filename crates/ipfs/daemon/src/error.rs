use std::time::Duration;

use cairn_ipfs_api::ApiError;
use thiserror::Error;

use crate::DaemonState;

/// Result alias for daemon lifecycle operations.
pub type DaemonResult<T> = Result<T, DaemonError>;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error(
        "IPFS binary not found: install kubo manually or make `ipfs` available on PATH (platform: {os}/{arch})"
    )]
    BinaryNotFound { os: String, arch: String },

    #[error("no IPFS distribution for platform {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    #[error("IPFS binary has not been resolved; ensure_installed must run first")]
    NotInstalled,

    #[error("failed to {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`ipfs {command}` exited with {status}: {stderr}")]
    Command {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("`ipfs {command}` did not finish within {timeout:?}")]
    CommandTimeout { command: String, timeout: Duration },

    #[error("invalid swarm key: {0}")]
    InvalidSwarmKey(String),

    #[error("network isolation is required but no swarm key was supplied")]
    IsolationRequired,

    #[error("invalid repository config: {0}")]
    RepoConfig(String),

    #[error("IPFS daemon not ready within {timeout:?}")]
    NotReady { timeout: Duration },

    #[error("invalid daemon state transition {from} -> {to}")]
    InvalidTransition { from: DaemonState, to: DaemonState },

    #[error("IPFS daemon lifecycle has failed")]
    Failed,

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("operation cancelled")]
    Cancelled,
}

impl DaemonError {
    pub(crate) fn io(action: &'static str, path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.display().to_string(),
            source,
        }
    }
}
