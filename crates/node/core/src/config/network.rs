//! Private network settings.

use cairn_ipfs_daemon::IsolationPolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// File holding the shared swarm key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swarm_key_file: Option<PathBuf>,

    /// Multiaddresses that replace the daemon's default bootstrap list.
    pub bootstrap_peers: Vec<String>,

    /// Whether running without a swarm key is an error.
    pub isolation: IsolationPolicy,
}
