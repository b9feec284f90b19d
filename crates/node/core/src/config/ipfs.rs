//! Local IPFS daemon settings.

use crate::constants::DEFAULT_IPFS_API_URL;
use cairn_ipfs_daemon::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_READY_INTERVAL, DEFAULT_READY_TIMEOUT, DEFAULT_STOP_TIMEOUT,
};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IpfsConfig {
    /// Control API base URL.
    pub api_url: String,

    /// Directory holding the repository. Defaults to `<datadir>/ipfs`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// Daemon executable. Looked up on `PATH` when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binary: Option<PathBuf>,

    #[serde(with = "super::duration")]
    pub ready_timeout: Duration,

    #[serde(with = "super::duration")]
    pub ready_interval: Duration,

    /// Time between the interrupt and a forced kill on shutdown.
    #[serde(with = "super::duration")]
    pub stop_timeout: Duration,

    /// Upper bound for dialing one peer address.
    #[serde(with = "super::duration")]
    pub connect_timeout: Duration,
}

impl Default for IpfsConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_IPFS_API_URL.to_string(),
            data_dir: None,
            binary: None,
            ready_timeout: DEFAULT_READY_TIMEOUT,
            ready_interval: DEFAULT_READY_INTERVAL,
            stop_timeout: DEFAULT_STOP_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}
