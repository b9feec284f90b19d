//! Repository files: existence check, swarm key, bootstrap list.

use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::{DaemonError, DaemonResult};

const SWARM_KEY_HEADER: &str = "/key/swarm/psk/1.0.0/";
const SWARM_KEY_ENCODING: &str = "/base16/";
const SWARM_KEY_HEX_LEN: usize = 64;
const BOOTSTRAP_KEY: &str = "Bootstrap";

/// A validated pre-shared swarm key.
#[derive(Clone, PartialEq, Eq)]
pub struct SwarmKey {
    hex: String,
}

impl SwarmKey {
    /// Parse the three-line `swarm.key` format:
    ///
    /// ```text
    /// /key/swarm/psk/1.0.0/
    /// /base16/
    /// <64 hex characters>
    /// ```
    pub fn parse(raw: &str) -> DaemonResult<Self> {
        let mut lines = raw.lines().map(str::trim).filter(|l| !l.is_empty());

        if lines.next() != Some(SWARM_KEY_HEADER) {
            return Err(DaemonError::InvalidSwarmKey(format!(
                "expected header {SWARM_KEY_HEADER}"
            )));
        }
        match lines.next() {
            Some(SWARM_KEY_ENCODING) => {}
            Some(other) => {
                return Err(DaemonError::InvalidSwarmKey(format!(
                    "unsupported encoding {other}"
                )));
            }
            None => return Err(DaemonError::InvalidSwarmKey("missing encoding".into())),
        }

        let hex = lines
            .next()
            .ok_or_else(|| DaemonError::InvalidSwarmKey("missing key material".into()))?;
        if hex.len() != SWARM_KEY_HEX_LEN || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(DaemonError::InvalidSwarmKey(format!(
                "key material must be {SWARM_KEY_HEX_LEN} hex characters"
            )));
        }
        if lines.next().is_some() {
            return Err(DaemonError::InvalidSwarmKey("trailing data".into()));
        }

        Ok(Self {
            hex: hex.to_ascii_lowercase(),
        })
    }

    /// File contents in the canonical layout.
    pub fn to_file_contents(&self) -> String {
        format!("{SWARM_KEY_HEADER}\n{SWARM_KEY_ENCODING}\n{}\n", self.hex)
    }
}

impl std::fmt::Debug for SwarmKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwarmKey").finish_non_exhaustive()
    }
}

/// Write the key with owner-only permissions.
pub(crate) fn write_swarm_key(path: &Path, key: &SwarmKey) -> DaemonResult<()> {
    fs::write(path, key.to_file_contents())
        .map_err(|e| DaemonError::io("write swarm key", path, e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))
            .map_err(|e| DaemonError::io("restrict permissions on", path, e))?;
    }

    Ok(())
}

/// Replace the repository's bootstrap list with `peers`.
///
/// Every existing entry, including the default public bootstrap nodes, is
/// dropped. All other config keys are preserved.
pub(crate) fn replace_bootstrap_peers(config_path: &Path, peers: &[String]) -> DaemonResult<()> {
    let raw = fs::read_to_string(config_path)
        .map_err(|e| DaemonError::io("read", config_path, e))?;
    let mut config: Value =
        serde_json::from_str(&raw).map_err(|e| DaemonError::RepoConfig(e.to_string()))?;

    let object = config
        .as_object_mut()
        .ok_or_else(|| DaemonError::RepoConfig("top level is not an object".into()))?;
    object.insert(
        BOOTSTRAP_KEY.to_string(),
        Value::Array(peers.iter().cloned().map(Value::String).collect()),
    );

    let updated =
        serde_json::to_string_pretty(&config).map_err(|e| DaemonError::RepoConfig(e.to_string()))?;
    fs::write(config_path, updated).map_err(|e| DaemonError::io("write", config_path, e))
}
