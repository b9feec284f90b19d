//! Facts about the host used to fill in unset identity and capacity fields.

use std::path::Path;

/// Host facts consulted during resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostInfo {
    pub hostname: Option<String>,
    pub username: Option<String>,
    /// Value of `TZ`.
    pub timezone: Option<String>,
    /// Bytes available to unprivileged users on the data directory's filesystem.
    pub free_bytes: Option<u64>,
}

impl HostInfo {
    /// Probe the running host. `data_dir` need not exist yet.
    pub fn current(data_dir: &Path) -> Self {
        Self {
            hostname: hostname::get()
                .ok()
                .map(|h| h.to_string_lossy().into_owned())
                .filter(|h| !h.is_empty()),
            username: ["USER", "USERNAME", "LOGNAME"]
                .iter()
                .find_map(|var| std::env::var(var).ok().filter(|v| !v.is_empty())),
            timezone: std::env::var("TZ").ok().filter(|tz| !tz.is_empty()),
            free_bytes: free_space(data_dir),
        }
    }
}

/// Free space of the filesystem holding `path`, or of its nearest existing
/// ancestor.
pub fn free_space(path: &Path) -> Option<u64> {
    let existing = path.ancestors().find(|p| p.exists())?;
    fs2::available_space(existing).ok()
}
