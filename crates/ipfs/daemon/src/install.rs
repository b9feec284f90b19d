//! Locating the daemon binary.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::{DaemonError, DaemonResult};

/// Executable name searched on `PATH`.
pub const BINARY_NAME: &str = "ipfs";

/// Host platform in the naming used by kubo release archives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Distribution {
    pub os: &'static str,
    pub arch: &'static str,
}

impl Distribution {
    /// Map the build target to a release platform.
    pub fn current() -> DaemonResult<Self> {
        Self::for_target(std::env::consts::OS, std::env::consts::ARCH)
    }

    pub fn for_target(os: &str, arch: &str) -> DaemonResult<Self> {
        let unsupported = || DaemonError::UnsupportedPlatform {
            os: os.to_string(),
            arch: arch.to_string(),
        };

        let os = match os {
            "linux" => "linux",
            "macos" => "darwin",
            "windows" => "windows",
            "freebsd" => "freebsd",
            _ => return Err(unsupported()),
        };
        let arch = match arch {
            "x86_64" => "amd64",
            "aarch64" => "arm64",
            "x86" => "386",
            "arm" => "arm",
            _ => return Err(unsupported()),
        };

        Ok(Self { os, arch })
    }
}

/// Resolve the daemon binary: explicit path first, then `PATH`.
///
/// Acquisition is a capability check only. When no binary is available the
/// error names the host platform so the operator knows which release to install.
pub fn resolve_binary(explicit: Option<&Path>) -> DaemonResult<PathBuf> {
    if let Some(path) = explicit {
        if path.is_file() {
            info!(path = %path.display(), "IPFS binary found");
            return Ok(path.to_path_buf());
        }
        warn!(path = %path.display(), "configured IPFS binary does not exist, searching PATH");
    }

    if let Ok(path) = which::which(BINARY_NAME) {
        info!(path = %path.display(), "IPFS binary found in PATH");
        return Ok(path);
    }

    acquire()
}

fn acquire() -> DaemonResult<PathBuf> {
    let dist = Distribution::current()?;
    info!(os = dist.os, arch = dist.arch, "IPFS binary not found");
    Err(DaemonError::BinaryNotFound {
        os: dist.os.to_string(),
        arch: dist.arch.to_string(),
    })
}
