//! Version information for the cairn node.

use std::sync::LazyLock;

/// The version string from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The git commit SHA, when provided by the build environment.
pub const GIT_SHA: &str = match option_env!("CAIRN_GIT_SHA") {
    Some(sha) => sha,
    None => "unknown",
};

/// Multi-line version shown by `--version`.
pub static LONG_VERSION: LazyLock<String> =
    LazyLock::new(|| format!("{VERSION}\nCommit SHA: {GIT_SHA}"));
