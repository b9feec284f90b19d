//! Node infrastructure for the cairn storage node.
//!
//! - [`args`] - CLI argument structs shared by every command
//! - [`config`] - configuration sections, defaults and host detection
//! - [`dirs`] - data directory layout
//! - [`logging`] - tracing subscriber setup
//! - [`version`] - version information

pub mod args;
pub mod config;
pub mod constants;
pub mod dirs;
pub mod logging;
pub mod version;
