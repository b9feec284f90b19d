//! CLI argument structs for node infrastructure.
//!
//! These are shared by every subcommand. Settings that also live in the
//! configuration file are overridden per command, see `cairn-node-commands`.

mod datadir;
mod log;

pub use datadir::DataDirArgs;
pub use log::LogArgs;
