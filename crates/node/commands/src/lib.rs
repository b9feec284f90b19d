//! CLI commands for the cairn storage node.
//!
//! - [`Cli`] - top-level parser
//! - [`Commands`] - available subcommands
//!
//! Configuration is loaded with Figment, highest priority first:
//!
//! 1. CLI arguments
//! 2. Config file (TOML, `<datadir>/config.toml` unless `--config` is given)
//! 3. Environment variables (`CAIRN_` prefix, `__` between nested keys)
//! 4. Defaults

mod cli;
pub mod commands;
pub mod config;

pub use cli::{Cli, Commands, ConfigArgs, ConfigSourceArgs, NodeArgs, OverrideArgs};

use clap::Parser;
use color_eyre::eyre;

/// Parse the process arguments and run the selected command.
///
/// This is the main entry point called from the binary.
pub async fn run() -> eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Node(args) => commands::node::run(&cli.logs, args).await,
        Commands::Config(args) => commands::config::run(args),
    }
}
