//! Logging configuration for the cairn node.

use crate::args::LogArgs;
use eyre::{Result, eyre};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Initialize logging from command line arguments and the configured level.
///
/// The filter is built with the following precedence:
/// 1. If `--quiet` is set, only errors are shown
/// 2. Otherwise `RUST_LOG` if set, else `level` raised by `-v` / `-vv`
/// 3. Directives from `--log.filter` are appended
pub fn init_logging(args: &LogArgs, level: &str) -> Result<()> {
    let filter = build_filter(args, level, std::env::var("RUST_LOG").ok().as_deref())?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = if args.json {
        builder.json().try_init()
    } else {
        builder.without_time().try_init()
    };
    result.map_err(|e| eyre!("failed to install log subscriber: {e}"))
}

/// Build the filter without installing it.
fn build_filter(args: &LogArgs, level: &str, rust_log: Option<&str>) -> Result<EnvFilter> {
    if args.quiet {
        return Ok(EnvFilter::new("error"));
    }

    let mut filter = match rust_log {
        Some(directives) if !directives.trim().is_empty() => EnvFilter::new(directives),
        _ => EnvFilter::new(effective_level(level, args.verbosity)?.to_string()),
    };

    if let Some(custom_filter) = &args.filter {
        for directive in custom_filter.split(',').filter(|d| !d.trim().is_empty()) {
            let directive = directive
                .trim()
                .parse()
                .map_err(|e| eyre!("invalid log filter directive {directive:?}: {e}"))?;
            filter = filter.add_directive(directive);
        }
    }

    Ok(filter)
}

/// The configured level, raised to debug by `-v` and to trace by `-vv`.
fn effective_level(level: &str, verbosity: u8) -> Result<LevelFilter> {
    let configured: LevelFilter = level
        .parse()
        .map_err(|_| eyre!("invalid log level {level:?}"))?;
    let requested = match verbosity {
        0 => LevelFilter::ERROR,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    Ok(configured.max(requested))
}
