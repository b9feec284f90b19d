//! Config command - show where configuration lives and what it resolves to.

use crate::cli::ConfigArgs;
use eyre::{Result, WrapErr};

/// Run the config command.
///
/// Without `--show` only the configuration file location is printed.
pub fn run(args: ConfigArgs) -> Result<()> {
    let loaded = args.source.load(&args.overrides)?;

    if !args.show {
        let status = if loaded.path.exists() { "" } else { " (not found, using defaults)" };
        println!("{}{status}", loaded.path.display());
        return Ok(());
    }

    let rendered = toml::to_string_pretty(&loaded.config.redacted())
        .wrap_err("failed to render configuration")?;
    print!("{rendered}");
    Ok(())
}
