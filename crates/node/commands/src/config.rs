//! Figment-based configuration loading.
//!
//! Configuration priority (highest wins):
//! 1. CLI arguments (applied after Figment load)
//! 2. Config file (TOML)
//! 3. Environment variables (`CAIRN_` prefix)
//! 4. Defaults
//!
//! The legacy `CAIRN_AUTH_TOKEN` and `CAIRN_COORDINATOR_ADDR` variables only
//! fill values that are still empty after the merge.

use crate::cli::{ConfigSourceArgs, OverrideArgs};
use cairn_node_core::{
    config::NodeConfig,
    constants::{ENV_NESTING_SEPARATOR, ENV_PREFIX},
    dirs::DataDirs,
};
use eyre::{Result, WrapErr};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

/// Load configuration from defaults, environment, and an optional config file.
///
/// A missing file is not an error. CLI overrides are applied separately.
pub fn load(config_path: Option<&Path>) -> Result<NodeConfig> {
    let mut figment = Figment::new()
        .merge(Serialized::defaults(NodeConfig::default()))
        .merge(Env::prefixed(ENV_PREFIX).split(ENV_NESTING_SEPARATOR));

    if let Some(path) = config_path
        && path.exists()
    {
        figment = figment.merge(Toml::file(path));
    }

    let mut config: NodeConfig = figment.extract().wrap_err("Failed to load configuration")?;
    config.apply_legacy_env(|var| std::env::var(var).ok().filter(|v| !v.is_empty()));
    Ok(config)
}

/// Everything a command needs to know about where the node keeps its state.
#[derive(Debug)]
pub struct LoadedConfig {
    pub dirs: DataDirs,
    /// The file that was consulted, whether or not it exists.
    pub path: PathBuf,
    pub config: NodeConfig,
}

impl ConfigSourceArgs {
    /// Configuration file to read.
    pub fn config_path(&self, dirs: &DataDirs) -> PathBuf {
        self.config.clone().unwrap_or_else(|| dirs.config_file())
    }

    /// Load, apply `overrides`, and resolve auto-detected values.
    pub fn load(&self, overrides: &OverrideArgs) -> Result<LoadedConfig> {
        let dirs = DataDirs::new(&self.datadir);
        let path = self.config_path(&dirs);
        if self.config.is_some() && !path.exists() {
            eyre::bail!("config file {} does not exist", path.display());
        }

        let mut config = load(Some(&path))?;
        overrides.apply(&mut config);
        config.resolve(&dirs);

        Ok(LoadedConfig { dirs, path, config })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_node_core::{args::DataDirArgs, constants::DEFAULT_COORDINATOR_ADDRESS};
    use figment::Jail;
    use std::time::Duration;

    fn source(jail: &Jail, config: Option<&str>) -> ConfigSourceArgs {
        ConfigSourceArgs {
            datadir: DataDirArgs {
                datadir: Some(jail.directory().to_path_buf()),
            },
            config: config.map(|c| jail.directory().join(c)),
        }
    }

    #[test]
    fn missing_file_uses_defaults() {
        Jail::expect_with(|jail| {
            let config = load(Some(&jail.directory().join("nope.toml"))).map_err(|e| e.to_string())?;
            assert_eq!(config.coordinator.address, DEFAULT_COORDINATOR_ADDRESS);
            assert!(config.auth.token.is_empty());
            Ok(())
        });
    }

    #[test]
    fn file_beats_environment_and_cli_beats_file() {
        Jail::expect_with(|jail| {
            jail.set_env("CAIRN_COORDINATOR__ADDRESS", "env:1");
            jail.set_env("CAIRN_INTERVALS__POLL", "20s");
            jail.set_env("CAIRN_NODE__REGION", "env-region");
            jail.create_file(
                "config.toml",
                r#"
[coordinator]
address = "file:1"

[node]
name = "from-file"
"#,
            )?;

            let loaded = source(jail, None)
                .load(&OverrideArgs {
                    node_name: Some("from-cli".into()),
                    ..Default::default()
                })
                .map_err(|e| e.to_string())?;
            let config = loaded.config;

            assert_eq!(loaded.path, jail.directory().join("config.toml"));
            assert_eq!(config.coordinator.address, "file:1");
            assert_eq!(config.intervals.poll, Duration::from_secs(20));
            assert_eq!(config.node.region, "env-region");
            assert_eq!(config.node.name, "from-cli");
            assert_eq!(config.ipfs.data_dir, Some(jail.directory().join("ipfs")));
            assert!(config.storage.capacity_gb > 0);
            Ok(())
        });
    }

    #[test]
    fn legacy_variables_fill_empty_values() {
        Jail::expect_with(|jail| {
            jail.set_env("CAIRN_AUTH_TOKEN", "legacy");
            let config = load(None).map_err(|e| e.to_string())?;
            assert_eq!(config.auth.token, "legacy");

            jail.set_env("CAIRN_AUTH__TOKEN", "nested");
            let config = load(None).map_err(|e| e.to_string())?;
            assert_eq!(config.auth.token, "nested");
            Ok(())
        });
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        Jail::expect_with(|jail| {
            assert!(source(jail, Some("absent.toml")).load(&OverrideArgs::default()).is_err());
            Ok(())
        });
    }

    #[test]
    fn malformed_file_is_an_error() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[intervals]\npoll = \"soon\"\n")?;
            assert!(source(jail, None).load(&OverrideArgs::default()).is_err());
            Ok(())
        });
    }
}
