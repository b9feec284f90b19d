//! Directory management for the cairn node.

use crate::{
    args::DataDirArgs,
    constants::{CONFIG_FILE_NAME, DEFAULT_DATA_DIR_NAME, IPFS_DIR_NAME},
};
use directories::ProjectDirs;
use eyre::{Result, WrapErr};
use std::{fs, path::PathBuf};

/// Returns the default project directories for cairn.
pub fn default_project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "cairn", DEFAULT_DATA_DIR_NAME)
}

/// Returns the default data directory path.
pub fn default_data_dir() -> Option<PathBuf> {
    default_project_dirs().map(|dirs| dirs.data_dir().to_path_buf())
}

/// Layout of the node's data directory.
#[derive(Debug, Clone)]
pub struct DataDirs {
    pub root: PathBuf,
}

impl DataDirs {
    /// Resolve the root from `args`, falling back to the platform default.
    pub fn new(args: &DataDirArgs) -> Self {
        let root = args.datadir.clone().unwrap_or_else(|| {
            default_data_dir().unwrap_or_else(|| PathBuf::from(format!(".{DEFAULT_DATA_DIR_NAME}")))
        });
        Self { root }
    }

    /// Create the root directory if it does not exist.
    pub fn ensure(&self) -> Result<()> {
        fs::create_dir_all(&self.root)
            .wrap_err_with(|| format!("Failed to create directory {}", self.root.display()))
    }

    /// Returns the path to the config file.
    pub fn config_file(&self) -> PathBuf {
        self.root.join(CONFIG_FILE_NAME)
    }

    /// Default location of the IPFS data directory.
    pub fn ipfs_dir(&self) -> PathBuf {
        self.root.join(IPFS_DIR_NAME)
    }
}
