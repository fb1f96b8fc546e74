//! # Configuration
//!
//! Modeldata configuration is managed by [`confique`], which handles layered
//! loading from environment variables, a TOML file and compiled defaults.
//!
//! ## Resolution Order
//!
//! 1. **Environment variables**: `MODELDATA_DATA_DIR`, `MODELDATA_WRITE_POLICY`, etc.
//! 2. **Config file**: an explicit path, or `modeldata.toml` in the OS config
//!    directory (via the `directories` crate).
//! 3. **Compiled defaults**: `#[config(default = ...)]`.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `data_dir` | OS data dir | Where collection documents live |
//! | `missing_as_empty` | `false` | Load a collection with no document as empty instead of failing |
//! | `write_policy` | `last-write-wins` | `last-write-wins` or `serialized` |
//! | `pretty` | `true` | Pretty-print collection documents |

use crate::cache::WritePolicy;
use crate::error::{ModelDataError, Result};
use crate::store::FsGateway;
use confique::Config;
use directories::ProjectDirs;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "modeldata.toml";

/// Configuration for modeldata, stored in `modeldata.toml`.
#[derive(Config, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ModelDataConfig {
    /// Directory holding one `<collection>.json` document per collection.
    /// When absent, the platform data directory is used.
    #[config(env = "MODELDATA_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Treat a collection that has never been written as empty on load.
    #[config(env = "MODELDATA_MISSING_AS_EMPTY", default = false)]
    pub missing_as_empty: bool,

    /// How overlapping writes are handled: "last-write-wins" or "serialized".
    /// When absent, defaults to "last-write-wins".
    #[config(env = "MODELDATA_WRITE_POLICY", parse_env = parse_write_policy)]
    pub write_policy: Option<WritePolicy>,

    /// Pretty-print collection documents.
    #[config(env = "MODELDATA_PRETTY", default = true)]
    pub pretty: bool,
}

fn parse_write_policy(value: &str) -> Result<WritePolicy> {
    value.parse()
}

impl Default for ModelDataConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            missing_as_empty: false,
            write_policy: None,
            pretty: true,
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "modeldata")
}

impl ModelDataConfig {
    /// Load configuration from the environment, then `file` (or the default
    /// config file when `None`), then compiled defaults.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = Self::builder().env();
        match file {
            Some(path) => builder = builder.file(path),
            None => {
                if let Some(path) = Self::default_file() {
                    builder = builder.file(path);
                }
            }
        }
        builder
            .load()
            .map_err(|e| ModelDataError::Config(e.to_string()))
    }

    /// Default location of `modeldata.toml`, if the platform has a config dir.
    pub fn default_file() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Get the write policy, using the default if not configured.
    pub fn write_policy(&self) -> WritePolicy {
        self.write_policy.unwrap_or_default()
    }

    /// The data directory, falling back to the platform data dir.
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        project_dirs()
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or_else(|| {
                ModelDataError::Config("No data directory available on this platform".into())
            })
    }

    /// Build the filesystem gateway described by this configuration.
    pub fn fs_gateway(&self) -> Result<FsGateway> {
        Ok(FsGateway::new(self.data_dir()?)
            .with_missing_as_empty(self.missing_as_empty)
            .with_pretty(self.pretty))
    }

    /// A commented sample `modeldata.toml`.
    pub fn template() -> String {
        confique::toml::template::<Self>(confique::toml::FormatOptions::default())
    }
}
