// src/storage/config_store.rs
//! Persistence of the configuration record.
//!
//! The record is read once at startup and written back only through an
//! explicit [`ConfigStore::save`] call: after a credential is minted or
//! adopted, and when a resource id is cached for the first time.
//!
//! # Sources
//! - The JSON file itself (`configure.json` by default)
//! - `ADP_*` environment variables overriding single fields, e.g.
//!   `ADP_PRIVATE_KEY_PATH` (a `.env` file is loaded by `main`)
//!
//! `security_token` and `adp_id` are file-only: the manager rewrites both,
//! so an environment value would shadow the saved one on the next run.

use crate::error::ConfigError;
use crate::models::configuration::Configuration;
use config::{Config, Environment, File, FileFormat, Map};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

/// Load/save seam for the configuration record.
pub trait ConfigStore {
    /// Reads the record.
    ///
    /// # Errors
    /// [`ConfigError::Missing`] when there is no record yet, or a read/parse
    /// error.
    fn load(&self) -> Result<Configuration, ConfigError>;

    /// Replaces the stored record with `config`.
    fn save(&mut self, config: &Configuration) -> Result<(), ConfigError>;
}

/// Prefix of environment variables that override file values.
pub const ENV_PREFIX: &str = "ADP";

/// Fields never taken from the environment.
pub const FILE_ONLY_FIELDS: &[&str] = &["security_token", "adp_id"];

/// Keeps the `ADP_*` variables that may override a field, matching the
/// prefix case-insensitively the way `config::Environment` does.
fn environment_overrides(vars: impl IntoIterator<Item = (String, String)>) -> Map<String, String> {
    let prefix = format!("{}_", ENV_PREFIX).to_lowercase();
    vars.into_iter()
        .filter(|(key, _)| match key.to_lowercase().strip_prefix(&prefix) {
            Some(field) => !FILE_ONLY_FIELDS.contains(&field),
            None => false,
        })
        .collect()
}

/// Configuration record stored as a pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Creates a store over the JSON file at `path`. Nothing is read until
    /// [`ConfigStore::load`].
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Writes [`Configuration::template`] so the operator has something to
    /// fill in.
    fn bootstrap(&self) -> Result<(), ConfigError> {
        self.write(&Configuration::template())?;
        info!("Created configuration template at {}", self.path.display());
        Ok(())
    }

    fn write(&self, config: &Configuration) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(config)?;
        fs::write(&self.path, json).map_err(|source| ConfigError::Write {
            path: self.path.clone(),
            source,
        })
    }

    /// Reads the file and applies the overrides found in `vars`.
    fn load_with(&self, vars: impl IntoIterator<Item = (String, String)>) -> Result<Configuration, ConfigError> {
        if !self.path.exists() {
            self.bootstrap()?;
            return Err(ConfigError::Missing {
                path: self.path.clone(),
            });
        }

        let settings = Config::builder()
            .add_source(File::from(self.path.as_path()).format(FileFormat::Json))
            .add_source(Environment::with_prefix(ENV_PREFIX).source(Some(environment_overrides(vars))))
            .build()?;

        Ok(settings.try_deserialize::<Configuration>()?)
    }
}

impl ConfigStore for JsonFileStore {
    fn load(&self) -> Result<Configuration, ConfigError> {
        self.load_with(std::env::vars())
    }

    fn save(&mut self, config: &Configuration) -> Result<(), ConfigError> {
        self.write(config)?;
        info!("Saved configuration: {}", self.path.display());
        Ok(())
    }
}
