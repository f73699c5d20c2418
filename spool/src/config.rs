use std::path::{Path, PathBuf};

use serde_derive::Deserialize;

use crate::error::Result;

/// Environment variable overriding `db_dir`.
pub const DB_DIR_VAR: &str = "SPOOL_DB_DIR";

/// Config that changes only after startup/reload.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct Config {
    pub db_dir: PathBuf,
    /// Default durability of queues opened from this config.
    pub sync: bool,
    pub create_if_missing: bool,
    pub paranoid_checks: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_dir: PathBuf::from("spool-data"),
            sync: true,
            create_if_missing: true,
            paranoid_checks: false,
        }
    }
}

impl Config {
    pub fn new(db_dir: impl AsRef<Path>) -> Self {
        Self {
            db_dir: db_dir.as_ref().to_owned(),
            ..Default::default()
        }
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub(crate) fn db_options(&self) -> spool_db::DbOptions {
        let mut options = spool_db::DbOptions::default();
        options.create_if_missing = self.create_if_missing;
        options.paranoid_checks = self.paranoid_checks;
        options
    }
}

/// Loads the config file at `path`, or the defaults if there is none.
/// `SPOOL_DB_DIR` takes precedence over the file.
pub fn load_config(path: Option<PathBuf>) -> Result<Box<Config>> {
    if cfg!(debug_assertions) {
        dotenvy::dotenv().ok();
    }

    let mut config = match path {
        Some(path) => Config::from_toml(&std::fs::read_to_string(path)?)?,
        None => Config::default(),
    };
    if let Ok(db_dir) = std::env::var(DB_DIR_VAR) {
        config.db_dir = db_dir.into();
    }
    Ok(Box::new(config))
}
