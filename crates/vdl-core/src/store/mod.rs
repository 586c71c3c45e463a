//! Access to the configuration persisted by a previous launch.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;
use vdl_model::PersistedConfig;

/// Overrides the location of the persisted configuration.
pub const CONFIG_FILE_ENV: &str = "CUTTLEFISH_CONFIG_FILE";
const DEFAULT_CONFIG_FILE: &str = ".cuttlefish_config.json";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to read {path}: {reason}")]
    Read { path: String, reason: String },
    #[error("failed to parse {path}: {reason}")]
    Parse { path: String, reason: String },
    #[error("cannot locate the persisted configuration: neither $CUTTLEFISH_CONFIG_FILE nor $HOME is set")]
    NoLocation,
}

/// Source of the previous run's configuration.
pub trait ConfigStore {
    fn exists(&self) -> bool;

    fn load(&self) -> Result<PersistedConfig, StoreError>;

    /// Load once, if there is anything to load.
    fn snapshot(&self) -> Result<Option<PersistedConfig>, StoreError> {
        if !self.exists() {
            return Ok(None);
        }
        self.load().map(Some)
    }
}

/// The configuration as a JSON file on disk.
#[derive(Debug, Clone)]
pub struct JsonConfigStore {
    path: PathBuf,
}

impl JsonConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$CUTTLEFISH_CONFIG_FILE`, else `$HOME/.cuttlefish_config.json`.
    pub fn from_env() -> Result<Self, StoreError> {
        if let Some(path) = std::env::var_os(CONFIG_FILE_ENV).filter(|p| !p.is_empty()) {
            return Ok(Self::new(path));
        }
        let home = std::env::var_os("HOME")
            .filter(|h| !h.is_empty())
            .ok_or(StoreError::NoLocation)?;
        Ok(Self::new(Path::new(&home).join(DEFAULT_CONFIG_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigStore for JsonConfigStore {
    fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn load(&self) -> Result<PersistedConfig, StoreError> {
        let path = self.path.display().to_string();
        let bytes = std::fs::read(&self.path).map_err(|e| StoreError::Read {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        let config = serde_json::from_slice(&bytes).map_err(|e| StoreError::Parse {
            path,
            reason: e.to_string(),
        })?;
        debug!(target: "vdl.core.store", path = %self.path.display(), "loaded persisted config");
        Ok(config)
    }
}
