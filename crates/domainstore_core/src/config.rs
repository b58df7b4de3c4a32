//! Explicit storage configuration.
//!
//! # Responsibility
//! - Carry the storage and index directories from the caller to the store.
//! - Load those paths from a JSON document when a collaborator has one.
//!
//! # Invariants
//! - No process-wide state; every store is opened from a config value.
//! - Directories are created before the database is opened.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const DATABASE_FILE_NAME: &str = "domainstore.sqlite3";

/// Failure to load a configuration document.
#[derive(Debug)]
pub enum ConfigError {
    Read { path: PathBuf, source: std::io::Error },
    Parse(serde_json::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config document: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
        }
    }
}

/// Filesystem locations used by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreConfig {
    /// Directory holding the database file.
    pub storage_path: PathBuf,
    /// Directory reserved for an external search index.
    pub index_path: PathBuf,
}

impl StoreConfig {
    pub fn new(storage_path: impl Into<PathBuf>, index_path: impl Into<PathBuf>) -> Self {
        Self {
            storage_path: storage_path.into(),
            index_path: index_path.into(),
        }
    }

    /// Uses `<base>/store` and `<base>/index`.
    pub fn under(base_dir: impl AsRef<Path>) -> Self {
        let base_dir = base_dir.as_ref();
        Self::new(base_dir.join("store"), base_dir.join("index"))
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(raw).map_err(ConfigError::Parse)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Database file inside [`Self::storage_path`].
    pub fn database_file(&self) -> PathBuf {
        self.storage_path.join(DATABASE_FILE_NAME)
    }

    /// Creates the storage and index directories if absent.
    pub fn prepare_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.storage_path)?;
        std::fs::create_dir_all(&self.index_path)?;
        Ok(())
    }
}
