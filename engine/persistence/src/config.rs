//! Configuration for the record store

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the file-backed record store
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path of the JSON document holding the whole store
    pub path: PathBuf,

    /// Pretty-print the document when saving
    pub pretty: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { path: PathBuf::from("./data/store.json"), pretty: true }
    }
}

impl StoreConfig {
    /// Create a new configuration for the given document path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), ..Default::default() }
    }

    /// Temporary path used for atomic replacement on save
    pub fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.path.as_os_str().is_empty() {
            return Err("store path must not be empty".to_string());
        }
        if self.path.is_dir() {
            return Err(format!("store path {:?} is a directory", self.path));
        }
        Ok(())
    }
}
