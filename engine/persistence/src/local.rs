//! Local file-based store constructors

use crate::backend::JsonFileStore;
use crate::config::StoreConfig;
use crate::error::Result;

/// Create a new file store with default configuration
pub fn create_local_store(path: impl Into<std::path::PathBuf>) -> Result<JsonFileStore> {
    JsonFileStore::with_default_config(path)
}

/// Create a new file store with custom configuration
pub fn create_local_store_with_config(config: StoreConfig) -> Result<JsonFileStore> {
    JsonFileStore::new(config)
}
