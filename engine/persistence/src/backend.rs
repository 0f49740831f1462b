//! Store backend trait and implementations

use crate::config::StoreConfig;
use crate::document::CatalogDocument;
use crate::error::{PersistenceError, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Abstract trait for record store backends
///
/// The document is read whole and written whole. There is no locking across
/// callers: two overlapping read-modify-write cycles resolve as last write wins.
#[async_trait::async_trait]
pub trait StoreBackend: Send + Sync {
    /// Load the current document (an absent store yields an empty document)
    async fn load(&self) -> Result<CatalogDocument>;

    /// Replace the stored document
    async fn save(&self, document: &CatalogDocument) -> Result<()>;
}

/// JSON file backed store
pub struct JsonFileStore {
    config: StoreConfig,
}

impl JsonFileStore {
    /// Create a new file store
    pub fn new(config: StoreConfig) -> Result<Self> {
        config.validate().map_err(PersistenceError::config)?;
        Ok(Self { config })
    }

    /// Create a new file store with default settings at `path`
    pub fn with_default_config(path: impl Into<PathBuf>) -> Result<Self> {
        Self::new(StoreConfig::new(path))
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn path(&self) -> &PathBuf {
        &self.config.path
    }
}

#[async_trait::async_trait]
impl StoreBackend for JsonFileStore {
    async fn load(&self) -> Result<CatalogDocument> {
        let raw = match tokio::fs::read_to_string(&self.config.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No store at {:?}, starting from an empty document", self.config.path);
                return Ok(CatalogDocument::default());
            }
            Err(e) => return Err(PersistenceError::Io(e)),
        };

        if raw.trim().is_empty() {
            return Ok(CatalogDocument::default());
        }

        serde_json::from_str(&raw).map_err(|e| {
            PersistenceError::corruption(format!("{:?}: {}", self.config.path, e))
        })
    }

    async fn save(&self, document: &CatalogDocument) -> Result<()> {
        if let Some(parent) = self.config.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let bytes = if self.config.pretty {
            serde_json::to_vec_pretty(document)?
        } else {
            serde_json::to_vec(document)?
        };

        // Write-then-rename so readers never observe a half-written document
        let temp = self.config.temp_path();
        tokio::fs::write(&temp, &bytes).await?;
        tokio::fs::rename(&temp, &self.config.path).await?;

        tracing::debug!("Saved store to {:?} ({} bytes)", self.config.path, bytes.len());
        Ok(())
    }
}

/// In-memory store (for testing)
#[derive(Clone, Default)]
pub struct InMemoryStore {
    document: Arc<Mutex<CatalogDocument>>,
    saves: Arc<Mutex<usize>>,
}

impl InMemoryStore {
    /// Create a new in-memory store seeded with `document`
    pub fn new(document: CatalogDocument) -> Self {
        Self { document: Arc::new(Mutex::new(document)), saves: Arc::new(Mutex::new(0)) }
    }

    /// Number of times the document was saved
    pub async fn save_count(&self) -> usize {
        *self.saves.lock().await
    }

    /// Current stored document
    pub async fn snapshot(&self) -> CatalogDocument {
        self.document.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl StoreBackend for InMemoryStore {
    async fn load(&self) -> Result<CatalogDocument> {
        Ok(self.document.lock().await.clone())
    }

    async fn save(&self, document: &CatalogDocument) -> Result<()> {
        *self.document.lock().await = document.clone();
        *self.saves.lock().await += 1;
        Ok(())
    }
}
