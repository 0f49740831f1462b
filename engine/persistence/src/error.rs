//! Record store errors

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PersistenceError>;

#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Reading, writing or renaming the document file
    #[error("record store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding the document for save
    #[error("record store encoding failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Rejected `StoreConfig`
    #[error("invalid store configuration: {0}")]
    Config(String),

    /// A stored document that does not decode as a catalog document
    #[error("store document unreadable: {0}")]
    Corruption(String),
}

impl PersistenceError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn corruption(msg: impl Into<String>) -> Self {
        Self::Corruption(msg.into())
    }
}
