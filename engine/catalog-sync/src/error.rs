use thiserror::Error;

pub type Result<T> = std::result::Result<T, SyncError>;

/// Caller-facing sync failures. Provider trouble is not an error here; it is
/// recorded in the outcome and the sync state instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("sport not found: {0}")]
    SportNotFound(String),

    #[error("import contains no rows")]
    NothingToImport,
}
