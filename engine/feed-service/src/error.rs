use thiserror::Error;

pub type Result<T> = std::result::Result<T, FeedError>;

/// Validation failures surfaced to the caller; nothing is written when one
/// of these is returned
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    #[error("sport not found: {0}")]
    SportNotFound(String),

    #[error("select at least one sport")]
    NoInterestSelected,

    #[error("{kind} {id} does not belong to sport {sport_id}")]
    InvalidInterestScope { kind: &'static str, id: String, sport_id: String },

    #[error("sport name must not be empty")]
    EmptySportName,
}
