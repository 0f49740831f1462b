//! # Persistence Layer
//!
//! Record store for the sports hub: a single JSON document holding the
//! catalog (sports, leagues, teams, players), user follows, catalog sync state
//! and history, and the per-sport feed cache.
//!
//! ## Architecture
//!
//! - **StoreBackend**: whole-document load/save trait
//! - **JsonFileStore**: local file implementation with atomic replace
//! - **InMemoryStore**: test double
//!
//! Callers read once per request and write back at most once. Concurrent
//! writers are not serialized; the later save wins.

pub mod backend;
pub mod config;
pub mod document;
pub mod error;
pub mod local;

pub use backend::{InMemoryStore, JsonFileStore, StoreBackend};
pub use config::StoreConfig;
pub use document::*;
pub use error::{PersistenceError, Result};
pub use local::{create_local_store, create_local_store_with_config};

pub use chrono::{DateTime, Utc};
