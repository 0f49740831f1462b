//! Catalog Sync
//!
//! Bounded, time-budgeted crawls of the sports provider into the catalog,
//! sync bookkeeping (state per sport, capped history), admin imports and
//! fixture highlights.

pub mod catalog;
pub mod error;
pub mod highlights;
pub mod options;
pub mod orchestrator;

pub use catalog::{sport_catalog, OpenedSport, SportCatalog};
pub use error::{Result, SyncError};
pub use highlights::{candidate_leagues, HighlightsResolver, LeagueTarget, MAX_HIGHLIGHT_LEAGUES};
pub use options::{SyncOptions, SyncPolicy};
pub use orchestrator::{list_history, real_catalog_counts, sync_state, CatalogSyncer, SportsSyncOutcome, SyncOutcome};
