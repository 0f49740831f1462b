//! Catalog Registry - merges raw rows into the canonical sports catalog
//!
//! Every sport, league, team and player reaches the store through
//! [`CatalogRegistry`], which matches incoming rows against existing records
//! by provider id or by normalized name so the same entity is never stored
//! twice.

pub mod bulk;
pub mod normalize;
pub mod registry;
pub mod types;

pub use bulk::{bulk_upsert, BulkCatalogRows, BulkPlayer, BulkScoped, BulkSport, BulkUpsertReport, KindReport};
pub use normalize::{is_popular_sport, is_soccer, name_key, normalize_name, slugify, POPULAR_SPORTS};
pub use registry::{find_sport, CatalogRegistry};
pub use types::{PlayerRow, Provenance, ScopedRow, SportRow, Upserted};
