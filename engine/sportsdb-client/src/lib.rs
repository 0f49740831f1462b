//! TheSportsDB client
//!
//! Resilient access to the external sports data provider (per-request
//! timeout, HTTP 429 backoff, empty-body degradation) plus an RSS news search
//! client that never fails.

pub mod client;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod fake;
pub mod models;
pub mod news;

pub use client::{SportsDataProvider, SportsDbClient};
pub use config::{NewsConfig, ProviderConfig};
pub use error::{ProviderError, Result};
pub use models::*;
pub use news::{FeedItem, NewsProvider, RssNewsClient};
