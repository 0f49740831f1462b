//! Sports Hub Service Library
//!
//! Configuration loading, logging setup and the [`HubService`] request
//! wrapper that binds the catalog sync and feed engines to a record store.

use anyhow::{Context, Result};

pub mod config;
pub mod logging;
pub mod service;

pub use config::{LoggingConfig, ServiceConfig};
pub use logging::initialize_logging_with_config;
pub use service::{HubError, HubService};

/// Load configuration from files and environment variables
pub fn load_configuration() -> Result<ServiceConfig> {
    config::load_config().context("Failed to load service configuration")
}
