//! Service configuration management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use catalog_sync::{SyncOptions, SyncPolicy};
use feed_service::FeedConfig;
use persistence::StoreConfig;
use sportsdb_client::ProviderConfig;

/// Environment variable naming the TOML configuration file
pub const CONFIG_FILE_ENV: &str = "SPORTS_HUB_CONFIG";

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Sports data provider and news feed
    pub provider: ProviderConfig,

    /// Limits for scheduled and admin catalog syncs
    pub sync: SyncOptions,

    /// Policy shared by every catalog sync
    pub sync_policy: SyncPolicy,

    /// Feed cache and assembly
    pub feed: FeedConfig,

    /// Record store
    pub store: StoreConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "compact".to_string() }
    }
}

/// Load configuration from `.env`, the optional TOML file and the process environment
pub fn load_config() -> Result<ServiceConfig> {
    dotenv::dotenv().ok();

    let mut config = match std::env::var(CONFIG_FILE_ENV) {
        Ok(path) => {
            tracing::debug!("Loading configuration from file: {}", path);
            load_from_file(Path::new(&path))?
        }
        Err(_) => ServiceConfig::default(),
    };

    load_from_env(&mut config, |key| std::env::var(key).ok());

    validate_config(&config)?;

    Ok(config)
}

/// Load configuration from a TOML file; missing sections keep their defaults
pub fn load_from_file(path: &Path) -> Result<ServiceConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {:?}", path))?;
    toml::from_str(&raw).with_context(|| format!("Failed to parse configuration file: {:?}", path))
}

/// Apply environment overrides read through `lookup`
pub fn load_from_env(config: &mut ServiceConfig, lookup: impl Fn(&str) -> Option<String>) {
    config.provider.apply_env(&lookup);

    if let Some(path) = lookup("SPORTS_HUB_DATA_FILE") {
        config.store.path = PathBuf::from(path);
    }

    if let Some(level) = lookup("SPORTS_HUB_LOG_LEVEL") {
        config.logging.level = level;
    }

    if let Some(format) = lookup("SPORTS_HUB_LOG_FORMAT") {
        config.logging.format = format;
    }
}

/// Validate configuration
pub fn validate_config(config: &ServiceConfig) -> Result<()> {
    config.store.validate().map_err(|e| anyhow::anyhow!("Invalid store configuration: {}", e))?;

    match config.logging.level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow::anyhow!("Invalid log level: {}", config.logging.level)),
    }

    match config.logging.format.as_str() {
        "json" | "pretty" | "compact" => {}
        _ => return Err(anyhow::anyhow!("Invalid log format: {}", config.logging.format)),
    }

    if config.provider.base_url.is_empty() {
        return Err(anyhow::anyhow!("Provider base URL must not be empty"));
    }

    if config.feed.max_variants_per_sport == 0 {
        return Err(anyhow::anyhow!("feed.max_variants_per_sport must be at least 1"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = ServiceConfig::default();
        tokio_test::assert_ok!(validate_config(&config));
        assert_eq!(config.store.path, PathBuf::from("./data/store.json"));
        assert_eq!(config.feed.ttl_ms, 300_000);
        assert_eq!(config.sync.max_teams, 60);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[provider]
api_key = "123"

[sync]
max_teams = 10

[feed]
soft_timeout_ms = 500

[logging]
format = "json"
"#
        )
        .unwrap();

        let config = load_from_file(file.path()).unwrap();
        assert_eq!(config.provider.api_key, "123");
        assert_eq!(config.provider.max_retries, 2);
        assert_eq!(config.sync.max_teams, 10);
        assert_eq!(config.sync.max_leagues, 6);
        assert_eq!(config.feed.soft_timeout_ms, 500);
        assert_eq!(config.feed.max_variants_per_sport, 8);
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_malformed_toml_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[sync\nmax_teams = ").unwrap();
        tokio_test::assert_err!(load_from_file(file.path()));
        tokio_test::assert_err!(load_from_file(Path::new("/definitely/not/here.toml")));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("SPORTSDB_API_KEY", "live-key"),
            ("SPORTSDB_TIMEOUT_SECS", "4"),
            ("SPORTS_HUB_DATA_FILE", "/tmp/hub.json"),
            ("SPORTS_HUB_LOG_LEVEL", "debug"),
            ("SPORTS_HUB_LOG_FORMAT", "pretty"),
        ]
        .into_iter()
        .collect();

        let mut config = ServiceConfig::default();
        load_from_env(&mut config, |key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.provider.api_key, "live-key");
        assert_eq!(config.provider.timeout_secs, 4);
        assert_eq!(config.store.path, PathBuf::from("/tmp/hub.json"));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "pretty");
        tokio_test::assert_ok!(validate_config(&config));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = ServiceConfig::default();
        config.logging.level = "loud".to_string();
        tokio_test::assert_err!(validate_config(&config));

        let mut config = ServiceConfig::default();
        config.logging.format = "xml".to_string();
        tokio_test::assert_err!(validate_config(&config));

        let mut config = ServiceConfig::default();
        config.store.path = PathBuf::new();
        tokio_test::assert_err!(validate_config(&config));
    }
}
