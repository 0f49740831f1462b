use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the sports data provider client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// API base, without the key segment
    pub base_url: String,

    /// Path-style API key (TheSportsDB puts it in the URL)
    pub api_key: String,

    /// Hard per-request timeout in seconds
    pub timeout_secs: u64,

    /// Retries after an HTTP 429 (total attempts = max_retries + 1)
    pub max_retries: u32,

    /// News feed configuration
    pub news: NewsConfig,
}

/// Configuration for the RSS news search
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsConfig {
    /// Search endpoint returning RSS
    pub base_url: String,

    /// Interface language (`hl`)
    pub language: String,

    /// Edition region (`gl`)
    pub region: String,

    /// Hard per-request timeout in seconds
    pub timeout_secs: u64,

    /// Source label used when an item carries none
    pub default_source: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.thesportsdb.com/api/v1/json".to_string(),
            api_key: "3".to_string(),
            timeout_secs: 10,
            max_retries: 2,
            news: NewsConfig::default(),
        }
    }
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://news.google.com/rss/search".to_string(),
            language: "en-US".to_string(),
            region: "US".to_string(),
            timeout_secs: 10,
            default_source: "Google News".to_string(),
        }
    }
}

impl ProviderConfig {
    /// Defaults overridden by `SPORTSDB_*` / `NEWS_FEED_URL` environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Override fields from `lookup`; unparseable numbers keep the current value
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(base_url) = lookup("SPORTSDB_BASE_URL") {
            self.base_url = base_url;
        }

        if let Some(api_key) = lookup("SPORTSDB_API_KEY") {
            self.api_key = api_key;
        }

        if let Some(retries) = lookup("SPORTSDB_MAX_RETRIES") {
            self.max_retries = retries.parse().unwrap_or(self.max_retries);
        }

        if let Some(timeout) = lookup("SPORTSDB_TIMEOUT_SECS") {
            self.timeout_secs = timeout.parse().unwrap_or(self.timeout_secs);
        }

        if let Some(news_url) = lookup("NEWS_FEED_URL") {
            self.news.base_url = news_url;
        }
    }

    /// Full URL of a versioned endpoint, e.g. `.../json/3/all_leagues.php`
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}/{}.php", self.base_url.trim_end_matches('/'), self.api_key, endpoint)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Total attempts for one call
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }
}

impl NewsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// `ceid` edition parameter, e.g. `US:en`
    pub fn edition(&self) -> String {
        let lang = self.language.split('-').next().unwrap_or("en");
        format!("{}:{}", self.region, lang)
    }
}
