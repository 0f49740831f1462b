use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Feed cache and assembly policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Cache entry lifetime
    pub ttl_ms: u64,

    /// Highlights and news served per section
    pub items_per_list: usize,

    /// Preference-key variants kept per sport
    pub max_variants_per_sport: usize,

    /// Live refreshes allowed in one feed request
    pub max_live_refreshes: usize,

    /// Soft deadline for each live fetch
    pub soft_timeout_ms: u64,

    /// Highlights requested from the resolver
    pub highlight_limit: usize,

    /// News items requested from the feed
    pub news_limit: usize,

    /// Followed team names folded into the news query
    pub news_query_teams: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            ttl_ms: 5 * 60 * 1000,
            items_per_list: 3,
            max_variants_per_sport: 8,
            max_live_refreshes: 2,
            soft_timeout_ms: 1_800,
            highlight_limit: 3,
            news_limit: 3,
            news_query_teams: 2,
        }
    }
}

impl FeedConfig {
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(i64::try_from(self.ttl_ms).unwrap_or(i64::MAX))
    }

    pub fn soft_timeout(&self) -> Duration {
        Duration::from_millis(self.soft_timeout_ms)
    }
}
