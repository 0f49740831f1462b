use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-run crawl limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncOptions {
    /// Ignore the cooldown/richness skip
    pub force: bool,

    /// Stop once this many teams have been touched
    pub max_teams: usize,

    /// Leagues considered for team expansion
    pub max_leagues: usize,

    /// Players merged per roster
    pub players_per_team_cap: usize,

    /// Rosters fetched per run
    pub max_player_teams: usize,

    /// Wall-clock budget for provider calls
    pub max_duration_ms: u64,

    /// Minimum gap between successful syncs of a rich sport
    pub cooldown_ms: u64,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            force: false,
            max_teams: 60,
            max_leagues: 6,
            players_per_team_cap: 25,
            max_player_teams: 12,
            max_duration_ms: 20_000,
            cooldown_ms: 6 * 60 * 60 * 1000,
        }
    }
}

impl SyncOptions {
    /// Short-budget preset for a user waiting on "open sport"
    pub fn interactive() -> Self {
        Self {
            max_teams: 24,
            max_leagues: 3,
            players_per_team_cap: 15,
            max_player_teams: 4,
            max_duration_ms: 6_000,
            ..Self::default()
        }
    }

    pub fn forced(mut self) -> Self {
        self.force = true;
        self
    }

    pub fn max_duration(&self) -> Duration {
        Duration::from_millis(self.max_duration_ms)
    }

    pub fn cooldown(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(i64::try_from(self.cooldown_ms).unwrap_or(i64::MAX))
    }
}

/// Policy constants shared by every run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncPolicy {
    /// A sport with at least this many provider-backed teams is "rich"
    pub rich_team_threshold: usize,

    /// ...or at least this many provider-backed players
    pub rich_player_threshold: usize,

    /// Soccer falls back to the country search below this many touched teams
    pub soccer_fallback_min_teams: usize,

    /// Sport name the provider expects for the country search
    pub soccer_provider_name: String,

    /// Countries searched, in order, by the soccer fallback
    pub soccer_fallback_countries: Vec<String>,
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self {
            rich_team_threshold: 40,
            rich_player_threshold: 80,
            soccer_fallback_min_teams: 40,
            soccer_provider_name: "Soccer".to_string(),
            soccer_fallback_countries: [
                "England",
                "Spain",
                "Italy",
                "Germany",
                "France",
                "Portugal",
                "Netherlands",
                "Brazil",
                "Argentina",
                "United States",
                "Mexico",
                "Scotland",
            ]
            .iter()
            .map(|c| c.to_string())
            .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interactive_preset_is_tighter() {
        let full = SyncOptions::default();
        let quick = SyncOptions::interactive();
        assert!(quick.max_duration() < full.max_duration());
        assert!(quick.max_teams < full.max_teams);
        assert_eq!(quick.cooldown_ms, full.cooldown_ms);
        assert!(!quick.force);
        assert!(quick.forced().force);
    }

    #[test]
    fn test_cooldown_conversion() {
        let options = SyncOptions { cooldown_ms: 90_000, ..Default::default() };
        assert_eq!(options.cooldown(), chrono::Duration::seconds(90));
        let huge = SyncOptions { cooldown_ms: u64::MAX, ..Default::default() };
        assert!(huge.cooldown() > chrono::Duration::days(365));
    }
}
