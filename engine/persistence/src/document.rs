//! The record store document
//!
//! The whole catalog, follow set, sync bookkeeping and feed cache live in one
//! JSON-serializable document. Requests read it once, mutate it in memory and
//! write it back whole.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// External source tag carried by records that came from the sports provider
pub const PROVIDER_SOURCE: &str = "thesportsdb";

/// Maximum number of sync history entries retained (newest first)
pub const SYNC_HISTORY_CAP: usize = 50;

/// Common view over the four catalog record kinds
pub trait CatalogRecord {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    /// Owning sport; empty for sports, which are unscoped
    fn scope_id(&self) -> &str;
    fn external_source(&self) -> Option<&str>;
    fn external_id(&self) -> Option<&str>;

    /// Whether the record carries provider provenance (part of the "real" catalog)
    fn is_provider_backed(&self) -> bool {
        self.external_source() == Some(PROVIDER_SOURCE) && self.external_id().is_some()
    }
}

/// A sport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sport {
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub popular: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A league, owned by exactly one sport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct League {
    pub id: String,
    pub sport_id: String,
    pub name: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A team, owned by exactly one sport (no league edge is modeled)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: String,
    pub sport_id: String,
    pub name: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A player; the team reference is weak and may be re-pointed by richer data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: String,
    pub sport_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

macro_rules! scoped_record {
    ($ty:ty) => {
        impl CatalogRecord for $ty {
            fn id(&self) -> &str {
                &self.id
            }
            fn name(&self) -> &str {
                &self.name
            }
            fn scope_id(&self) -> &str {
                &self.sport_id
            }
            fn external_source(&self) -> Option<&str> {
                self.external_source.as_deref()
            }
            fn external_id(&self) -> Option<&str> {
                self.external_id.as_deref()
            }
        }
    };
}

scoped_record!(League);
scoped_record!(Team);
scoped_record!(Player);

impl CatalogRecord for Sport {
    fn id(&self) -> &str {
        &self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn scope_id(&self) -> &str {
        ""
    }
    fn external_source(&self) -> Option<&str> {
        self.external_source.as_deref()
    }
    fn external_id(&self) -> Option<&str> {
        self.external_id.as_deref()
    }
}

/// What a follow points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowKind {
    Sport,
    League,
    Team,
    Player,
}

/// One user follow edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Follow {
    pub user_id: String,
    pub kind: FollowKind,
    pub entity_id: String,
    pub created_at: DateTime<Utc>,
}

/// Outcome classification of a sync run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Ok,
    Partial,
    NoData,
    Error,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Ok => "ok",
            SyncStatus::Partial => "partial",
            SyncStatus::NoData => "no_data",
            SyncStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entity counts reported by a sync
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncCounts {
    /// Provider-backed teams in the sport after the run
    pub teams: usize,
    /// Provider-backed players in the sport after the run
    pub players: usize,
    /// Provider-backed leagues in the sport after the run
    pub leagues: usize,
    pub touched_teams: usize,
    pub created_teams: usize,
    pub created_players: usize,
    pub created_leagues: usize,
}

/// Per-sport sync bookkeeping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSyncState {
    pub last_attempt_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_success_at: Option<DateTime<Utc>>,
    pub status: SyncStatus,
    #[serde(default)]
    pub timed_out: bool,
    #[serde(default)]
    pub counts: SyncCounts,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Immutable record of one sync operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncHistoryEntry {
    pub id: String,
    pub at: DateTime<Utc>,
    pub source: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sport_id: Option<String>,
    pub status: SyncStatus,
    #[serde(default)]
    pub counts: SyncCounts,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// An upcoming or recent fixture shown in a feed section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Highlight {
    pub league: String,
    pub title: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
}

/// A news headline shown in a feed section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub published_at: Option<String>,
    pub source: String,
}

/// Cached highlights/news for one (sport, preference key) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedCacheEntry {
    pub fetched_at: DateTime<Utc>,
    #[serde(default)]
    pub highlights: Vec<Highlight>,
    #[serde(default)]
    pub news: Vec<NewsItem>,
}

/// A user's request to add a sport the catalog does not carry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SportRequest {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// The whole record store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CatalogDocument {
    pub sports: Vec<Sport>,
    pub leagues: Vec<League>,
    pub teams: Vec<Team>,
    pub players: Vec<Player>,
    pub follows: Vec<Follow>,
    /// Explicit sport ordering per user
    pub user_sport_order: HashMap<String, Vec<String>>,
    pub catalog_sync_state: HashMap<String, CatalogSyncState>,
    /// sport id -> preference key -> entry
    pub feed_cache_by_sport: HashMap<String, HashMap<String, FeedCacheEntry>>,
    /// Newest first, capped at [`SYNC_HISTORY_CAP`]
    pub sync_history: Vec<SyncHistoryEntry>,
    pub sport_requests: Vec<SportRequest>,
}

impl CatalogDocument {
    pub fn sport(&self, id: &str) -> Option<&Sport> {
        self.sports.iter().find(|s| s.id == id)
    }

    pub fn league(&self, id: &str) -> Option<&League> {
        self.leagues.iter().find(|l| l.id == id)
    }

    pub fn team(&self, id: &str) -> Option<&Team> {
        self.teams.iter().find(|t| t.id == id)
    }

    pub fn player(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Sport that owns the followed entity, if it still exists
    pub fn follow_sport_id(&self, follow: &Follow) -> Option<&str> {
        match follow.kind {
            FollowKind::Sport => self.sport(&follow.entity_id).map(|s| s.id.as_str()),
            FollowKind::League => self.league(&follow.entity_id).map(|l| l.sport_id.as_str()),
            FollowKind::Team => self.team(&follow.entity_id).map(|t| t.sport_id.as_str()),
            FollowKind::Player => self.player(&follow.entity_id).map(|p| p.sport_id.as_str()),
        }
    }

    /// Prepend a history entry and drop anything past the cap
    pub fn push_history(&mut self, entry: SyncHistoryEntry) {
        self.sync_history.insert(0, entry);
        self.sync_history.truncate(SYNC_HISTORY_CAP);
    }
}
