//! Catalog listing for a single sport

use crate::error::{Result, SyncError};
use crate::options::SyncOptions;
use crate::orchestrator::{CatalogSyncer, SyncOutcome};
use persistence::{CatalogDocument, League, Sport, Team};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SportCatalog {
    pub sport: Sport,
    pub leagues: Vec<League>,
    pub teams: Vec<Team>,
    pub player_count: usize,
}

/// What "open sport" returns: the listing after an interactive sync
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenedSport {
    #[serde(flatten)]
    pub catalog: SportCatalog,
    pub sync: SyncOutcome,
}

pub fn sport_catalog(doc: &CatalogDocument, sport_id: &str) -> Option<SportCatalog> {
    let sport = doc.sport(sport_id)?.clone();
    Some(SportCatalog {
        leagues: doc.leagues.iter().filter(|l| l.sport_id == sport.id).cloned().collect(),
        teams: doc.teams.iter().filter(|t| t.sport_id == sport.id).cloned().collect(),
        player_count: doc.players.iter().filter(|p| p.sport_id == sport.id).count(),
        sport,
    })
}

impl CatalogSyncer {
    /// Interactive sync, then the sport's listing
    pub async fn open_sport(&self, doc: &mut CatalogDocument, sport_id: &str) -> Result<OpenedSport> {
        let sync = self.sync_sport_catalog(doc, sport_id, &SyncOptions::interactive()).await?;
        let catalog = sport_catalog(doc, sport_id).ok_or_else(|| SyncError::SportNotFound(sport_id.to_string()))?;
        Ok(OpenedSport { catalog, sync })
    }
}
