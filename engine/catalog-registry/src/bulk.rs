//! Admin bulk upsert
//!
//! Operator-supplied rows go through the same merge rules as provider rows.
//! Leagues, teams and players name their sport by id or by name; players may
//! name a team the same way.

use crate::registry::CatalogRegistry;
use crate::types::{PlayerRow, Provenance, ScopedRow, SportRow};
use persistence::{CatalogDocument, PROVIDER_SOURCE};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BulkSport {
    pub name: Option<String>,
    pub external_source: Option<String>,
    pub external_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BulkScoped {
    /// Sport id or sport name
    pub sport: String,
    pub name: Option<String>,
    pub external_source: Option<String>,
    pub external_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BulkPlayer {
    /// Sport id or sport name
    pub sport: String,
    /// Team id or team name within the sport
    pub team: Option<String>,
    pub name: Option<String>,
    pub external_source: Option<String>,
    pub external_id: Option<String>,
}

/// Rows accepted by [`bulk_upsert`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BulkCatalogRows {
    pub sports: Vec<BulkSport>,
    pub leagues: Vec<BulkScoped>,
    pub teams: Vec<BulkScoped>,
    pub players: Vec<BulkPlayer>,
}

impl BulkCatalogRows {
    pub fn is_empty(&self) -> bool {
        self.sports.is_empty() && self.leagues.is_empty() && self.teams.is_empty() && self.players.is_empty()
    }
}

/// Per-kind tally
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindReport {
    pub created: usize,
    pub total: usize,
    /// Rows dropped for a missing name or an unknown sport
    pub skipped: usize,
}

impl KindReport {
    fn record(&mut self, upserted: Option<bool>) {
        self.total += 1;
        match upserted {
            Some(true) => self.created += 1,
            Some(false) => {}
            None => self.skipped += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkUpsertReport {
    pub sports: KindReport,
    pub leagues: KindReport,
    pub teams: KindReport,
    pub players: KindReport,
}

impl BulkUpsertReport {
    pub fn created(&self) -> usize {
        self.sports.created + self.leagues.created + self.teams.created + self.players.created
    }
}

fn provenance(source: Option<&str>, id: Option<&str>) -> Option<Provenance> {
    let id = id.map(str::trim).filter(|id| !id.is_empty())?;
    let source = source.map(str::trim).filter(|s| !s.is_empty()).unwrap_or(PROVIDER_SOURCE);
    Some(Provenance::new(source, id))
}

/// Merge `rows` into `doc`, sports first so later rows can name new sports
pub fn bulk_upsert(doc: &mut CatalogDocument, rows: &BulkCatalogRows) -> BulkUpsertReport {
    let mut registry = CatalogRegistry::new(doc);
    let mut report = BulkUpsertReport::default();

    for row in &rows.sports {
        let upserted = registry.upsert_sport(&SportRow {
            name: row.name.clone(),
            provenance: provenance(row.external_source.as_deref(), row.external_id.as_deref()),
        });
        report.sports.record(upserted.map(|u| u.created));
    }

    for row in &rows.leagues {
        let upserted = scoped_row(&registry, row).and_then(|r| registry.upsert_league(&r));
        report.leagues.record(upserted.map(|u| u.created));
    }

    for row in &rows.teams {
        let upserted = scoped_row(&registry, row).and_then(|r| registry.upsert_team(&r));
        report.teams.record(upserted.map(|u| u.created));
    }

    for row in &rows.players {
        let Some(sport_id) = registry.resolve_sport(&row.sport).map(|s| s.id.clone()) else {
            debug!(sport = %row.sport, "bulk player row names an unknown sport");
            report.players.record(None);
            continue;
        };
        let team_id = row
            .team
            .as_deref()
            .and_then(|team| registry.resolve_team(&sport_id, team))
            .map(|t| t.id.clone());
        let upserted = registry.upsert_player(&PlayerRow {
            sport_id,
            team_id,
            name: row.name.clone(),
            provenance: provenance(row.external_source.as_deref(), row.external_id.as_deref()),
        });
        report.players.record(upserted.map(|u| u.created));
    }

    info!(created = report.created(), "bulk upsert applied");
    report
}

fn scoped_row(registry: &CatalogRegistry<'_>, row: &BulkScoped) -> Option<ScopedRow> {
    let Some(sport) = registry.resolve_sport(&row.sport) else {
        debug!(sport = %row.sport, "bulk row names an unknown sport");
        return None;
    };
    Some(ScopedRow {
        sport_id: sport.id.clone(),
        name: row.name.clone(),
        provenance: provenance(row.external_source.as_deref(), row.external_id.as_deref()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows() -> BulkCatalogRows {
        serde_json::from_value(json!({
            "sports": [{"name": "Cricket"}, {"name": "Kabaddi", "externalId": "77"}, {"externalId": "1"}],
            "leagues": [
                {"sport": "cricket", "name": "Indian Premier League", "externalId": "4460"},
                {"sport": "Chess", "name": "Candidates"}
            ],
            "teams": [
                {"sport": "Cricket", "name": "Mumbai Indians"},
                {"sport": "CRICKET", "name": "Chennai Super Kings", "externalSource": "admin", "externalId": "csk"}
            ],
            "players": [
                {"sport": "cricket", "team": "mumbai indians", "name": "Rohit Sharma"},
                {"sport": "cricket", "team": "Nobody", "name": "MS Dhoni"},
                {"sport": "cricket", "name": ""}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_bulk_upsert_counts_and_links() {
        let mut doc = CatalogDocument::default();
        let report = bulk_upsert(&mut doc, &rows());

        assert_eq!(report.sports, KindReport { created: 2, total: 3, skipped: 1 });
        assert_eq!(report.leagues, KindReport { created: 1, total: 2, skipped: 1 });
        assert_eq!(report.teams, KindReport { created: 2, total: 2, skipped: 0 });
        assert_eq!(report.players, KindReport { created: 2, total: 3, skipped: 1 });

        let mumbai = doc.teams.iter().find(|t| t.name == "Mumbai Indians").unwrap();
        let rohit = doc.players.iter().find(|p| p.name == "Rohit Sharma").unwrap();
        assert_eq!(rohit.team_id.as_deref(), Some(mumbai.id.as_str()));

        let dhoni = doc.players.iter().find(|p| p.name == "MS Dhoni").unwrap();
        assert_eq!(dhoni.team_id, None);

        let ipl = &doc.leagues[0];
        assert_eq!(ipl.external_source.as_deref(), Some(PROVIDER_SOURCE));
        let csk = doc.teams.iter().find(|t| t.name == "Chennai Super Kings").unwrap();
        assert_eq!(csk.external_source.as_deref(), Some("admin"));
        assert!(doc.sports.iter().all(|s| !s.popular || s.name == "Cricket"));
    }

    #[test]
    fn test_bulk_upsert_is_idempotent() {
        let mut doc = CatalogDocument::default();
        bulk_upsert(&mut doc, &rows());
        let counts = (doc.sports.len(), doc.leagues.len(), doc.teams.len(), doc.players.len());

        let again = bulk_upsert(&mut doc, &rows());
        assert_eq!(again.created(), 0);
        assert_eq!(counts, (doc.sports.len(), doc.leagues.len(), doc.teams.len(), doc.players.len()));
    }

    #[test]
    fn test_empty_rows() {
        assert!(BulkCatalogRows::default().is_empty());
        let mut doc = CatalogDocument::default();
        assert_eq!(bulk_upsert(&mut doc, &BulkCatalogRows::default()), BulkUpsertReport::default());
    }
}
