use crate::normalize::{is_popular_sport, name_key, normalize_name, slugify};
use crate::types::{PlayerRow, Provenance, ScopedRow, SportRow, Upserted};
use chrono::Utc;
use persistence::{CatalogDocument, CatalogRecord, League, Player, Sport, Team};
use std::collections::{HashMap, HashSet};
use tracing::debug;
use uuid::Uuid;

/// Lookup tables over one record collection
///
/// Keys are scoped by owning sport. Values are positions in the collection;
/// records are never removed, so positions stay valid for the registry's life.
#[derive(Debug, Default)]
struct ScopedIndex {
    /// (scope, source, external id) -> position
    by_external: HashMap<(String, String, String), usize>,

    /// (scope, name key) -> position of the first record with that name
    by_name: HashMap<(String, String), usize>,
}

impl ScopedIndex {
    fn build<R: CatalogRecord>(records: &[R]) -> Self {
        let mut index = Self::default();
        for (pos, record) in records.iter().enumerate() {
            index.insert(pos, record);
        }
        index
    }

    fn insert<R: CatalogRecord>(&mut self, pos: usize, record: &R) {
        if let (Some(source), Some(id)) = (record.external_source(), record.external_id()) {
            self.by_external
                .entry((record.scope_id().to_string(), source.to_string(), id.to_string()))
                .or_insert(pos);
        }
        let name = name_key(record.name());
        if !name.is_empty() {
            self.by_name.entry((record.scope_id().to_string(), name)).or_insert(pos);
        }
    }

    /// Probe the external-id index first, then the name index.
    ///
    /// A name hit is rejected when both sides carry ids from the same source
    /// and those ids differ: that is two distinct entities sharing a name.
    fn probe<R: CatalogRecord>(
        &self,
        records: &[R],
        scope: &str,
        provenance: Option<&Provenance>,
        normalized: &str,
    ) -> Option<usize> {
        if let Some(p) = provenance {
            let key = (scope.to_string(), p.source.clone(), p.id.clone());
            if let Some(&pos) = self.by_external.get(&key) {
                return Some(pos);
            }
        }

        let pos = *self.by_name.get(&(scope.to_string(), normalized.to_string()))?;
        let existing = &records[pos];
        match (provenance, existing.external_source(), existing.external_id()) {
            (Some(p), Some(source), Some(id)) if source == p.source && id != p.id => None,
            _ => Some(pos),
        }
    }
}

/// Write access to provenance fields, for backfill
trait Provenanced: CatalogRecord {
    fn set_provenance(&mut self, provenance: &Provenance);
}

macro_rules! provenanced {
    ($($ty:ty),*) => {
        $(impl Provenanced for $ty {
            fn set_provenance(&mut self, provenance: &Provenance) {
                self.external_source = Some(provenance.source.clone());
                self.external_id = Some(provenance.id.clone());
            }
        })*
    };
}

provenanced!(Sport, League, Team, Player);

/// Entity Merge Engine
///
/// Turns raw rows into canonical catalog records without duplicates. A row
/// matches an existing record by `(externalSource, externalId)` or by
/// normalized name within the same sport. Matching records only ever gain
/// provenance (and, for players, a fresher team link); everything else is
/// left untouched. Re-applying the same rows is a no-op.
pub struct CatalogRegistry<'a> {
    doc: &'a mut CatalogDocument,
    sport_ids: HashSet<String>,
    sports: ScopedIndex,
    leagues: ScopedIndex,
    teams: ScopedIndex,
    players: ScopedIndex,
}

impl<'a> CatalogRegistry<'a> {
    /// Index the document's catalog
    pub fn new(doc: &'a mut CatalogDocument) -> Self {
        Self {
            sport_ids: doc.sports.iter().map(|s| s.id.clone()).collect(),
            sports: ScopedIndex::build(&doc.sports),
            leagues: ScopedIndex::build(&doc.leagues),
            teams: ScopedIndex::build(&doc.teams),
            players: ScopedIndex::build(&doc.players),
            doc,
        }
    }

    /// The underlying document
    pub fn document(&self) -> &CatalogDocument {
        self.doc
    }

    pub fn upsert_sport(&mut self, row: &SportRow) -> Option<Upserted> {
        let name = required_name(row.name.as_deref())?;
        let normalized = name_key(name);
        let provenance = row.provenance.as_ref();

        if let Some(pos) = self.sports.probe(&self.doc.sports, "", provenance, &normalized) {
            backfill(&mut self.doc.sports[pos], &mut self.sports, pos, provenance);
            return Some(Upserted { id: self.doc.sports[pos].id.clone(), created: false });
        }

        let sport = Sport {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            slug: slugify(name),
            popular: is_popular_sport(&normalize_name(name)),
            external_source: provenance.map(|p| p.source.clone()),
            external_id: provenance.map(|p| p.id.clone()),
            created_at: Utc::now(),
        };
        debug!(sport = %sport.name, "creating sport");

        let pos = self.doc.sports.len();
        self.sports.insert(pos, &sport);
        self.sport_ids.insert(sport.id.clone());
        let id = sport.id.clone();
        self.doc.sports.push(sport);
        Some(Upserted { id, created: true })
    }

    pub fn upsert_league(&mut self, row: &ScopedRow) -> Option<Upserted> {
        let name = required_name(row.name.as_deref())?;
        if !self.known_sport(&row.sport_id) {
            return None;
        }
        let normalized = name_key(name);
        let provenance = row.provenance.as_ref();

        if let Some(pos) = self.leagues.probe(&self.doc.leagues, &row.sport_id, provenance, &normalized) {
            backfill(&mut self.doc.leagues[pos], &mut self.leagues, pos, provenance);
            return Some(Upserted { id: self.doc.leagues[pos].id.clone(), created: false });
        }

        let league = League {
            id: Uuid::new_v4().to_string(),
            sport_id: row.sport_id.clone(),
            name: name.to_string(),
            slug: slugify(name),
            external_source: provenance.map(|p| p.source.clone()),
            external_id: provenance.map(|p| p.id.clone()),
            created_at: Utc::now(),
        };

        let pos = self.doc.leagues.len();
        self.leagues.insert(pos, &league);
        let id = league.id.clone();
        self.doc.leagues.push(league);
        Some(Upserted { id, created: true })
    }

    pub fn upsert_team(&mut self, row: &ScopedRow) -> Option<Upserted> {
        let name = required_name(row.name.as_deref())?;
        if !self.known_sport(&row.sport_id) {
            return None;
        }
        let normalized = name_key(name);
        let provenance = row.provenance.as_ref();

        if let Some(pos) = self.teams.probe(&self.doc.teams, &row.sport_id, provenance, &normalized) {
            backfill(&mut self.doc.teams[pos], &mut self.teams, pos, provenance);
            return Some(Upserted { id: self.doc.teams[pos].id.clone(), created: false });
        }

        let team = Team {
            id: Uuid::new_v4().to_string(),
            sport_id: row.sport_id.clone(),
            name: name.to_string(),
            slug: slugify(name),
            external_source: provenance.map(|p| p.source.clone()),
            external_id: provenance.map(|p| p.id.clone()),
            created_at: Utc::now(),
        };

        let pos = self.doc.teams.len();
        self.teams.insert(pos, &team);
        let id = team.id.clone();
        self.doc.teams.push(team);
        Some(Upserted { id, created: true })
    }

    pub fn upsert_player(&mut self, row: &PlayerRow) -> Option<Upserted> {
        let name = required_name(row.name.as_deref())?;
        if !self.known_sport(&row.sport_id) {
            return None;
        }
        let normalized = name_key(name);
        let provenance = row.provenance.as_ref();

        if let Some(pos) = self.players.probe(&self.doc.players, &row.sport_id, provenance, &normalized) {
            let player = &mut self.doc.players[pos];
            if row.team_id.is_some() && player.team_id != row.team_id {
                player.team_id = row.team_id.clone();
            }
            backfill(player, &mut self.players, pos, provenance);
            return Some(Upserted { id: self.doc.players[pos].id.clone(), created: false });
        }

        let player = Player {
            id: Uuid::new_v4().to_string(),
            sport_id: row.sport_id.clone(),
            team_id: row.team_id.clone(),
            name: name.to_string(),
            external_source: provenance.map(|p| p.source.clone()),
            external_id: provenance.map(|p| p.id.clone()),
            created_at: Utc::now(),
        };

        let pos = self.doc.players.len();
        self.players.insert(pos, &player);
        let id = player.id.clone();
        self.doc.players.push(player);
        Some(Upserted { id, created: true })
    }

    /// Resolve a sport by id, then by normalized name
    pub fn resolve_sport(&self, reference: &str) -> Option<&Sport> {
        if let Some(sport) = self.doc.sport(reference) {
            return Some(sport);
        }
        let pos = self.sports.by_name.get(&(String::new(), name_key(reference)))?;
        self.doc.sports.get(*pos)
    }

    /// Resolve a team of `sport_id` by id, then by normalized name
    pub fn resolve_team(&self, sport_id: &str, reference: &str) -> Option<&Team> {
        if let Some(team) = self.doc.team(reference).filter(|t| t.sport_id == sport_id) {
            return Some(team);
        }
        let pos = self.teams.by_name.get(&(sport_id.to_string(), name_key(reference)))?;
        self.doc.teams.get(*pos)
    }

    fn known_sport(&self, sport_id: &str) -> bool {
        let known = self.sport_ids.contains(sport_id);
        if !known {
            debug!(sport_id, "row references an unknown sport, skipping");
        }
        known
    }
}

/// Resolve a sport by id, then by name key, without building indexes
pub fn find_sport<'d>(doc: &'d CatalogDocument, reference: &str) -> Option<&'d Sport> {
    if let Some(sport) = doc.sport(reference) {
        return Some(sport);
    }
    let key = name_key(reference);
    if key.is_empty() {
        return None;
    }
    doc.sports.iter().find(|s| name_key(&s.name) == key)
}

fn required_name(name: Option<&str>) -> Option<&str> {
    name.map(str::trim).filter(|n| !n.is_empty())
}

/// Fill in missing provenance; existing provenance is never replaced
fn backfill<R: Provenanced>(
    record: &mut R,
    index: &mut ScopedIndex,
    pos: usize,
    provenance: Option<&Provenance>,
) {
    let Some(provenance) = provenance else { return };
    if record.external_id().is_some() {
        return;
    }
    record.set_provenance(provenance);
    index.insert(pos, &*record);
}
