//! Catalog Sync Orchestrator
//!
//! A sync walks leagues -> teams -> rosters for one sport, merging everything
//! it sees through the registry. Each stage checks a wall-clock budget and a
//! set of caps before issuing the next provider call; whatever was merged
//! before a stop is kept, so repeated runs converge the catalog.

use crate::error::{Result, SyncError};
use crate::options::{SyncOptions, SyncPolicy};
use catalog_registry::{
    bulk_upsert, is_soccer, name_key, BulkCatalogRows, BulkUpsertReport, CatalogRegistry, PlayerRow,
    ScopedRow, SportRow,
};
use chrono::{DateTime, Utc};
use persistence::{
    CatalogDocument, CatalogRecord, CatalogSyncState, Sport, SyncCounts, SyncHistoryEntry, SyncStatus,
    PROVIDER_SOURCE,
};
use serde::{Deserialize, Serialize};
use sportsdb_client::{endpoints, ProviderError, ProviderTeam, SportsDataProvider};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// History `type` of a per-sport crawl
pub const HISTORY_KIND_CATALOG: &str = "catalog";
/// History `type` of a sports-list sync
pub const HISTORY_KIND_SPORTS: &str = "sports";
/// History `type` of an admin import
pub const HISTORY_KIND_BULK: &str = "bulk_upsert";
/// History `source` of an admin import
pub const ADMIN_SOURCE: &str = "admin";

/// Result of one `sync_sport_catalog` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOutcome {
    pub ok: bool,
    pub status: SyncStatus,
    pub skipped: bool,
    pub timed_out: bool,
    pub created_teams: usize,
    pub created_players: usize,
    pub created_leagues: usize,
    pub touched_teams: usize,
    /// Real-catalog totals after the run
    pub counts: SyncCounts,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of a sports-list sync
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SportsSyncOutcome {
    pub ok: bool,
    pub status: SyncStatus,
    pub created: usize,
    pub total: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Mutable tally for one crawl
struct Run {
    started: Instant,
    budget: Duration,
    timed_out: bool,
    seen_teams: HashSet<String>,
    roster_fetches: usize,
    touched_teams: usize,
    created_teams: usize,
    created_players: usize,
    created_leagues: usize,
}

impl Run {
    fn new(budget: Duration) -> Self {
        Self {
            started: Instant::now(),
            budget,
            timed_out: false,
            seen_teams: HashSet::new(),
            roster_fetches: 0,
            touched_teams: 0,
            created_teams: 0,
            created_players: 0,
            created_leagues: 0,
        }
    }

    /// Budget check made before every provider call
    fn out_of_time(&mut self) -> bool {
        if !self.timed_out && self.started.elapsed() >= self.budget {
            debug!(elapsed_ms = self.started.elapsed().as_millis() as u64, "sync time budget exhausted");
            self.timed_out = true;
        }
        self.timed_out
    }

    fn merged_anything(&self) -> bool {
        self.touched_teams + self.created_players + self.created_leagues > 0
    }
}

/// Provider-backed entity counts for one sport
pub fn real_catalog_counts(doc: &CatalogDocument, sport_id: &str) -> SyncCounts {
    fn count<R: CatalogRecord>(records: &[R], sport_id: &str) -> usize {
        records.iter().filter(|r| r.scope_id() == sport_id && r.is_provider_backed()).count()
    }
    SyncCounts {
        teams: count(&doc.teams, sport_id),
        players: count(&doc.players, sport_id),
        leagues: count(&doc.leagues, sport_id),
        ..SyncCounts::default()
    }
}

/// Stored sync bookkeeping for a sport
pub fn sync_state<'a>(doc: &'a CatalogDocument, sport_id: &str) -> Option<&'a CatalogSyncState> {
    doc.catalog_sync_state.get(sport_id)
}

/// Newest-first sync history, at most `limit` entries
pub fn list_history(doc: &CatalogDocument, limit: usize) -> &[SyncHistoryEntry] {
    &doc.sync_history[..limit.min(doc.sync_history.len())]
}

/// Drives catalog crawls against a sports data provider
pub struct CatalogSyncer {
    provider: Arc<dyn SportsDataProvider>,
    policy: SyncPolicy,
}

impl CatalogSyncer {
    pub fn new(provider: Arc<dyn SportsDataProvider>) -> Self {
        Self::with_policy(provider, SyncPolicy::default())
    }

    pub fn with_policy(provider: Arc<dyn SportsDataProvider>, policy: SyncPolicy) -> Self {
        Self { provider, policy }
    }

    pub fn policy(&self) -> &SyncPolicy {
        &self.policy
    }

    /// Crawl one sport's leagues, teams and rosters into `doc`
    pub async fn sync_sport_catalog(
        &self,
        doc: &mut CatalogDocument,
        sport_id: &str,
        options: &SyncOptions,
    ) -> Result<SyncOutcome> {
        let sport = doc.sport(sport_id).cloned().ok_or_else(|| SyncError::SportNotFound(sport_id.to_string()))?;
        let now = Utc::now();
        let before = real_catalog_counts(doc, sport_id);

        if !options.force && self.within_cooldown(doc, sport_id, now, options) && self.is_rich(&before) {
            info!(sport = %sport.name, teams = before.teams, players = before.players, "catalog is fresh, skipping sync");
            return Ok(SyncOutcome {
                ok: true,
                status: SyncStatus::Ok,
                skipped: true,
                timed_out: false,
                created_teams: 0,
                created_players: 0,
                created_leagues: 0,
                touched_teams: 0,
                counts: before,
                reason: Some("cooldown".to_string()),
                error: None,
            });
        }

        info!(sport = %sport.name, force = options.force, "starting catalog sync");
        let mut run = Run::new(options.max_duration());
        let crawl = {
            let mut registry = CatalogRegistry::new(doc);
            self.crawl(&mut registry, &sport, options, &mut run).await
        };
        // a last call that overran the budget still counts
        run.out_of_time();

        let mut counts = real_catalog_counts(doc, sport_id);
        counts.touched_teams = run.touched_teams;
        counts.created_teams = run.created_teams;
        counts.created_players = run.created_players;
        counts.created_leagues = run.created_leagues;
        let has_data = counts.teams + counts.players + counts.leagues > 0;

        let (status, failure) = match crawl {
            Err(e) if !run.merged_anything() => (SyncStatus::Error, Some(e)),
            Err(e) => (SyncStatus::Partial, Some(e)),
            Ok(()) if run.timed_out => (SyncStatus::Partial, None),
            Ok(()) if counts.teams > 0 || counts.players > 0 => (SyncStatus::Ok, None),
            Ok(()) if counts.leagues > 0 => (SyncStatus::Partial, None),
            Ok(()) => (SyncStatus::NoData, None),
        };
        let detail = failure.as_ref().map(ToString::to_string);

        let previous_success = doc.catalog_sync_state.get(sport_id).and_then(|s| s.last_success_at);
        let last_success_at = if status != SyncStatus::Error && has_data { Some(now) } else { previous_success };
        doc.catalog_sync_state.insert(
            sport_id.to_string(),
            CatalogSyncState {
                last_attempt_at: now,
                last_success_at,
                status,
                timed_out: run.timed_out,
                counts,
                last_error: detail.clone(),
            },
        );
        doc.push_history(SyncHistoryEntry {
            id: Uuid::new_v4().to_string(),
            at: now,
            source: PROVIDER_SOURCE.to_string(),
            kind: HISTORY_KIND_CATALOG.to_string(),
            sport_id: Some(sport_id.to_string()),
            status,
            counts,
            detail: detail.clone(),
        });

        match &failure {
            Some(e) => warn!(sport = %sport.name, %status, error = %e, "catalog sync hit a provider error"),
            None => info!(
                sport = %sport.name,
                %status,
                timed_out = run.timed_out,
                touched_teams = run.touched_teams,
                created_teams = run.created_teams,
                created_players = run.created_players,
                created_leagues = run.created_leagues,
                "catalog sync finished"
            ),
        }

        let ok = status != SyncStatus::Error;
        Ok(SyncOutcome {
            ok,
            status,
            skipped: false,
            timed_out: run.timed_out,
            created_teams: run.created_teams,
            created_players: run.created_players,
            created_leagues: run.created_leagues,
            touched_teams: run.touched_teams,
            counts,
            reason: if ok { None } else { Some("provider_error".to_string()) },
            error: detail,
        })
    }

    fn within_cooldown(&self, doc: &CatalogDocument, sport_id: &str, now: DateTime<Utc>, options: &SyncOptions) -> bool {
        doc.catalog_sync_state
            .get(sport_id)
            .and_then(|state| state.last_success_at)
            .map(|last| now.signed_duration_since(last) < options.cooldown())
            .unwrap_or(false)
    }

    fn is_rich(&self, counts: &SyncCounts) -> bool {
        counts.teams >= self.policy.rich_team_threshold || counts.players >= self.policy.rich_player_threshold
    }

    /// Only a failure of the league listing propagates; later stages log and move on
    async fn crawl(
        &self,
        registry: &mut CatalogRegistry<'_>,
        sport: &Sport,
        options: &SyncOptions,
        run: &mut Run,
    ) -> std::result::Result<(), ProviderError> {
        if run.out_of_time() {
            return Ok(());
        }

        let target = name_key(&sport.name);
        let leagues = endpoints::all_leagues(&*self.provider).await?;
        for league in &leagues {
            let matches = league.sport.as_deref().map(name_key).as_deref() == Some(target.as_str());
            if !matches {
                continue;
            }
            let row = ScopedRow::from_provider(&sport.id, league.name.as_deref(), league.id.as_deref());
            if let Some(upserted) = registry.upsert_league(&row) {
                if upserted.created {
                    run.created_leagues += 1;
                }
            }
        }

        let retained: Vec<String> = registry
            .document()
            .leagues
            .iter()
            .filter(|l| l.sport_id == sport.id && l.is_provider_backed())
            .take(options.max_leagues)
            .map(|l| l.name.clone())
            .collect();
        debug!(sport = %sport.name, leagues = retained.len(), "expanding leagues");

        for league in &retained {
            if run.touched_teams >= options.max_teams || run.out_of_time() {
                break;
            }
            match endpoints::teams_by_league(&*self.provider, league).await {
                Ok(teams) => self.merge_teams(registry, sport, &teams, options, run).await,
                Err(e) => warn!(sport = %sport.name, league = %league, error = %e, "league team fetch failed, skipping"),
            }
        }

        if is_soccer(&sport.name) {
            self.soccer_country_fallback(registry, sport, options, run).await;
        }

        Ok(())
    }

    /// Soccer leagues on the provider are thin; top up from the largest
    /// national searches when the league pass came back short.
    async fn soccer_country_fallback(
        &self,
        registry: &mut CatalogRegistry<'_>,
        sport: &Sport,
        options: &SyncOptions,
        run: &mut Run,
    ) {
        let floor = options.max_teams.min(self.policy.soccer_fallback_min_teams);
        if run.touched_teams >= floor {
            return;
        }
        info!(touched_teams = run.touched_teams, floor, "soccer league pass came back short, searching by country");

        for country in &self.policy.soccer_fallback_countries {
            if run.touched_teams >= options.max_teams || run.out_of_time() {
                break;
            }
            match endpoints::teams_by_country(&*self.provider, &self.policy.soccer_provider_name, country).await {
                Ok(teams) => self.merge_teams(registry, sport, &teams, options, run).await,
                Err(e) => warn!(country = %country, error = %e, "country team fetch failed, skipping"),
            }
        }
    }

    async fn merge_teams(
        &self,
        registry: &mut CatalogRegistry<'_>,
        sport: &Sport,
        teams: &[ProviderTeam],
        options: &SyncOptions,
        run: &mut Run,
    ) {
        let target = name_key(&sport.name);

        for team in teams {
            if run.touched_teams >= options.max_teams || run.timed_out {
                break;
            }
            if let Some(team_sport) = team.sport.as_deref() {
                if name_key(team_sport) != target {
                    continue;
                }
            }
            if let Some(id) = &team.id {
                if !run.seen_teams.insert(id.clone()) {
                    continue;
                }
            }

            let row = ScopedRow::from_provider(&sport.id, team.name.as_deref(), team.id.as_deref());
            let Some(upserted) = registry.upsert_team(&row) else { continue };
            run.touched_teams += 1;
            if upserted.created {
                run.created_teams += 1;
            }

            let Some(external_id) = team.id.as_deref() else { continue };
            if run.roster_fetches >= options.max_player_teams || run.out_of_time() {
                continue;
            }
            run.roster_fetches += 1;

            let players = match endpoints::players_by_team(&*self.provider, external_id).await {
                Ok(players) => players,
                Err(e) => {
                    warn!(team = ?team.name, error = %e, "roster fetch failed, skipping");
                    continue;
                }
            };
            for player in players.iter().take(options.players_per_team_cap) {
                let row = PlayerRow::from_provider(
                    &sport.id,
                    Some(upserted.id.as_str()),
                    player.name.as_deref(),
                    player.id.as_deref(),
                );
                if registry.upsert_player(&row).is_some_and(|u| u.created) {
                    run.created_players += 1;
                }
            }
        }
    }

    /// Pull the provider's sport list into the catalog
    pub async fn sync_sports(&self, doc: &mut CatalogDocument) -> SportsSyncOutcome {
        let now = Utc::now();

        let outcome = match endpoints::all_sports(&*self.provider).await {
            Ok(rows) => {
                let mut registry = CatalogRegistry::new(doc);
                let mut created = 0;
                for row in &rows {
                    let upserted = registry.upsert_sport(&SportRow::from_provider(row.name.as_deref(), row.id.as_deref()));
                    if upserted.is_some_and(|u| u.created) {
                        created += 1;
                    }
                }
                let status = if rows.is_empty() { SyncStatus::NoData } else { SyncStatus::Ok };
                info!(created, total = rows.len(), "sports list synced");
                SportsSyncOutcome { ok: true, status, created, total: rows.len(), reason: None, error: None }
            }
            Err(e) => {
                warn!(error = %e, "sports list sync failed");
                SportsSyncOutcome {
                    ok: false,
                    status: SyncStatus::Error,
                    created: 0,
                    total: 0,
                    reason: Some("provider_error".to_string()),
                    error: Some(e.to_string()),
                }
            }
        };

        doc.push_history(SyncHistoryEntry {
            id: Uuid::new_v4().to_string(),
            at: now,
            source: PROVIDER_SOURCE.to_string(),
            kind: HISTORY_KIND_SPORTS.to_string(),
            sport_id: None,
            status: outcome.status,
            counts: SyncCounts::default(),
            detail: outcome.error.clone().or_else(|| Some(format!("{} of {} sports created", outcome.created, outcome.total))),
        });

        outcome
    }

    /// Admin import; goes through the same merge rules as provider rows
    pub fn import_rows(&self, doc: &mut CatalogDocument, rows: &BulkCatalogRows) -> Result<BulkUpsertReport> {
        if rows.is_empty() {
            return Err(SyncError::NothingToImport);
        }

        let report = bulk_upsert(doc, rows);
        let counts = SyncCounts {
            teams: report.teams.total,
            players: report.players.total,
            leagues: report.leagues.total,
            touched_teams: report.teams.total - report.teams.skipped,
            created_teams: report.teams.created,
            created_players: report.players.created,
            created_leagues: report.leagues.created,
        };
        doc.push_history(SyncHistoryEntry {
            id: Uuid::new_v4().to_string(),
            at: Utc::now(),
            source: ADMIN_SOURCE.to_string(),
            kind: HISTORY_KIND_BULK.to_string(),
            sport_id: None,
            status: SyncStatus::Ok,
            counts,
            detail: Some(format!(
                "sports {}/{}, skipped rows {}",
                report.sports.created,
                report.sports.total,
                report.sports.skipped + report.leagues.skipped + report.teams.skipped + report.players.skipped
            )),
        });

        Ok(report)
    }
}
