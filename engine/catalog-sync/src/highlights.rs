//! Fixture highlights for a sport's leagues

use catalog_registry::name_key;
use persistence::{CatalogDocument, CatalogRecord, Highlight};
use sportsdb_client::{endpoints, ProviderEvent, SportsDataProvider};
use std::sync::Arc;
use tracing::{debug, warn};

/// Leagues examined per request
pub const MAX_HIGHLIGHT_LEAGUES: usize = 2;

/// A league to pull fixtures for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeagueTarget {
    pub name: String,
    pub external_id: String,
}

/// Candidate leagues, in stored order: provider-backed leagues of the sport,
/// narrowed to `preferred` when the user follows specific leagues
pub fn candidate_leagues(doc: &CatalogDocument, sport_id: &str, preferred: &[String]) -> Vec<LeagueTarget> {
    doc.leagues
        .iter()
        .filter(|l| l.sport_id == sport_id && l.is_provider_backed())
        .filter(|l| preferred.is_empty() || preferred.contains(&l.id))
        .filter_map(|l| {
            Some(LeagueTarget { name: l.name.clone(), external_id: l.external_id.clone()? })
        })
        .take(MAX_HIGHLIGHT_LEAGUES)
        .collect()
}

/// Id match first, then league name key (case and punctuation aside,
/// hyphens count); with nothing to compare the event is accepted
fn event_matches(event: &ProviderEvent, target: &LeagueTarget) -> bool {
    if let Some(id) = event.league_id.as_deref() {
        return id == target.external_id;
    }
    match event.league.as_deref() {
        Some(name) if !target.name.is_empty() => name_key(name) == name_key(&target.name),
        _ => true,
    }
}

pub struct HighlightsResolver {
    provider: Arc<dyn SportsDataProvider>,
}

impl HighlightsResolver {
    pub fn new(provider: Arc<dyn SportsDataProvider>) -> Self {
        Self { provider }
    }

    pub async fn fetch_highlights(
        &self,
        doc: &CatalogDocument,
        sport_id: &str,
        limit: usize,
        preferred_league_ids: &[String],
    ) -> Vec<Highlight> {
        let targets = candidate_leagues(doc, sport_id, preferred_league_ids);
        self.fetch_for(&targets, limit).await
    }

    /// Upcoming fixtures per league, falling back to recent results
    pub async fn fetch_for(&self, targets: &[LeagueTarget], limit: usize) -> Vec<Highlight> {
        let mut highlights = Vec::new();

        for target in targets {
            if highlights.len() >= limit {
                break;
            }

            let events = match endpoints::next_league_events(&*self.provider, &target.external_id).await {
                Ok(events) if !events.is_empty() => events,
                Ok(_) => self.past_events(target).await,
                Err(e) => {
                    debug!(league = %target.name, error = %e, "upcoming fixtures unavailable, trying past");
                    self.past_events(target).await
                }
            };

            for event in events.iter().filter(|e| event_matches(e, target)) {
                let Some(title) = event.title() else { continue };
                highlights.push(Highlight {
                    league: event.league.clone().unwrap_or_else(|| target.name.clone()),
                    title,
                    date: event.date.clone(),
                    time: event.time.clone(),
                });
                if highlights.len() >= limit {
                    break;
                }
            }
        }

        highlights.truncate(limit);
        highlights
    }

    async fn past_events(&self, target: &LeagueTarget) -> Vec<ProviderEvent> {
        endpoints::past_league_events(&*self.provider, &target.external_id)
            .await
            .unwrap_or_else(|e| {
                warn!(league = %target.name, error = %e, "past fixtures unavailable");
                Vec::new()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_registry::{CatalogRegistry, ScopedRow, SportRow};
    use serde_json::json;
    use sportsdb_client::endpoints::{EVENTS_NEXT_LEAGUE, EVENTS_PAST_LEAGUE};
    use sportsdb_client::fake::ScriptedProvider;

    fn doc() -> (CatalogDocument, String, Vec<String>) {
        let mut doc = CatalogDocument::default();
        let mut registry = CatalogRegistry::new(&mut doc);
        let sport = registry.upsert_sport(&SportRow::from_provider(Some("Soccer"), None)).unwrap().id;
        let leagues = vec![
            registry.upsert_league(&ScopedRow::from_provider(&sport, Some("Local Sunday League"), None)).unwrap().id,
            registry.upsert_league(&ScopedRow::from_provider(&sport, Some("English Premier League"), Some("4328"))).unwrap().id,
            registry.upsert_league(&ScopedRow::from_provider(&sport, Some("Spanish La Liga"), Some("4335"))).unwrap().id,
            registry.upsert_league(&ScopedRow::from_provider(&sport, Some("German Bundesliga"), Some("4331"))).unwrap().id,
        ];
        (doc, sport, leagues)
    }

    #[test]
    fn test_candidates_are_provider_backed_and_capped() {
        let (doc, sport, leagues) = doc();

        let all = candidate_leagues(&doc, &sport, &[]);
        assert_eq!(all.iter().map(|t| t.external_id.as_str()).collect::<Vec<_>>(), vec!["4328", "4335"]);

        let preferred = candidate_leagues(&doc, &sport, &[leagues[3].clone(), leagues[0].clone()]);
        assert_eq!(preferred.len(), 1);
        assert_eq!(preferred[0].external_id, "4331");
    }

    #[test]
    fn test_event_matching() {
        let target = LeagueTarget { name: "English Premier League".into(), external_id: "4328".into() };
        let event = |id: Option<&str>, name: Option<&str>| ProviderEvent {
            league_id: id.map(str::to_string),
            league: name.map(str::to_string),
            ..Default::default()
        };

        assert!(event_matches(&event(Some("4328"), Some("Whatever")), &target));
        assert!(!event_matches(&event(Some("4335"), Some("English Premier League")), &target));
        assert!(event_matches(&event(None, Some("ENGLISH  Premier League.")), &target));
        assert!(!event_matches(&event(None, Some("english premier-league")), &target));
        assert!(!event_matches(&event(None, Some("La Liga")), &target));
        assert!(event_matches(&event(None, None), &target));
    }

    #[tokio::test]
    async fn test_upcoming_then_past_fallback_and_limit() {
        let (doc, sport, _) = doc();
        let provider = ScriptedProvider::new();
        provider
            .respond(
                EVENTS_NEXT_LEAGUE,
                &[("id", "4328")],
                json!({"events": [
                    {"strEvent": "Arsenal vs Chelsea", "idLeague": "4328", "strLeague": "English Premier League", "dateEvent": "2026-10-18", "strTime": "15:00:00"},
                    {"strEvent": "Wrong League Match", "idLeague": "9999"}
                ]}),
            )
            .respond(EVENTS_NEXT_LEAGUE, &[("id", "4335")], json!({"events": null}))
            .respond(
                EVENTS_PAST_LEAGUE,
                &[("id", "4335")],
                json!({"events": [
                    {"strHomeTeam": "Real Madrid", "strAwayTeam": "Barcelona", "idLeague": 4335},
                    {"strEvent": "Sevilla vs Betis", "idLeague": "4335"},
                    {"strEvent": "Valencia vs Girona", "idLeague": "4335"}
                ]}),
            );
        let provider = Arc::new(provider);
        let resolver = HighlightsResolver::new(provider.clone());

        let highlights = resolver.fetch_highlights(&doc, &sport, 3, &[]).await;

        assert_eq!(highlights.len(), 3);
        assert_eq!(highlights[0].title, "Arsenal vs Chelsea");
        assert_eq!(highlights[0].date.as_deref(), Some("2026-10-18"));
        assert_eq!(highlights[1].title, "Real Madrid vs Barcelona");
        assert_eq!(highlights[1].league, "Spanish La Liga");
        assert_eq!(highlights[2].title, "Sevilla vs Betis");
        assert_eq!(provider.call_count(EVENTS_PAST_LEAGUE), 1);
    }

    #[tokio::test]
    async fn test_stops_once_limit_reached() {
        let (doc, sport, _) = doc();
        let provider = ScriptedProvider::new();
        provider.respond(
            EVENTS_NEXT_LEAGUE,
            &[("id", "4328")],
            json!({"events": [{"strEvent": "A vs B"}, {"strEvent": "C vs D"}]}),
        );
        let provider = Arc::new(provider);
        let resolver = HighlightsResolver::new(provider.clone());

        let highlights = resolver.fetch_highlights(&doc, &sport, 2, &[]).await;
        assert_eq!(highlights.len(), 2);
        assert_eq!(provider.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_provider_failure_yields_empty() {
        let (doc, sport, _) = doc();
        let provider = ScriptedProvider::new();
        provider.fail(EVENTS_NEXT_LEAGUE, &[]).fail(EVENTS_PAST_LEAGUE, &[]);
        let resolver = HighlightsResolver::new(Arc::new(provider));

        assert!(resolver.fetch_highlights(&doc, &sport, 3, &[]).await.is_empty());
        assert!(resolver.fetch_highlights(&doc, "other-sport", 3, &[]).await.is_empty());
    }
}
