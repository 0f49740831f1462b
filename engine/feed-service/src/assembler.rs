//! Home feed assembly
//!
//! One section per followed sport. Fresh cache entries are served as-is; stale
//! or missing ones are refreshed live, at most `max_live_refreshes` per
//! request, with each fetch raced against a soft deadline. Sports past the
//! refresh quota serve whatever the cache holds.

use crate::cache::{cached_entry, is_fresh, store_entry};
use crate::config::FeedConfig;
use crate::interests::followed_sport_ids;
use crate::preference::sport_interests;
use catalog_sync::HighlightsResolver;
use chrono::{DateTime, Utc};
use persistence::{CatalogDocument, FeedCacheEntry, Highlight, NewsItem, Sport};
use serde::{Deserialize, Serialize};
use sportsdb_client::{FeedItem, NewsProvider, SportsDataProvider};
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionSport {
    pub id: String,
    pub name: String,
    pub slug: String,
}

impl From<&Sport> for SectionSport {
    fn from(sport: &Sport) -> Self {
        Self { id: sport.id.clone(), name: sport.name.clone(), slug: sport.slug.clone() }
    }
}

/// Followed entities within the section's sport
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedCounts {
    pub teams: usize,
    pub players: usize,
    pub leagues: usize,
}

/// Where a section's content came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionSource {
    Cache,
    Live,
    /// Past the refresh quota; stale or empty cache content
    Stale,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedSection {
    pub sport: SectionSport,
    pub counts: FeedCounts,
    pub highlights: Vec<Highlight>,
    pub news: Vec<NewsItem>,
    pub source: SectionSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedResponse {
    pub sections: Vec<FeedSection>,
    pub total: usize,
}

/// A built feed and how many live refreshes it took; the document only
/// needs saving when `refreshed > 0`
#[derive(Debug, Clone, PartialEq)]
pub struct FeedBuild {
    pub response: FeedResponse,
    pub refreshed: usize,
}

fn news_item(item: FeedItem) -> NewsItem {
    NewsItem { title: item.title, link: item.link, published_at: item.published_at, source: item.source }
}

/// Stand-in headlines built from fixtures when the news search is empty
pub fn match_update_news(highlights: &[Highlight]) -> Vec<NewsItem> {
    highlights
        .iter()
        .map(|h| NewsItem {
            title: format!("Match update: {}", h.title),
            link: String::new(),
            published_at: h.date.clone(),
            source: h.league.clone(),
        })
        .collect()
}

pub struct FeedAssembler {
    resolver: HighlightsResolver,
    news: Arc<dyn NewsProvider>,
    config: FeedConfig,
}

impl FeedAssembler {
    pub fn new(provider: Arc<dyn SportsDataProvider>, news: Arc<dyn NewsProvider>, config: FeedConfig) -> Self {
        Self { resolver: HighlightsResolver::new(provider), news, config }
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    pub async fn build_feed(&self, doc: &mut CatalogDocument, user_id: &str) -> FeedBuild {
        self.build_feed_at(doc, user_id, Utc::now()).await
    }

    /// Build the feed as of `now`
    pub async fn build_feed_at(&self, doc: &mut CatalogDocument, user_id: &str, now: DateTime<Utc>) -> FeedBuild {
        let ttl = self.config.ttl();
        let per_list = self.config.items_per_list;
        let mut sections = Vec::new();
        let mut refreshed = 0;

        for sport_id in followed_sport_ids(doc, user_id) {
            let Some(sport) = doc.sport(&sport_id).cloned() else { continue };
            let interests = sport_interests(doc, user_id, &sport_id);
            let key = interests.preference_key(&sport_id);
            let counts = FeedCounts {
                teams: interests.team_ids.len(),
                players: interests.player_ids.len(),
                leagues: interests.league_ids.len(),
            };

            let cached = cached_entry(doc, &sport_id, &key).cloned();
            let (entry, source) = match cached {
                Some(entry) if is_fresh(&entry, now, ttl) => {
                    debug!(sport = %sport.name, key = %key, "feed cache hit");
                    (Some(entry), SectionSource::Cache)
                }
                previous if refreshed < self.config.max_live_refreshes => {
                    debug!(sport = %sport.name, key = %key, "feed cache miss, refreshing");
                    refreshed += 1;
                    let team_names: Vec<String> = interests
                        .team_ids
                        .iter()
                        .filter_map(|id| doc.team(id).map(|t| t.name.clone()))
                        .take(self.config.news_query_teams)
                        .collect();
                    let (entry, completed) = self
                        .refresh(doc, &sport, &interests.league_ids, &team_names, previous.as_ref(), now)
                        .await;
                    if completed {
                        store_entry(doc, &sport_id, &key, entry.clone(), self.config.max_variants_per_sport);
                    }
                    (Some(entry), SectionSource::Live)
                }
                previous => (previous, SectionSource::Stale),
            };

            let (mut highlights, mut news) = entry.map(|e| (e.highlights, e.news)).unwrap_or_default();
            highlights.truncate(per_list);
            news.truncate(per_list);
            sections.push(FeedSection { sport: SectionSport::from(&sport), counts, highlights, news, source });
        }

        info!(user_id, sections = sections.len(), refreshed, "feed built");
        let total = sections.len();
        FeedBuild { response: FeedResponse { sections, total }, refreshed }
    }

    /// Race highlights and news against the soft deadline. A fetch that misses
    /// it is dropped, which aborts its request, and the previous cached value
    /// stands in. Returns the entry and whether any fetch completed.
    async fn refresh(
        &self,
        doc: &CatalogDocument,
        sport: &Sport,
        preferred_leagues: &[String],
        team_names: &[String],
        previous: Option<&FeedCacheEntry>,
        now: DateTime<Utc>,
    ) -> (FeedCacheEntry, bool) {
        let soft = self.config.soft_timeout();
        let query = news_query(&sport.name, team_names);

        let (highlights, news) = tokio::join!(
            timeout(
                soft,
                self.resolver.fetch_highlights(doc, &sport.id, self.config.highlight_limit, preferred_leagues)
            ),
            timeout(soft, self.news.news_feed(&query, self.config.news_limit)),
        );

        let completed = highlights.is_ok() || news.is_ok();
        let highlights = highlights.unwrap_or_else(|_| {
            warn!(sport = %sport.name, "highlights missed the soft deadline, serving cached");
            previous.map(|p| p.highlights.clone()).unwrap_or_default()
        });
        let mut news: Vec<NewsItem> = match news {
            Ok(items) => items.into_iter().map(news_item).collect(),
            Err(_) => {
                warn!(sport = %sport.name, "news missed the soft deadline, serving cached");
                previous.map(|p| p.news.clone()).unwrap_or_default()
            }
        };
        if news.is_empty() && !highlights.is_empty() {
            news = match_update_news(&highlights);
        }

        (FeedCacheEntry { fetched_at: now, highlights, news }, completed)
    }
}

/// Sport name, narrowed by followed team names when there are any
fn news_query(sport: &str, team_names: &[String]) -> String {
    if team_names.is_empty() {
        sport.to_string()
    } else {
        format!("{} ({})", sport, team_names.join(" OR "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::cached_entry;
    use crate::interests::{select_sports, set_sport_interests};
    use catalog_registry::{CatalogRegistry, ScopedRow, SportRow};
    use chrono::Duration as ChronoDuration;
    use serde_json::json;
    use sportsdb_client::endpoints::EVENTS_NEXT_LEAGUE;
    use sportsdb_client::fake::{ScriptedNews, ScriptedProvider};
    use std::time::Duration;

    struct Fixture {
        doc: CatalogDocument,
        sports: Vec<String>,
        arsenal: String,
        chelsea: String,
    }

    fn fixture() -> Fixture {
        let mut doc = CatalogDocument::default();
        let mut r = CatalogRegistry::new(&mut doc);
        let sports: Vec<String> = ["Soccer", "Basketball", "Ice Hockey"]
            .iter()
            .map(|name| r.upsert_sport(&SportRow::from_provider(Some(*name), None)).unwrap().id)
            .collect();
        r.upsert_league(&ScopedRow::from_provider(&sports[0], Some("English Premier League"), Some("4328")));
        let arsenal = r.upsert_team(&ScopedRow::from_provider(&sports[0], Some("Arsenal"), Some("133604"))).unwrap().id;
        let chelsea = r.upsert_team(&ScopedRow::from_provider(&sports[0], Some("Chelsea"), Some("133610"))).unwrap().id;
        Fixture { doc, sports, arsenal, chelsea }
    }

    fn provider() -> Arc<ScriptedProvider> {
        let provider = ScriptedProvider::new();
        let events: Vec<_> = (0..5).map(|i| json!({"strEvent": format!("Match {i}"), "idLeague": "4328"})).collect();
        provider.respond(EVENTS_NEXT_LEAGUE, &[("id", "4328")], json!({ "events": events }));
        Arc::new(provider)
    }

    fn headlines(n: usize) -> Vec<FeedItem> {
        (0..n)
            .map(|i| FeedItem {
                title: format!("Headline {i}"),
                link: format!("https://news.example/{i}"),
                published_at: None,
                source: "Wire".to_string(),
            })
            .collect()
    }

    fn assembler(provider: Arc<ScriptedProvider>, news: Arc<ScriptedNews>) -> FeedAssembler {
        FeedAssembler::new(provider, news, FeedConfig::default())
    }

    #[tokio::test]
    async fn test_second_build_within_a_minute_is_a_cache_hit() {
        let mut f = fixture();
        set_sport_interests(&mut f.doc, "u1", &f.sports[0], &[f.arsenal.clone()], &[], &[]).unwrap();
        let provider = provider();
        let news = Arc::new(ScriptedNews::new(headlines(5)));
        let feed = assembler(provider.clone(), news.clone());
        let t = Utc::now();

        let first = feed.build_feed_at(&mut f.doc, "u1", t).await;
        let second = feed.build_feed_at(&mut f.doc, "u1", t + ChronoDuration::minutes(1)).await;

        assert_eq!(first.refreshed, 1);
        assert_eq!(second.refreshed, 0);
        assert_eq!(provider.call_count(EVENTS_NEXT_LEAGUE), 1);
        assert_eq!(news.call_count(), 1);

        let section = &second.response.sections[0];
        assert_eq!(section.source, SectionSource::Cache);
        assert_eq!(section.highlights.len(), 3);
        assert_eq!(section.news.len(), 3);
        assert_eq!(section.counts, FeedCounts { teams: 1, players: 0, leagues: 0 });
        assert_eq!(first.response.sections[0].highlights, section.highlights);
        assert_eq!(first.response.sections[0].news, section.news);

        // Past the TTL the entry is refreshed again
        let third = feed.build_feed_at(&mut f.doc, "u1", t + ChronoDuration::minutes(6)).await;
        assert_eq!(third.refreshed, 1);
    }

    #[tokio::test]
    async fn test_live_refreshes_are_capped_per_request() {
        let mut f = fixture();
        select_sports(&mut f.doc, "u1", &f.sports).unwrap();
        let news = Arc::new(ScriptedNews::new(headlines(1)));
        let feed = assembler(provider(), news.clone());
        let t = Utc::now();

        let build = feed.build_feed_at(&mut f.doc, "u1", t).await;

        assert_eq!(build.refreshed, 2);
        assert_eq!(news.call_count(), 2);
        let sources: Vec<_> = build.response.sections.iter().map(|s| s.source).collect();
        assert_eq!(sources, vec![SectionSource::Live, SectionSource::Live, SectionSource::Stale]);
        assert!(build.response.sections[2].news.is_empty());

        // The next request picks up the sport that missed out
        let next = feed.build_feed_at(&mut f.doc, "u1", t + ChronoDuration::seconds(5)).await;
        assert_eq!(next.refreshed, 1);
        assert_eq!(next.response.sections[2].source, SectionSource::Live);
    }

    #[tokio::test]
    async fn test_sections_follow_user_order_and_scope_counts() {
        let mut f = fixture();
        select_sports(&mut f.doc, "u1", &[f.sports[0].clone(), f.sports[1].clone()]).unwrap();
        set_sport_interests(&mut f.doc, "u1", &f.sports[0], &[f.arsenal.clone(), f.chelsea.clone()], &[], &[]).unwrap();
        crate::interests::set_sport_order(&mut f.doc, "u1", &[f.sports[1].clone()]).unwrap();
        let news = Arc::new(ScriptedNews::new(Vec::new()));
        let feed = assembler(provider(), news.clone());

        let build = feed.build_feed(&mut f.doc, "u1").await;
        let sections = &build.response.sections;

        assert_eq!(sections[0].sport.name, "Basketball");
        assert_eq!(sections[0].counts, FeedCounts::default());
        assert_eq!(sections[1].sport.name, "Soccer");
        assert_eq!(sections[1].counts.teams, 2);
        assert_eq!(build.response.total, 2);

        // Empty news search falls back to fixture updates
        assert_eq!(sections[1].news[0].title, "Match update: Match 0");
        assert!(sections[0].news.is_empty());
        assert!(news.queries().contains(&"Soccer (Arsenal OR Chelsea)".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_news_yields_to_soft_deadline() {
        let mut f = fixture();
        select_sports(&mut f.doc, "u1", &[f.sports[0].clone()]).unwrap();
        let news = Arc::new(ScriptedNews::new(headlines(3)));
        news.set_delay(Duration::from_secs(5));
        let feed = assembler(provider(), news);

        let started = tokio::time::Instant::now();
        let build = feed.build_feed_at(&mut f.doc, "u1", Utc::now()).await;

        assert!(started.elapsed() < Duration::from_secs(2));
        let section = &build.response.sections[0];
        assert_eq!(section.highlights.len(), 3);
        assert!(section.news.iter().all(|n| n.title.starts_with("Match update")));
        assert_eq!(build.refreshed, 1);
        assert_eq!(f.doc.feed_cache_by_sport[&f.sports[0]].len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_both_fetches_timing_out_serves_previous_and_keeps_cache() {
        let mut f = fixture();
        select_sports(&mut f.doc, "u1", &[f.sports[0].clone()]).unwrap();
        let provider = provider();
        let news = Arc::new(ScriptedNews::new(headlines(2)));
        let feed = assembler(provider.clone(), news.clone());
        let t = Utc::now();
        feed.build_feed_at(&mut f.doc, "u1", t).await;
        let key = sport_interests(&f.doc, "u1", &f.sports[0]).preference_key(&f.sports[0]);
        let stored = cached_entry(&f.doc, &f.sports[0], &key).cloned().unwrap();

        provider.set_delay(Duration::from_secs(5));
        news.set_delay(Duration::from_secs(5));
        let later = t + ChronoDuration::minutes(10);
        let build = feed.build_feed_at(&mut f.doc, "u1", later).await;

        let section = &build.response.sections[0];
        assert_eq!(section.source, SectionSource::Live);
        assert_eq!(section.highlights, stored.highlights);
        assert_eq!(section.news, stored.news);
        assert_eq!(cached_entry(&f.doc, &f.sports[0], &key).unwrap().fetched_at, t);
    }

    #[tokio::test]
    async fn test_unfollowed_team_key_is_no_longer_addressable() {
        let mut f = fixture();
        set_sport_interests(&mut f.doc, "u1", &f.sports[0], &[f.arsenal.clone()], &[], &[]).unwrap();
        let feed = assembler(provider(), Arc::new(ScriptedNews::new(headlines(1))));
        let t = Utc::now();

        feed.build_feed_at(&mut f.doc, "u1", t).await;
        let old_key = sport_interests(&f.doc, "u1", &f.sports[0]).preference_key(&f.sports[0]);
        assert!(cached_entry(&f.doc, &f.sports[0], &old_key).is_some());

        set_sport_interests(&mut f.doc, "u1", &f.sports[0], &[], &[], &[]).unwrap();
        assert!(cached_entry(&f.doc, &f.sports[0], &old_key).is_none());

        let build = feed.build_feed_at(&mut f.doc, "u1", t + ChronoDuration::seconds(10)).await;
        let new_key = sport_interests(&f.doc, "u1", &f.sports[0]).preference_key(&f.sports[0]);
        assert_ne!(new_key, old_key);
        assert_eq!(build.response.sections[0].source, SectionSource::Live);
        assert!(cached_entry(&f.doc, &f.sports[0], &old_key).is_none());
    }

    #[test]
    fn test_news_query() {
        assert_eq!(news_query("Soccer", &[]), "Soccer");
        assert_eq!(news_query("Soccer", &["Arsenal".to_string()]), "Soccer (Arsenal)");
    }
}
