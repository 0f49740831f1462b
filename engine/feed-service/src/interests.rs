//! Interest selection and follow management
//!
//! Every change to a user's selection within a sport drops the feed cache
//! entry under the preference key the user had before the change.

use crate::cache;
use crate::error::{FeedError, Result};
use crate::preference::{sport_interests, SportInterests};
use chrono::Utc;
use persistence::{CatalogDocument, Follow, FollowKind};
use tracing::{debug, info};

/// Followed sports in the user's order: explicitly ordered sports first,
/// then the rest in the order they were followed
pub fn followed_sport_ids(doc: &CatalogDocument, user_id: &str) -> Vec<String> {
    let followed: Vec<&str> = doc
        .follows
        .iter()
        .filter(|f| f.user_id == user_id && f.kind == FollowKind::Sport)
        .filter(|f| doc.sport(&f.entity_id).is_some())
        .map(|f| f.entity_id.as_str())
        .collect();

    let explicit = doc.user_sport_order.get(user_id).into_iter().flatten().map(String::as_str);
    let mut ordered: Vec<String> = Vec::with_capacity(followed.len());
    for id in explicit.chain(followed.iter().copied()) {
        if followed.contains(&id) && !ordered.iter().any(|o| o == id) {
            ordered.push(id.to_string());
        }
    }
    ordered
}

fn follow(doc: &mut CatalogDocument, user_id: &str, kind: FollowKind, entity_id: &str) {
    let exists = doc.follows.iter().any(|f| f.user_id == user_id && f.kind == kind && f.entity_id == entity_id);
    if !exists {
        doc.follows.push(Follow {
            user_id: user_id.to_string(),
            kind,
            entity_id: entity_id.to_string(),
            created_at: Utc::now(),
        });
    }
}

/// Drop the sport follow, its entity follows, its cache entry and its place
/// in the user's order
pub fn unfollow_sport(doc: &mut CatalogDocument, user_id: &str, sport_id: &str) -> bool {
    let old_key = sport_interests(doc, user_id, sport_id).preference_key(sport_id);
    let before = doc.follows.len();

    let follows = std::mem::take(&mut doc.follows);
    doc.follows = follows
        .into_iter()
        .filter(|f| !(f.user_id == user_id && doc.follow_sport_id(f) == Some(sport_id)))
        .collect();

    if let Some(order) = doc.user_sport_order.get_mut(user_id) {
        order.retain(|id| id != sport_id);
    }
    cache::invalidate(doc, sport_id, &old_key);

    let removed = doc.follows.len() != before;
    if removed {
        debug!(user_id, sport_id, "unfollowed sport");
    }
    removed
}

/// Replace the user's followed sports with `sport_ids`
pub fn select_sports(doc: &mut CatalogDocument, user_id: &str, sport_ids: &[String]) -> Result<Vec<String>> {
    let mut selected: Vec<&str> = Vec::new();
    for id in sport_ids.iter().map(|id| id.trim()).filter(|id| !id.is_empty()) {
        if !selected.contains(&id) {
            selected.push(id);
        }
    }
    if selected.is_empty() {
        return Err(FeedError::NoInterestSelected);
    }
    if let Some(missing) = selected.iter().find(|id| doc.sport(id).is_none()) {
        return Err(FeedError::SportNotFound(missing.to_string()));
    }

    let dropped: Vec<String> = followed_sport_ids(doc, user_id)
        .into_iter()
        .filter(|id| !selected.contains(&id.as_str()))
        .collect();
    for sport_id in &dropped {
        unfollow_sport(doc, user_id, sport_id);
    }
    for sport_id in &selected {
        follow(doc, user_id, FollowKind::Sport, sport_id);
    }

    info!(user_id, selected = selected.len(), dropped = dropped.len(), "sport selection updated");
    Ok(followed_sport_ids(doc, user_id))
}

/// Replace the user's team/player/league follows within one sport
pub fn set_sport_interests(
    doc: &mut CatalogDocument,
    user_id: &str,
    sport_id: &str,
    team_ids: &[String],
    player_ids: &[String],
    league_ids: &[String],
) -> Result<SportInterests> {
    if doc.sport(sport_id).is_none() {
        return Err(FeedError::SportNotFound(sport_id.to_string()));
    }

    let scope_error = |kind: &'static str, id: &str| FeedError::InvalidInterestScope {
        kind,
        id: id.to_string(),
        sport_id: sport_id.to_string(),
    };
    for id in team_ids {
        if doc.team(id).map(|t| t.sport_id.as_str()) != Some(sport_id) {
            return Err(scope_error("team", id));
        }
    }
    for id in player_ids {
        if doc.player(id).map(|p| p.sport_id.as_str()) != Some(sport_id) {
            return Err(scope_error("player", id));
        }
    }
    for id in league_ids {
        if doc.league(id).map(|l| l.sport_id.as_str()) != Some(sport_id) {
            return Err(scope_error("league", id));
        }
    }

    let old_key = sport_interests(doc, user_id, sport_id).preference_key(sport_id);

    let follows = std::mem::take(&mut doc.follows);
    doc.follows = follows
        .into_iter()
        .filter(|f| f.user_id != user_id || f.kind == FollowKind::Sport || doc.follow_sport_id(f) != Some(sport_id))
        .collect();

    follow(doc, user_id, FollowKind::Sport, sport_id);
    for id in team_ids {
        follow(doc, user_id, FollowKind::Team, id);
    }
    for id in player_ids {
        follow(doc, user_id, FollowKind::Player, id);
    }
    for id in league_ids {
        follow(doc, user_id, FollowKind::League, id);
    }

    let interests = sport_interests(doc, user_id, sport_id);
    let new_key = interests.preference_key(sport_id);
    if new_key != old_key && cache::invalidate(doc, sport_id, &old_key) {
        debug!(user_id, sport_id, "dropped feed cache entry for previous selection");
    }

    Ok(interests)
}

/// Set the user's explicit sport order; unknown sports are rejected
pub fn set_sport_order(doc: &mut CatalogDocument, user_id: &str, order: &[String]) -> Result<Vec<String>> {
    let mut cleaned: Vec<String> = Vec::with_capacity(order.len());
    for id in order {
        if doc.sport(id).is_none() {
            return Err(FeedError::SportNotFound(id.clone()));
        }
        if !cleaned.contains(id) {
            cleaned.push(id.clone());
        }
    }
    doc.user_sport_order.insert(user_id.to_string(), cleaned.clone());
    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{cached_entry, store_entry};
    use catalog_registry::{CatalogRegistry, PlayerRow, ScopedRow, SportRow};
    use persistence::FeedCacheEntry;

    struct Fixture {
        doc: CatalogDocument,
        soccer: String,
        hockey: String,
        arsenal: String,
        chelsea: String,
        bruins: String,
        saka: String,
        epl: String,
    }

    fn fixture() -> Fixture {
        let mut doc = CatalogDocument::default();
        let mut r = CatalogRegistry::new(&mut doc);
        let soccer = r.upsert_sport(&SportRow::from_provider(Some("Soccer"), None)).unwrap().id;
        let hockey = r.upsert_sport(&SportRow::from_provider(Some("Ice Hockey"), None)).unwrap().id;
        let arsenal = r.upsert_team(&ScopedRow::from_provider(&soccer, Some("Arsenal"), None)).unwrap().id;
        let chelsea = r.upsert_team(&ScopedRow::from_provider(&soccer, Some("Chelsea"), None)).unwrap().id;
        let bruins = r.upsert_team(&ScopedRow::from_provider(&hockey, Some("Boston Bruins"), None)).unwrap().id;
        let saka = r
            .upsert_player(&PlayerRow::from_provider(&soccer, Some(arsenal.as_str()), Some("Bukayo Saka"), None))
            .unwrap()
            .id;
        let epl = r.upsert_league(&ScopedRow::from_provider(&soccer, Some("Premier League"), None)).unwrap().id;
        Fixture { doc, soccer, hockey, arsenal, chelsea, bruins, saka, epl }
    }

    #[test]
    fn test_select_sports_validates_and_replaces() {
        let mut f = fixture();

        assert_eq!(select_sports(&mut f.doc, "u1", &[]), Err(FeedError::NoInterestSelected));
        assert_eq!(select_sports(&mut f.doc, "u1", &["  ".to_string()]), Err(FeedError::NoInterestSelected));
        assert_eq!(
            select_sports(&mut f.doc, "u1", &[f.soccer.clone(), "ghost".to_string()]),
            Err(FeedError::SportNotFound("ghost".to_string()))
        );
        assert!(f.doc.follows.is_empty());

        let selected = select_sports(&mut f.doc, "u1", &[f.soccer.clone(), f.hockey.clone(), f.soccer.clone()]).unwrap();
        assert_eq!(selected, vec![f.soccer.clone(), f.hockey.clone()]);

        set_sport_interests(&mut f.doc, "u1", &f.soccer, &[f.arsenal.clone()], &[], &[]).unwrap();
        let selected = select_sports(&mut f.doc, "u1", &[f.hockey.clone()]).unwrap();
        assert_eq!(selected, vec![f.hockey.clone()]);
        // Unfollowing soccer took the Arsenal follow with it
        assert!(f.doc.follows.iter().all(|x| x.entity_id != f.arsenal));
    }

    #[test]
    fn test_interests_reject_cross_sport_ids() {
        let mut f = fixture();
        select_sports(&mut f.doc, "u1", &[f.soccer.clone()]).unwrap();
        let follows = f.doc.follows.clone();

        let err = set_sport_interests(&mut f.doc, "u1", &f.soccer, &[f.arsenal.clone(), f.bruins.clone()], &[], &[])
            .unwrap_err();
        assert!(matches!(err, FeedError::InvalidInterestScope { kind: "team", .. }));
        assert_eq!(f.doc.follows, follows);

        let err = set_sport_interests(&mut f.doc, "u1", &f.soccer, &[], &[], &[f.arsenal.clone()]).unwrap_err();
        assert!(matches!(err, FeedError::InvalidInterestScope { kind: "league", .. }));
        assert!(matches!(
            set_sport_interests(&mut f.doc, "u1", "ghost", &[], &[], &[]),
            Err(FeedError::SportNotFound(_))
        ));
    }

    #[test]
    fn test_interests_replace_and_scope() {
        let mut f = fixture();
        set_sport_interests(&mut f.doc, "u1", &f.hockey, &[f.bruins.clone()], &[], &[]).unwrap();
        set_sport_interests(&mut f.doc, "u1", &f.soccer, &[f.arsenal.clone()], &[f.saka.clone()], &[f.epl.clone()])
            .unwrap();
        let interests =
            set_sport_interests(&mut f.doc, "u1", &f.soccer, &[f.chelsea.clone(), f.chelsea.clone()], &[], &[]).unwrap();

        assert_eq!(interests.team_ids, vec![f.chelsea.clone()]);
        assert!(interests.player_ids.is_empty());
        assert_eq!(sport_interests(&f.doc, "u1", &f.hockey).team_ids, vec![f.bruins.clone()]);
        assert_eq!(followed_sport_ids(&f.doc, "u1"), vec![f.hockey.clone(), f.soccer.clone()]);
    }

    #[test]
    fn test_changed_selection_drops_old_cache_entry() {
        let mut f = fixture();
        let before = set_sport_interests(&mut f.doc, "u1", &f.soccer, &[f.arsenal.clone()], &[], &[]).unwrap();
        let old_key = before.preference_key(&f.soccer);
        let entry = FeedCacheEntry { fetched_at: Utc::now(), highlights: Vec::new(), news: Vec::new() };
        store_entry(&mut f.doc, &f.soccer, &old_key, entry.clone(), 8);

        // Same selection: entry survives
        set_sport_interests(&mut f.doc, "u1", &f.soccer, &[f.arsenal.clone()], &[], &[]).unwrap();
        assert!(cached_entry(&f.doc, &f.soccer, &old_key).is_some());

        set_sport_interests(&mut f.doc, "u1", &f.soccer, &[], &[], &[]).unwrap();
        assert!(cached_entry(&f.doc, &f.soccer, &old_key).is_none());
    }

    #[test]
    fn test_sport_order() {
        let mut f = fixture();
        select_sports(&mut f.doc, "u1", &[f.soccer.clone(), f.hockey.clone()]).unwrap();
        assert_eq!(followed_sport_ids(&f.doc, "u1"), vec![f.soccer.clone(), f.hockey.clone()]);

        set_sport_order(&mut f.doc, "u1", &[f.hockey.clone()]).unwrap();
        assert_eq!(followed_sport_ids(&f.doc, "u1"), vec![f.hockey.clone(), f.soccer.clone()]);

        tokio_test::assert_err!(set_sport_order(&mut f.doc, "u1", &["ghost".to_string()]));
        assert_eq!(f.doc.user_sport_order["u1"], vec![f.hockey.clone()]);

        assert!(unfollow_sport(&mut f.doc, "u1", &f.hockey));
        assert_eq!(followed_sport_ids(&f.doc, "u1"), vec![f.soccer.clone()]);
        assert!(f.doc.user_sport_order["u1"].is_empty());
    }
}
