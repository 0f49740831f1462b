//! Preference keys
//!
//! A key encodes which teams, players and leagues a user follows within one
//! sport. It discriminates feed cache entries, so two users with the same
//! selection share an entry and changing a selection moves to a new one.

use persistence::{CatalogDocument, FollowKind};
use serde::{Deserialize, Serialize};

/// A user's followed entities within one sport, in follow order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SportInterests {
    pub team_ids: Vec<String>,
    pub player_ids: Vec<String>,
    pub league_ids: Vec<String>,
}

impl SportInterests {
    pub fn preference_key(&self, sport_id: &str) -> String {
        build_feed_preference_key(sport_id, &self.team_ids, &self.player_ids, &self.league_ids)
    }
}

fn canonical(ids: &[String]) -> String {
    let mut ids: Vec<&str> = ids.iter().map(String::as_str).collect();
    ids.sort_unstable();
    ids.dedup();
    ids.join(",")
}

/// `sport|t:..|p:..|l:..` with each id list sorted and de-duplicated
pub fn build_feed_preference_key(
    sport_id: &str,
    team_ids: &[String],
    player_ids: &[String],
    league_ids: &[String],
) -> String {
    format!(
        "{}|t:{}|p:{}|l:{}",
        sport_id,
        canonical(team_ids),
        canonical(player_ids),
        canonical(league_ids)
    )
}

/// Entity follows of `user_id` whose entity belongs to `sport_id`
pub fn sport_interests(doc: &CatalogDocument, user_id: &str, sport_id: &str) -> SportInterests {
    let mut interests = SportInterests::default();

    for follow in doc.follows.iter().filter(|f| f.user_id == user_id) {
        if doc.follow_sport_id(follow) != Some(sport_id) {
            continue;
        }
        let bucket = match follow.kind {
            FollowKind::Team => &mut interests.team_ids,
            FollowKind::Player => &mut interests.player_ids,
            FollowKind::League => &mut interests.league_ids,
            FollowKind::Sport => continue,
        };
        if !bucket.contains(&follow.entity_id) {
            bucket.push(follow.entity_id.clone());
        }
    }

    interests
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_key_ignores_order_and_duplicates() {
        let a = build_feed_preference_key("s1", &ids(&["t2", "t1", "t2"]), &ids(&["p1"]), &[]);
        let b = build_feed_preference_key("s1", &ids(&["t1", "t2"]), &ids(&["p1", "p1"]), &[]);
        assert_eq!(a, b);
        assert_eq!(a, "s1|t:t1,t2|p:p1|l:");
    }

    #[test]
    fn test_key_separates_kinds_and_sports() {
        let as_team = build_feed_preference_key("s1", &ids(&["x"]), &[], &[]);
        let as_player = build_feed_preference_key("s1", &[], &ids(&["x"]), &[]);
        let other_sport = build_feed_preference_key("s2", &ids(&["x"]), &[], &[]);
        assert_ne!(as_team, as_player);
        assert_ne!(as_team, other_sport);
        assert_eq!(build_feed_preference_key("s1", &[], &[], &[]), "s1|t:|p:|l:");
    }
}
