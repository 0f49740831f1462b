//! Typed helpers over the provider's named endpoints

use crate::client::SportsDataProvider;
use crate::error::Result;
use crate::models::*;

pub const ALL_SPORTS: &str = "all_sports";
pub const ALL_LEAGUES: &str = "all_leagues";
pub const SEARCH_ALL_TEAMS: &str = "search_all_teams";
pub const LOOKUP_ALL_PLAYERS: &str = "lookup_all_players";
pub const EVENTS_NEXT_LEAGUE: &str = "eventsnextleague";
pub const EVENTS_PAST_LEAGUE: &str = "eventspastleague";

pub async fn all_sports<P: SportsDataProvider + ?Sized>(provider: &P) -> Result<Vec<ProviderSport>> {
    let envelope = provider.get(ALL_SPORTS, &[]).await?;
    Ok(rows(&envelope, "sports"))
}

pub async fn all_leagues<P: SportsDataProvider + ?Sized>(provider: &P) -> Result<Vec<ProviderLeague>> {
    let envelope = provider.get(ALL_LEAGUES, &[]).await?;
    Ok(rows(&envelope, "leagues"))
}

pub async fn teams_by_league<P: SportsDataProvider + ?Sized>(
    provider: &P,
    league_name: &str,
) -> Result<Vec<ProviderTeam>> {
    let envelope = provider.get(SEARCH_ALL_TEAMS, &[("l", league_name)]).await?;
    Ok(rows(&envelope, "teams"))
}

pub async fn teams_by_country<P: SportsDataProvider + ?Sized>(
    provider: &P,
    sport: &str,
    country: &str,
) -> Result<Vec<ProviderTeam>> {
    let envelope = provider.get(SEARCH_ALL_TEAMS, &[("s", sport), ("c", country)]).await?;
    Ok(rows(&envelope, "teams"))
}

pub async fn players_by_team<P: SportsDataProvider + ?Sized>(
    provider: &P,
    team_external_id: &str,
) -> Result<Vec<ProviderPlayer>> {
    let envelope = provider.get(LOOKUP_ALL_PLAYERS, &[("id", team_external_id)]).await?;
    Ok(rows(&envelope, "player"))
}

pub async fn next_league_events<P: SportsDataProvider + ?Sized>(
    provider: &P,
    league_external_id: &str,
) -> Result<Vec<ProviderEvent>> {
    let envelope = provider.get(EVENTS_NEXT_LEAGUE, &[("id", league_external_id)]).await?;
    Ok(rows(&envelope, "events"))
}

pub async fn past_league_events<P: SportsDataProvider + ?Sized>(
    provider: &P,
    league_external_id: &str,
) -> Result<Vec<ProviderEvent>> {
    let envelope = provider.get(EVENTS_PAST_LEAGUE, &[("id", league_external_id)]).await?;
    Ok(rows(&envelope, "events"))
}
