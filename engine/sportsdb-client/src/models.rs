use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// TheSportsDB sport row (`all_sports`)
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProviderSport {
    #[serde(rename = "idSport", default, deserialize_with = "flexible_id")]
    pub id: Option<String>,

    #[serde(rename = "strSport", default)]
    pub name: Option<String>,
}

/// TheSportsDB league row (`all_leagues`)
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProviderLeague {
    #[serde(rename = "idLeague", default, deserialize_with = "flexible_id")]
    pub id: Option<String>,

    #[serde(rename = "strLeague", default)]
    pub name: Option<String>,

    #[serde(rename = "strSport", default)]
    pub sport: Option<String>,
}

/// TheSportsDB team row (`search_all_teams`)
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProviderTeam {
    #[serde(rename = "idTeam", default, deserialize_with = "flexible_id")]
    pub id: Option<String>,

    #[serde(rename = "strTeam", default)]
    pub name: Option<String>,

    #[serde(rename = "strSport", default)]
    pub sport: Option<String>,

    #[serde(rename = "idLeague", default, deserialize_with = "flexible_id")]
    pub league_id: Option<String>,

    #[serde(rename = "strLeague", default)]
    pub league: Option<String>,

    #[serde(rename = "strCountry", default)]
    pub country: Option<String>,
}

/// TheSportsDB player row (`lookup_all_players`)
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProviderPlayer {
    #[serde(rename = "idPlayer", default, deserialize_with = "flexible_id")]
    pub id: Option<String>,

    #[serde(rename = "strPlayer", default)]
    pub name: Option<String>,

    #[serde(rename = "idTeam", default, deserialize_with = "flexible_id")]
    pub team_id: Option<String>,

    #[serde(rename = "strPosition", default)]
    pub position: Option<String>,
}

/// TheSportsDB event row (`eventsnextleague` / `eventspastleague`)
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProviderEvent {
    #[serde(rename = "idEvent", default, deserialize_with = "flexible_id")]
    pub id: Option<String>,

    #[serde(rename = "strEvent", default)]
    pub name: Option<String>,

    #[serde(rename = "idLeague", default, deserialize_with = "flexible_id")]
    pub league_id: Option<String>,

    #[serde(rename = "strLeague", default)]
    pub league: Option<String>,

    #[serde(rename = "dateEvent", default)]
    pub date: Option<String>,

    #[serde(rename = "strTime", default)]
    pub time: Option<String>,

    #[serde(rename = "strHomeTeam", default)]
    pub home_team: Option<String>,

    #[serde(rename = "strAwayTeam", default)]
    pub away_team: Option<String>,
}

impl ProviderEvent {
    /// Display title, falling back to "Home vs Away"
    pub fn title(&self) -> Option<String> {
        if let Some(name) = self.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            return Some(name.to_string());
        }
        match (self.home_team.as_deref(), self.away_team.as_deref()) {
            (Some(home), Some(away)) => Some(format!("{home} vs {away}")),
            _ => None,
        }
    }
}

/// Rows of the named array field in a provider envelope.
///
/// A missing or null field is an empty list; rows that do not deserialize are
/// dropped individually.
pub fn rows<T: DeserializeOwned>(envelope: &Value, field: &str) -> Vec<T> {
    envelope
        .get(field)
        .and_then(Value::as_array)
        .map(|items| {
            items.iter().filter_map(|item| serde_json::from_value(item.clone()).ok()).collect()
        })
        .unwrap_or_default()
}

/// Provider ids arrive as strings or numbers; blanks mean absent
fn flexible_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
