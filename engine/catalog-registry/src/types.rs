use persistence::PROVIDER_SOURCE;
use serde::{Deserialize, Serialize};

/// `(externalSource, externalId)` pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Provenance {
    pub source: String,
    pub id: String,
}

impl Provenance {
    pub fn new(source: impl Into<String>, id: impl Into<String>) -> Self {
        Self { source: source.into(), id: id.into() }
    }

    /// Provider provenance, when the provider supplied a non-blank id
    pub fn provider(id: Option<&str>) -> Option<Self> {
        id.map(str::trim).filter(|id| !id.is_empty()).map(|id| Self::new(PROVIDER_SOURCE, id))
    }
}

/// Raw sport row
#[derive(Debug, Clone, Default)]
pub struct SportRow {
    pub name: Option<String>,
    pub provenance: Option<Provenance>,
}

/// Raw league or team row (both are scoped to a sport)
#[derive(Debug, Clone, Default)]
pub struct ScopedRow {
    pub sport_id: String,
    pub name: Option<String>,
    pub provenance: Option<Provenance>,
}

/// Raw player row
#[derive(Debug, Clone, Default)]
pub struct PlayerRow {
    pub sport_id: String,
    pub team_id: Option<String>,
    pub name: Option<String>,
    pub provenance: Option<Provenance>,
}

/// Result of a single upsert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upserted {
    pub id: String,
    pub created: bool,
}

impl ScopedRow {
    pub fn from_provider(sport_id: &str, name: Option<&str>, external_id: Option<&str>) -> Self {
        Self {
            sport_id: sport_id.to_string(),
            name: name.map(str::to_string),
            provenance: Provenance::provider(external_id),
        }
    }
}

impl PlayerRow {
    pub fn from_provider(
        sport_id: &str,
        team_id: Option<&str>,
        name: Option<&str>,
        external_id: Option<&str>,
    ) -> Self {
        Self {
            sport_id: sport_id.to_string(),
            team_id: team_id.map(str::to_string),
            name: name.map(str::to_string),
            provenance: Provenance::provider(external_id),
        }
    }
}

impl SportRow {
    pub fn from_provider(name: Option<&str>, external_id: Option<&str>) -> Self {
        Self { name: name.map(str::to_string), provenance: Provenance::provider(external_id) }
    }
}
