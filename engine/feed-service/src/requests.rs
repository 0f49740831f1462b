//! Requests for sports the catalog does not carry

use crate::error::{FeedError, Result};
use catalog_registry::name_key;
use chrono::Utc;
use persistence::{CatalogDocument, SportRequest};
use tracing::info;
use uuid::Uuid;

/// Record a request; a repeat by the same user (same name key) returns the
/// existing one. Hyphens are significant, as in catalog names.
pub fn request_sport(doc: &mut CatalogDocument, user_id: &str, name: &str) -> Result<SportRequest> {
    let name = name.trim();
    if !name.chars().any(char::is_alphanumeric) {
        return Err(FeedError::EmptySportName);
    }
    let key = name_key(name);

    if let Some(existing) = doc.sport_requests.iter().find(|r| r.user_id == user_id && name_key(&r.name) == key)
    {
        return Ok(existing.clone());
    }

    let request = SportRequest {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        name: name.to_string(),
        created_at: Utc::now(),
    };
    info!(user_id, sport = %request.name, "sport requested");
    doc.sport_requests.push(request.clone());
    Ok(request)
}

/// All requests, newest first
pub fn list_requests(doc: &CatalogDocument) -> Vec<SportRequest> {
    let mut requests = doc.sport_requests.clone();
    requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    requests
}
