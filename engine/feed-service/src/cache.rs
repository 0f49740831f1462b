//! Feed cache over the record store's `feedCacheBySport` map

use chrono::{DateTime, Utc};
use persistence::{CatalogDocument, FeedCacheEntry};
use tracing::debug;

/// Fresh while younger than `ttl`
pub fn is_fresh(entry: &FeedCacheEntry, now: DateTime<Utc>, ttl: chrono::Duration) -> bool {
    now.signed_duration_since(entry.fetched_at) < ttl
}

pub fn cached_entry<'a>(doc: &'a CatalogDocument, sport_id: &str, key: &str) -> Option<&'a FeedCacheEntry> {
    doc.feed_cache_by_sport.get(sport_id)?.get(key)
}

/// Replace the entry under `key`, then keep only the `max_variants` most
/// recently fetched keys for the sport
pub fn store_entry(doc: &mut CatalogDocument, sport_id: &str, key: &str, entry: FeedCacheEntry, max_variants: usize) {
    let variants = doc.feed_cache_by_sport.entry(sport_id.to_string()).or_default();
    variants.insert(key.to_string(), entry);

    if variants.len() > max_variants {
        let mut by_age: Vec<(DateTime<Utc>, String)> =
            variants.iter().map(|(k, e)| (e.fetched_at, k.clone())).collect();
        by_age.sort_by(|a, b| b.cmp(a));
        for (_, stale) in by_age.into_iter().skip(max_variants) {
            variants.remove(&stale);
        }
        debug!(sport_id, kept = variants.len(), "pruned feed cache variants");
    }
}

/// Drop the entry under `key`; returns whether one existed
pub fn invalidate(doc: &mut CatalogDocument, sport_id: &str, key: &str) -> bool {
    let Some(variants) = doc.feed_cache_by_sport.get_mut(sport_id) else { return false };
    let removed = variants.remove(key).is_some();
    if variants.is_empty() {
        doc.feed_cache_by_sport.remove(sport_id);
    }
    removed
}
