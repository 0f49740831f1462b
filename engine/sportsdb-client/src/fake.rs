//! Scripted in-memory providers (for testing)

use crate::client::SportsDataProvider;
use crate::error::{ProviderError, Result};
use crate::news::{FeedItem, NewsProvider};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Canonical request key: `endpoint?k=v&k=v` with params sorted
pub fn request_key(endpoint: &str, params: &[(&str, &str)]) -> String {
    let mut params: Vec<_> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
    params.sort();
    if params.is_empty() {
        endpoint.to_string()
    } else {
        format!("{}?{}", endpoint, params.join("&"))
    }
}

/// Sports provider answering from a table of canned envelopes
///
/// Unscripted requests answer with an empty object, like a provider that has
/// nothing for the query.
#[derive(Default)]
pub struct ScriptedProvider {
    responses: Mutex<HashMap<String, Value>>,
    failing: Mutex<HashSet<String>>,
    delay: Mutex<Option<Duration>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `endpoint` + `params` with `envelope`
    pub fn respond(&self, endpoint: &str, params: &[(&str, &str)], envelope: Value) -> &Self {
        self.responses.lock().insert(request_key(endpoint, params), envelope);
        self
    }

    /// Fail `endpoint` + `params` with HTTP 503; an empty `params` fails every
    /// request to the endpoint
    pub fn fail(&self, endpoint: &str, params: &[(&str, &str)]) -> &Self {
        self.failing.lock().insert(request_key(endpoint, params));
        self
    }

    /// Delay every answer by `delay`
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    /// Every request key seen, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// Number of requests made to `endpoint` (any params)
    pub fn call_count(&self, endpoint: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|key| *key == endpoint || key.starts_with(&format!("{endpoint}?")))
            .count()
    }
}

#[async_trait::async_trait]
impl SportsDataProvider for ScriptedProvider {
    async fn get(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Value> {
        let key = request_key(endpoint, params);
        self.calls.lock().push(key.clone());

        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failing = {
            let failing = self.failing.lock();
            failing.contains(&key) || failing.contains(endpoint)
        };
        if failing {
            return Err(ProviderError::Status { endpoint: endpoint.to_string(), status: 503 });
        }

        Ok(self.responses.lock().get(&key).cloned().unwrap_or_else(|| Value::Object(Map::new())))
    }
}

/// News provider returning a fixed list
#[derive(Default)]
pub struct ScriptedNews {
    items: Mutex<Vec<FeedItem>>,
    delay: Mutex<Option<Duration>>,
    calls: AtomicUsize,
    queries: Mutex<Vec<String>>,
}

impl ScriptedNews {
    pub fn new(items: Vec<FeedItem>) -> Self {
        Self { items: Mutex::new(items), ..Default::default() }
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().clone()
    }
}

#[async_trait::async_trait]
impl NewsProvider for ScriptedNews {
    async fn news_feed(&self, query: &str, limit: usize) -> Vec<FeedItem> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().push(query.to_string());

        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.items.lock().iter().take(limit).cloned().collect()
    }
}
