use crate::config::ProviderConfig;
use crate::error::{ProviderError, Result};
use reqwest::header::{HeaderValue, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, warn};

/// Raw access to the sports data provider
///
/// `get` returns the parsed JSON envelope. An empty or unparseable success
/// body comes back as an empty object, so "no data" and "explicit success"
/// look the same to callers.
#[async_trait::async_trait]
pub trait SportsDataProvider: Send + Sync {
    async fn get(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Value>;
}

/// TheSportsDB HTTP client with timeout and 429 backoff
pub struct SportsDbClient {
    config: ProviderConfig,
    client: Client,
}

impl SportsDbClient {
    /// Create a new client; every request carries the configured timeout
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self { config, client })
    }

    /// Create a client around a preconfigured reqwest client
    pub fn with_http_client(config: ProviderConfig, client: Client) -> Self {
        Self { config, client }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }
}

#[async_trait::async_trait]
impl SportsDataProvider for SportsDbClient {
    async fn get(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Value> {
        let url = self.config.endpoint_url(endpoint);
        let max_attempts = self.config.max_attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!(endpoint, attempt, "provider request");

            let response = self
                .client
                .get(&url)
                .query(params)
                .send()
                .await
                .map_err(|e| ProviderError::from_reqwest(endpoint, self.config.timeout(), e))?;

            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                if attempt >= max_attempts {
                    warn!(endpoint, attempt, "provider rate limit not lifted, giving up");
                    return Err(ProviderError::RateLimitExhausted {
                        endpoint: endpoint.to_string(),
                        attempts: attempt,
                    });
                }

                let delay = backoff_delay(attempt, response.headers().get(RETRY_AFTER));
                warn!(endpoint, attempt, delay_ms = delay.as_millis() as u64, "provider rate limited, backing off");
                drop(response);
                tokio::time::sleep(delay).await;
                continue;
            }

            if !status.is_success() {
                return Err(ProviderError::Status {
                    endpoint: endpoint.to_string(),
                    status: status.as_u16(),
                });
            }

            let body = response
                .bytes()
                .await
                .map_err(|e| ProviderError::from_reqwest(endpoint, self.config.timeout(), e))?;

            return Ok(parse_body(endpoint, &body));
        }
    }
}

/// Delay before the next attempt after a 429: `retry-after` seconds when
/// present and numeric, otherwise `attempt` seconds.
pub fn backoff_delay(attempt: u32, retry_after: Option<&HeaderValue>) -> Duration {
    retry_after
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(u64::from(attempt)))
}

fn parse_body(endpoint: &str, body: &[u8]) -> Value {
    if body.iter().all(|b| b.is_ascii_whitespace()) {
        return Value::Object(Map::new());
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(value @ Value::Object(_)) => value,
        Ok(_) | Err(_) => {
            debug!(endpoint, "provider body was not a JSON object, treating as empty");
            Value::Object(Map::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Instant;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve canned HTTP responses in order; the last one repeats
    async fn serve(responses: Vec<String>) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else { return };
                let n = counter.fetch_add(1, Ordering::SeqCst);
                let response = responses[n.min(responses.len() - 1)].clone();
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                if response.is_empty() {
                    // Hang without answering
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    continue;
                }
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (format!("http://{addr}"), hits)
    }

    fn http(status: &str, headers: &[&str], body: &str) -> String {
        let mut out = format!("HTTP/1.1 {status}\r\ncontent-length: {}\r\nconnection: close\r\n", body.len());
        for header in headers {
            out.push_str(header);
            out.push_str("\r\n");
        }
        out.push_str("\r\n");
        out.push_str(body);
        out
    }

    fn client(base_url: String, max_retries: u32, timeout: Duration) -> SportsDbClient {
        let config = ProviderConfig { base_url, max_retries, ..Default::default() };
        let http = Client::builder().no_proxy().timeout(timeout).build().unwrap();
        SportsDbClient::with_http_client(config, http)
    }

    #[test]
    fn test_backoff_prefers_retry_after() {
        let header = HeaderValue::from_static("2");
        assert_eq!(backoff_delay(1, Some(&header)), Duration::from_secs(2));
        assert_eq!(backoff_delay(3, None), Duration::from_secs(3));

        let garbage = HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT");
        assert_eq!(backoff_delay(2, Some(&garbage)), Duration::from_secs(2));
    }

    #[test]
    fn test_parse_body_degrades_to_empty_object() {
        assert_eq!(parse_body("x", b""), Value::Object(Map::new()));
        assert_eq!(parse_body("x", b"<html>oops</html>"), Value::Object(Map::new()));
        assert_eq!(parse_body("x", b"[1,2]"), Value::Object(Map::new()));
        assert_eq!(parse_body("x", br#"{"teams":null}"#)["teams"], Value::Null);
    }

    #[tokio::test]
    async fn test_success_returns_envelope() {
        let (url, hits) = serve(vec![http("200 OK", &[], r#"{"leagues":[{"idLeague":"4328"}]}"#)]).await;
        let client = client(url, 2, Duration::from_secs(5));

        let value = client.get("all_leagues", &[]).await.unwrap();
        assert_eq!(value["leagues"][0]["idLeague"], "4328");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_success_body_is_empty_object() {
        let (url, _) = serve(vec![http("200 OK", &[], "")]).await;
        let client = client(url, 2, Duration::from_secs(5));

        let value = client.get("all_sports", &[]).await.unwrap();
        assert_eq!(value, Value::Object(Map::new()));
    }

    #[tokio::test]
    async fn test_429_honors_retry_after_then_succeeds() {
        let (url, hits) = serve(vec![
            http("429 Too Many Requests", &["retry-after: 1"], ""),
            http("200 OK", &[], r#"{"sports":[]}"#),
        ])
        .await;
        let client = client(url, 2, Duration::from_secs(5));

        let started = Instant::now();
        let value = client.get("all_sports", &[]).await.unwrap();

        assert!(started.elapsed() >= Duration::from_millis(1000));
        assert!(value["sports"].is_array());
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_429_exhaustion_fails_after_max_retries_plus_one() {
        let (url, hits) = serve(vec![http("429 Too Many Requests", &["retry-after: 0"], "")]).await;
        let client = client(url, 2, Duration::from_secs(5));

        let err = client.get("all_sports", &[]).await.unwrap_err();
        assert!(matches!(err, ProviderError::RateLimitExhausted { attempts: 3, .. }));
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_other_status_fails_without_retry() {
        let (url, hits) = serve(vec![http("503 Service Unavailable", &[], "")]).await;
        let client = client(url, 2, Duration::from_secs(5));

        let err = client.get("all_leagues", &[]).await.unwrap_err();
        assert!(matches!(err, ProviderError::Status { status: 503, .. }));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_timeout_is_a_provider_error() {
        let (url, _) = serve(vec![String::new()]).await;
        let client = client(url, 2, Duration::from_millis(200));

        let err = client.get("all_leagues", &[]).await.unwrap_err();
        assert_eq!(err.kind(), "timeout");
    }
}
