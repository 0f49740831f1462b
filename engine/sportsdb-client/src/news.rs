//! RSS news search client
//!
//! Items are pulled out of the feed by tag-scoped text extraction rather than a
//! full XML parse; only `title`, `link`, `pubDate` and `source` are read.

use crate::config::NewsConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// One news headline from the feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub published_at: Option<String>,
    pub source: String,
}

/// News search; never fails, an unavailable feed yields an empty list
#[async_trait::async_trait]
pub trait NewsProvider: Send + Sync {
    async fn news_feed(&self, query: &str, limit: usize) -> Vec<FeedItem>;
}

/// RSS search client (Google News compatible)
pub struct RssNewsClient {
    config: NewsConfig,
    client: Client,
}

impl RssNewsClient {
    pub fn new(config: NewsConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self { config, client })
    }

    pub fn with_http_client(config: NewsConfig, client: Client) -> Self {
        Self { config, client }
    }
}

#[async_trait::async_trait]
impl NewsProvider for RssNewsClient {
    async fn news_feed(&self, query: &str, limit: usize) -> Vec<FeedItem> {
        if limit == 0 || query.trim().is_empty() {
            return Vec::new();
        }

        let edition = self.config.edition();
        let params = [
            ("q", query),
            ("hl", self.config.language.as_str()),
            ("gl", self.config.region.as_str()),
            ("ceid", edition.as_str()),
        ];

        let response = match self.client.get(&self.config.base_url).query(&params).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(query, error = %e, "news feed request failed");
                return Vec::new();
            }
        };

        if !response.status().is_success() {
            warn!(query, status = response.status().as_u16(), "news feed returned non-success status");
            return Vec::new();
        }

        match response.text().await {
            Ok(xml) => {
                let items = parse_rss(&xml, limit, &self.config.default_source);
                debug!(query, count = items.len(), "news feed parsed");
                items
            }
            Err(e) => {
                warn!(query, error = %e, "news feed body unreadable");
                Vec::new()
            }
        }
    }
}

/// Extract up to `limit` items from an RSS document
pub fn parse_rss(xml: &str, limit: usize, default_source: &str) -> Vec<FeedItem> {
    let mut items = Vec::new();

    for block in tag_blocks(xml, "item") {
        if items.len() >= limit {
            break;
        }

        let Some(title) = tag_text(block, "title") else { continue };
        items.push(FeedItem {
            title,
            link: tag_text(block, "link").unwrap_or_default(),
            published_at: tag_text(block, "pubDate"),
            source: tag_text(block, "source").unwrap_or_else(|| default_source.to_string()),
        });
    }

    items
}

/// Byte offset just past the opening `<tag ...>` at or after `from`, with the
/// offset of the `<`. Skips longer tag names sharing the prefix.
fn find_open(doc: &str, tag: &str, from: usize) -> Option<(usize, usize, bool)> {
    let open = format!("<{tag}");
    let mut search = from;

    while let Some(rel) = doc[search..].find(&open) {
        let start = search + rel;
        let after = start + open.len();
        match doc[after..].chars().next() {
            Some(c) if c == '>' || c == '/' || c.is_whitespace() => {
                let gt = doc[after..].find('>')? + after;
                let self_closing = doc[after..gt].ends_with('/');
                return Some((start, gt + 1, self_closing));
            }
            _ => search = after,
        }
    }

    None
}

/// Inner text of every `<tag>...</tag>` block
fn tag_blocks<'a>(doc: &'a str, tag: &str) -> Vec<&'a str> {
    let close = format!("</{tag}>");
    let mut blocks = Vec::new();
    let mut cursor = 0;

    while let Some((_, content_start, self_closing)) = find_open(doc, tag, cursor) {
        if self_closing {
            cursor = content_start;
            continue;
        }
        let Some(rel_end) = doc[content_start..].find(&close) else { break };
        let end = content_start + rel_end;
        blocks.push(&doc[content_start..end]);
        cursor = end + close.len();
    }

    blocks
}

/// Decoded text of the first `<tag>` in `block`; blank counts as absent
fn tag_text(block: &str, tag: &str) -> Option<String> {
    let raw = tag_blocks(block, tag).into_iter().next()?;
    let text = decode_text(raw);
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Unwrap CDATA sections verbatim and unescape entities outside them
fn decode_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(start) = rest.find("<![CDATA[") {
        out.push_str(&unescape_entities(&rest[..start]));
        let inner = &rest[start + "<![CDATA[".len()..];
        match inner.find("]]>") {
            Some(end) => {
                out.push_str(&inner[..end]);
                rest = &inner[end + "]]>".len()..];
            }
            None => {
                out.push_str(inner);
                rest = "";
            }
        }
    }
    out.push_str(&unescape_entities(rest));

    out.trim().to_string()
}

fn unescape_entities(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
