//! Link-preview fetching and caching.
//!
//! Previews come from a worker endpoint (`POST /api/link-preview` with
//! `{"url": …}`) and are held in an instance-scoped bounded cache keyed by
//! URL. Eviction is insertion-order, not LRU: once the capacity (200) is
//! reached, the oldest-inserted entry goes, regardless of recent access.
//! Non-retryable failures are cached permanently as error-marked previews;
//! retryable ones are not cached at all.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::time::Duration;

use anyhow::Result;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CACHE_CAPACITY: usize = 200;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkPreview {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,
    /// Set when this entry records a permanent fetch failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LinkPreview {
    fn failed(url: &str, message: &str) -> Self {
        LinkPreview {
            url: url.to_string(),
            title: String::new(),
            description: None,
            image: None,
            favicon: None,
            site_name: None,
            error: Some(message.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewErrorKind {
    NotFound,
    Forbidden,
    Timeout,
    ServerError,
    Network,
    InvalidResponse,
}

impl PreviewErrorKind {
    pub fn retryable(&self) -> bool {
        matches!(
            self,
            PreviewErrorKind::Timeout | PreviewErrorKind::ServerError | PreviewErrorKind::Network
        )
    }
}

#[derive(Debug, Clone)]
pub struct PreviewError {
    pub kind: PreviewErrorKind,
    pub message: String,
    pub retryable: bool,
}

impl PreviewError {
    fn new(kind: PreviewErrorKind, message: impl Into<String>) -> Self {
        PreviewError {
            kind,
            message: message.into(),
            retryable: kind.retryable(),
        }
    }
}

impl fmt::Display for PreviewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for PreviewError {}

/// Fixed HTTP status → error kind table.
pub fn classify_status(status: u16) -> PreviewErrorKind {
    match status {
        404 => PreviewErrorKind::NotFound,
        403 => PreviewErrorKind::Forbidden,
        408 | 504 => PreviewErrorKind::Timeout,
        500..=599 => PreviewErrorKind::ServerError,
        _ => PreviewErrorKind::InvalidResponse,
    }
}

/// Insertion-order bounded map. Not LRU: reads do not touch entry order.
pub struct BoundedCache {
    capacity: usize,
    entries: HashMap<String, LinkPreview>,
    order: VecDeque<String>,
}

impl BoundedCache {
    pub fn new(capacity: usize) -> Self {
        BoundedCache {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    pub fn get(&self, url: &str) -> Option<&LinkPreview> {
        self.entries.get(url)
    }

    pub fn insert(&mut self, url: String, preview: LinkPreview) {
        if self.entries.insert(url.clone(), preview).is_some() {
            // Overwrite keeps the original insertion position.
            return;
        }
        self.order.push_back(url);
        while self.entries.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            } else {
                break;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    success: bool,
    data: Option<LinkPreview>,
    error: Option<EnvelopeError>,
}

#[derive(Deserialize)]
struct EnvelopeError {
    message: String,
}

pub struct LinkPreviewClient {
    endpoint: String,
    http: reqwest::blocking::Client,
    cache: Mutex<BoundedCache>,
}

impl LinkPreviewClient {
    pub fn new(endpoint: impl Into<String>, cache_capacity: usize) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .user_agent("postvault")
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(LinkPreviewClient {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            http,
            cache: Mutex::new(BoundedCache::new(cache_capacity)),
        })
    }

    pub fn cache_len(&self) -> usize {
        self.cache.lock().len()
    }

    /// Fetch a preview, consulting the cache first. Cached entries include
    /// permanently failed ones (returned with `error` set, no refetch).
    pub fn fetch(&self, url: &str) -> Result<LinkPreview, PreviewError> {
        if let Some(hit) = self.cache.lock().get(url) {
            return Ok(hit.clone());
        }

        match self.fetch_uncached(url) {
            Ok(preview) => {
                self.cache.lock().insert(url.to_string(), preview.clone());
                Ok(preview)
            }
            Err(err) => {
                if !err.retryable {
                    self.cache
                        .lock()
                        .insert(url.to_string(), LinkPreview::failed(url, &err.message));
                }
                Err(err)
            }
        }
    }

    fn fetch_uncached(&self, url: &str) -> Result<LinkPreview, PreviewError> {
        let endpoint = format!("{}/api/link-preview", self.endpoint);
        let response = self
            .http
            .post(&endpoint)
            .json(&serde_json::json!({ "url": url }))
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    PreviewError::new(PreviewErrorKind::Timeout, e.to_string())
                } else {
                    PreviewError::new(PreviewErrorKind::Network, e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let kind = classify_status(status);
            return Err(PreviewError::new(kind, format!("HTTP {}", status)));
        }

        let envelope: Envelope = response.json().map_err(|e| {
            PreviewError::new(PreviewErrorKind::InvalidResponse, e.to_string())
        })?;

        if let Some(err) = envelope.error {
            return Err(PreviewError::new(PreviewErrorKind::InvalidResponse, err.message));
        }
        match (envelope.success, envelope.data) {
            (true, Some(mut preview)) => {
                if preview.url.is_empty() {
                    preview.url = url.to_string();
                }
                Ok(preview)
            }
            _ => Err(PreviewError::new(
                PreviewErrorKind::InvalidResponse,
                "envelope missing data",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preview(url: &str) -> LinkPreview {
        LinkPreview {
            url: url.to_string(),
            title: format!("title of {}", url),
            description: None,
            image: None,
            favicon: None,
            site_name: None,
            error: None,
        }
    }

    #[test]
    fn status_table_matches_the_contract() {
        assert_eq!(classify_status(404), PreviewErrorKind::NotFound);
        assert_eq!(classify_status(403), PreviewErrorKind::Forbidden);
        assert_eq!(classify_status(408), PreviewErrorKind::Timeout);
        assert_eq!(classify_status(504), PreviewErrorKind::Timeout);
        assert_eq!(classify_status(500), PreviewErrorKind::ServerError);
        assert_eq!(classify_status(503), PreviewErrorKind::ServerError);
        assert_eq!(classify_status(400), PreviewErrorKind::InvalidResponse);

        assert!(!PreviewErrorKind::NotFound.retryable());
        assert!(!PreviewErrorKind::Forbidden.retryable());
        assert!(PreviewErrorKind::Timeout.retryable());
        assert!(PreviewErrorKind::ServerError.retryable());
    }

    #[test]
    fn cache_never_exceeds_capacity() {
        let mut cache = BoundedCache::new(200);
        for i in 0..201 {
            cache.insert(format!("https://example.com/{}", i), preview("x"));
        }
        assert_eq!(cache.len(), 200);
        // The oldest-inserted entry is the one evicted.
        assert!(cache.get("https://example.com/0").is_none());
        assert!(cache.get("https://example.com/1").is_some());
        assert!(cache.get("https://example.com/200").is_some());
    }

    #[test]
    fn eviction_ignores_read_recency() {
        let mut cache = BoundedCache::new(2);
        cache.insert("a".to_string(), preview("a"));
        cache.insert("b".to_string(), preview("b"));
        // Reading "a" must not protect it: insertion-order, not LRU.
        assert!(cache.get("a").is_some());
        cache.insert("c".to_string(), preview("c"));
        assert!(cache.get("a").is_none());
        assert!(cache.get("b").is_some());
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn overwriting_does_not_duplicate_order_entries() {
        let mut cache = BoundedCache::new(2);
        cache.insert("a".to_string(), preview("a"));
        cache.insert("a".to_string(), preview("a2"));
        cache.insert("b".to_string(), preview("b"));
        cache.insert("c".to_string(), preview("c"));
        assert_eq!(cache.len(), 2);
        assert!(cache.get("a").is_none());
    }
}
