//! # Jikan Search Client
//!
//! A rate-limited client for the Jikan search API. Every request is preceded by a
//! fixed pause, and `429 Too Many Requests` answers are retried after a longer one,
//! up to a bounded number of attempts.

use crate::{
    config::deserialize_millis, errors::CoverError, providers::CoverSearch, types::SearchType,
};
use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

pub const DEFAULT_JIKAN_BASE_URL: &str = "https://api.jikan.moe/v4";

// --- Rate limit settings ---

/// Pacing applied to every outbound search request.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimit {
    /// Pause before every request, retries included.
    #[serde(deserialize_with = "deserialize_millis")]
    pub request_delay: Duration,
    /// Additional pause after a `429` before the request is retried.
    #[serde(deserialize_with = "deserialize_millis")]
    pub throttle_delay: Duration,
    /// How many times a throttled request is retried before giving up.
    pub max_throttle_retries: u32,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            request_delay: Duration::from_millis(1000),
            throttle_delay: Duration::from_millis(5000),
            max_throttle_retries: 5,
        }
    }
}

impl RateLimit {
    /// No pauses at all. Meant for tests against local mock servers.
    pub fn none() -> Self {
        Self {
            request_delay: Duration::ZERO,
            throttle_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}

// --- Jikan response structures ---

#[derive(Deserialize, Debug)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<SearchHit>,
}

#[derive(Deserialize, Debug)]
struct SearchHit {
    images: Option<Images>,
}

#[derive(Deserialize, Debug)]
struct Images {
    jpg: Option<JpgImages>,
}

#[derive(Deserialize, Debug)]
struct JpgImages {
    large_image_url: Option<String>,
    image_url: Option<String>,
}

impl SearchResponse {
    /// The large image of the first hit, falling back to its default image.
    fn into_cover_url(self) -> Option<String> {
        let jpg = self.data.into_iter().next()?.images?.jpg?;
        jpg.large_image_url
            .filter(|url| !url.is_empty())
            .or(jpg.image_url.filter(|url| !url.is_empty()))
    }
}

// --- Client implementation ---

/// A cover search client for the Jikan API.
///
/// Cloning shares the request gate, so all clones together stay within a single
/// request stream.
#[derive(Clone, Debug)]
pub struct JikanClient {
    client: ReqwestClient,
    base_url: String,
    rate_limit: RateLimit,
    gate: Arc<Mutex<()>>,
}

impl JikanClient {
    /// Creates a new `JikanClient` against `base_url`.
    pub fn new(base_url: impl Into<String>, rate_limit: RateLimit) -> Result<Self, CoverError> {
        Self::with_timeout(base_url, rate_limit, Duration::from_secs(30))
    }

    /// Creates a new `JikanClient` with a per-request timeout.
    pub fn with_timeout(
        base_url: impl Into<String>,
        rate_limit: RateLimit,
        timeout: Duration,
    ) -> Result<Self, CoverError> {
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(CoverError::ReqwestClientBuild)?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            rate_limit,
            gate: Arc::new(Mutex::new(())),
        })
    }
}

#[async_trait]
impl CoverSearch for JikanClient {
    async fn search_cover(
        &self,
        title: &str,
        search_type: SearchType,
    ) -> Result<Option<String>, CoverError> {
        // Held across pauses and retries so concurrent callers queue up behind us.
        let _permit = self.gate.lock().await;
        let url = format!("{}/{}", self.base_url, search_type.as_path());
        let mut attempts = 0u32;

        loop {
            tokio::time::sleep(self.rate_limit.request_delay).await;
            attempts += 1;

            let response = self
                .client
                .get(&url)
                .query(&[("q", title), ("limit", "1")])
                .send()
                .await?;

            let status = response.status();
            if status == StatusCode::TOO_MANY_REQUESTS {
                if attempts > self.rate_limit.max_throttle_retries {
                    warn!("Search for '{title}' still throttled after {attempts} attempts.");
                    return Err(CoverError::Throttled { attempts });
                }
                warn!(
                    "Search API throttled '{title}' (attempt {attempts}); retrying in {:?}.",
                    self.rate_limit.throttle_delay
                );
                tokio::time::sleep(self.rate_limit.throttle_delay).await;
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(CoverError::UnexpectedStatus {
                    status: status.as_u16(),
                    body,
                });
            }

            let search_response: SearchResponse = response.json().await?;
            let cover = search_response.into_cover_url();
            debug!("Search for '{title}' ({}) -> {cover:?}", search_type.as_path());
            return Ok(cover);
        }
    }
}
