//! # Cache Backend Client
//!
//! Talks to the cover cache backend over HTTP. Lookups and saves are both batched
//! into a single request per call.

use crate::{
    errors::CoverError,
    providers::CoverCache,
    types::{CoverRecord, MediaItem},
};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

pub const BATCH_SEARCH_PATH: &str = "/api/media/batch-search";
pub const SAVE_IMAGES_PATH: &str = "/api/media/save-images";

/// Lookups give up after this long and count as "nothing cached".
pub const LOOKUP_TIMEOUT: Duration = Duration::from_secs(30);

// --- Wire structures ---

#[derive(Serialize)]
struct BatchSearchRequest<'a> {
    items: &'a [MediaItem],
}

#[derive(Deserialize, Debug)]
struct BatchSearchResponse {
    success: bool,
    #[serde(default)]
    results: Vec<BatchSearchResult>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize, Debug)]
struct BatchSearchResult {
    id: i64,
    found: bool,
    data: Option<CachedCover>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct CachedCover {
    cover_image: Option<String>,
}

#[derive(Serialize)]
struct SaveImagesRequest<'a> {
    items: &'a [CoverRecord],
}

#[derive(Deserialize, Debug)]
struct SaveImagesResponse {
    success: bool,
    #[serde(default)]
    saved: Option<usize>,
    #[serde(default)]
    error: Option<String>,
}

// --- Client implementation ---

/// A `CoverCache` backed by the cache backend's HTTP API.
#[derive(Clone, Debug)]
pub struct HttpCoverCache {
    client: ReqwestClient,
    base_url: String,
    lookup_timeout: Duration,
}

impl HttpCoverCache {
    /// Creates a new `HttpCoverCache` for the backend at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, CoverError> {
        let client = ReqwestClient::builder()
            .build()
            .map_err(CoverError::ReqwestClientBuild)?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            lookup_timeout: LOOKUP_TIMEOUT,
        })
    }

    /// Overrides the lookup timeout.
    pub fn lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }
}

#[async_trait]
impl CoverCache for HttpCoverCache {
    async fn lookup_many(&self, items: &[MediaItem]) -> Result<HashMap<i64, String>, CoverError> {
        if items.is_empty() {
            return Ok(HashMap::new());
        }

        let url = format!("{}{}", self.base_url, BATCH_SEARCH_PATH);
        let response = self
            .client
            .post(&url)
            .timeout(self.lookup_timeout)
            .json(&BatchSearchRequest { items })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(CoverError::UnexpectedStatus { status, body });
        }

        let body: BatchSearchResponse = response.json().await?;
        if !body.success {
            return Err(CoverError::CacheBackend(
                body.error
                    .unwrap_or_else(|| "batch search reported failure".to_string()),
            ));
        }

        let found: HashMap<i64, String> = body
            .results
            .into_iter()
            .filter(|result| result.found)
            .filter_map(|result| {
                let cover = result.data?.cover_image.filter(|url| !url.is_empty())?;
                Some((result.id, cover))
            })
            .collect();

        debug!("Cache lookup: {} of {} items found.", found.len(), items.len());
        Ok(found)
    }

    async fn save_many(&self, records: &[CoverRecord]) -> Result<usize, CoverError> {
        if records.is_empty() {
            return Ok(0);
        }

        let url = format!("{}{}", self.base_url, SAVE_IMAGES_PATH);
        let response = self
            .client
            .post(&url)
            .json(&SaveImagesRequest { items: records })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(CoverError::UnexpectedStatus { status, body });
        }

        let body: SaveImagesResponse = response.json().await?;
        if !body.success {
            return Err(CoverError::CacheBackend(
                body.error
                    .unwrap_or_else(|| "save reported failure".to_string()),
            ));
        }

        Ok(body.saved.unwrap_or(records.len()))
    }
}
