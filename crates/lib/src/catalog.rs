//! # Catalog Source
//!
//! The system of record the preload driver walks. The production catalog lives in
//! a Supabase table and is read through its PostgREST interface.

use crate::{errors::CoverError, types::MediaItem};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, RANGE};
use reqwest::Client as ReqwestClient;
use tracing::info;

pub const DEFAULT_CATALOG_TABLE: &str = "media";

/// Rows requested per page; PostgREST caps responses at this size by default.
const PAGE_SIZE: usize = 1000;

/// A trait for listing every item whose cover should be resolved.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<MediaItem>, CoverError>;
}

/// Reads the catalog from a Supabase table.
#[derive(Clone, Debug)]
pub struct SupabaseCatalog {
    client: ReqwestClient,
    base_url: String,
    api_key: String,
    table: String,
}

impl SupabaseCatalog {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        table: impl Into<String>,
    ) -> Result<Self, CoverError> {
        let client = ReqwestClient::builder()
            .build()
            .map_err(CoverError::ReqwestClientBuild)?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            table: table.into(),
        })
    }

    fn headers(&self) -> Result<HeaderMap, CoverError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(&self.api_key)
                .map_err(|e| CoverError::Catalog(format!("Invalid API key: {e}")))?,
        );
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))
                .map_err(|e| CoverError::Catalog(format!("Invalid API key: {e}")))?,
        );
        Ok(headers)
    }
}

#[async_trait]
impl CatalogSource for SupabaseCatalog {
    async fn fetch_all(&self) -> Result<Vec<MediaItem>, CoverError> {
        let url = format!("{}/rest/v1/{}", self.base_url, self.table);
        let headers = self.headers()?;
        let mut items = Vec::new();

        loop {
            let from = items.len();
            let to = from + PAGE_SIZE - 1;
            let response = self
                .client
                .get(&url)
                .headers(headers.clone())
                .header(RANGE, format!("{from}-{to}"))
                .query(&[("select", "id,title,type"), ("order", "id.asc")])
                .send()
                .await?;

            if !response.status().is_success() {
                let status = response.status();
                let err_text = response.text().await.unwrap_or_default();
                return Err(CoverError::Catalog(format!(
                    "Failed to read table '{}' ({status}): {err_text}",
                    self.table
                )));
            }

            let mut page: Vec<MediaItem> = response.json().await?;
            let page_len = page.len();
            items.append(&mut page);

            if page_len < PAGE_SIZE {
                break;
            }
        }

        info!("Fetched {} items from catalog table '{}'.", items.len(), self.table);
        Ok(items)
    }
}
