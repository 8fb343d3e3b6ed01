//! # API Payloads
//!
//! Request and response bodies of the cover cache endpoints.

use covershelf::types::{CoverRecord, MediaItem};
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Debug)]
pub struct BatchSearchRequest {
    pub items: Vec<MediaItem>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct BatchSearchResponse {
    pub success: bool,
    pub results: Vec<BatchSearchResult>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct BatchSearchResult {
    pub id: i64,
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<CachedCoverData>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CachedCoverData {
    pub cover_image: String,
    pub title: String,
    #[serde(rename = "type")]
    pub media_type: String,
    pub source: String,
    pub updated_at: String,
}

#[derive(Deserialize, Debug)]
pub struct SaveImagesRequest {
    pub items: Vec<CoverRecord>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct SaveImagesResponse {
    pub success: bool,
    pub saved: usize,
}
