pub mod cache_api;
pub mod jikan;

use crate::{
    errors::CoverError,
    types::{CoverRecord, MediaItem, SearchType},
};
use async_trait::async_trait;
use std::collections::HashMap;

/// A trait for looking up a cover image by title on an external search API.
///
/// Implementations are expected to pace their own requests; callers issue
/// searches one at a time and never fan out.
#[async_trait]
pub trait CoverSearch: Send + Sync {
    /// Returns the best cover URL of the top search hit, or `None` when the
    /// search yields nothing usable.
    async fn search_cover(
        &self,
        title: &str,
        search_type: SearchType,
    ) -> Result<Option<String>, CoverError>;
}

/// A trait for the keyed cover cache.
#[async_trait]
pub trait CoverCache: Send + Sync {
    /// Looks up all given items in a single request and returns the covers that
    /// were found, keyed by item id. Missing ids are simply not cached.
    async fn lookup_many(&self, items: &[MediaItem]) -> Result<HashMap<i64, String>, CoverError>;

    /// Upserts the given covers in a single request and returns how many were stored.
    async fn save_many(&self, records: &[CoverRecord]) -> Result<usize, CoverError>;
}
