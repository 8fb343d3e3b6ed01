//! # Cover Resolver
//!
//! Resolves covers for a batch of items by checking the cache first and then
//! searching the external API for every miss, one item at a time. Newly found
//! covers are written back to the cache once the batch is done.

use crate::{
    providers::{CoverCache, CoverSearch},
    types::{CoverRecord, ImageResolution, MediaItem, Progress, SearchType},
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Resolves cover images through the cache and the external search API.
#[derive(Clone)]
pub struct CoverResolver {
    search: Arc<dyn CoverSearch>,
    cache: Arc<dyn CoverCache>,
    detached_write_back: bool,
}

impl CoverResolver {
    /// Creates a new `CoverResolver`.
    pub fn new(search: Arc<dyn CoverSearch>, cache: Arc<dyn CoverCache>) -> Self {
        Self {
            search,
            cache,
            detached_write_back: false,
        }
    }

    /// When enabled, the write-back runs as a spawned task and `resolve_batch`
    /// returns without waiting for it.
    pub fn detached_write_back(mut self, detached: bool) -> Self {
        self.detached_write_back = detached;
        self
    }

    /// Resolves a batch of items without progress reporting.
    pub async fn resolve_batch(&self, items: &[MediaItem]) -> Vec<ImageResolution> {
        self.resolve_batch_with_progress(items, |_| {}).await
    }

    /// Resolves a batch of items, reporting progress after the cache lookup and
    /// after every item of the sequential phase.
    ///
    /// Cache hits come first in the output, followed by the remaining items in
    /// input order. Use [`crate::types::index_by_id`] to address them by id.
    pub async fn resolve_batch_with_progress<F>(
        &self,
        items: &[MediaItem],
        mut on_progress: F,
    ) -> Vec<ImageResolution>
    where
        F: FnMut(Progress) + Send,
    {
        if items.is_empty() {
            return Vec::new();
        }
        let total = items.len();

        // 1. Only searchable items are worth a cache lookup.
        let searchable: Vec<MediaItem> = items
            .iter()
            .filter(|item| item.media_type.search_type().is_some())
            .cloned()
            .collect();

        // 2. One batch lookup for the whole run. A failing cache means "nothing cached".
        let cached = if searchable.is_empty() {
            HashMap::new()
        } else {
            match self.cache.lookup_many(&searchable).await {
                Ok(found) => found,
                Err(e) => {
                    warn!(
                        "Cache lookup failed, treating all {} items as misses: {e}",
                        searchable.len()
                    );
                    HashMap::new()
                }
            }
        };

        let mut resolutions = Vec::with_capacity(total);
        let mut pending = Vec::new();
        for item in items {
            match cached.get(&item.id) {
                Some(url) if item.media_type.search_type().is_some() => {
                    resolutions.push(ImageResolution::cached(item.id, url.clone()))
                }
                _ => pending.push(item),
            }
        }
        let hits = resolutions.len();
        info!("Resolving {total} covers: {hits} cached, {} pending.", pending.len());
        on_progress(Progress::new(hits, total));

        // 3. Strictly sequential; the search client paces each request.
        let mut discovered = Vec::new();
        for (processed, item) in pending.into_iter().enumerate() {
            let resolution = match item.media_type.search_type() {
                Some(search_type) => {
                    let resolution = self.search_external(item, search_type).await;
                    if let Some(url) = &resolution.image_url {
                        discovered.push(CoverRecord::external(item, url.clone()));
                    }
                    resolution
                }
                None => {
                    debug!("No search category for '{}' ({}).", item.title, item.media_type);
                    ImageResolution::none(item.id)
                }
            };
            resolutions.push(resolution);
            on_progress(Progress::new(hits + processed + 1, total));
        }

        // 4. One write-back for everything found during this run.
        if !discovered.is_empty() {
            self.write_back(discovered).await;
        }

        resolutions
    }

    /// Re-resolves one item from the external source, skipping the cache, and
    /// overwrites its cache entry when a cover is found.
    pub async fn refresh(&self, item: &MediaItem) -> ImageResolution {
        let Some(search_type) = item.media_type.search_type() else {
            debug!("Refresh skipped for '{}': no search category.", item.title);
            return ImageResolution::none(item.id);
        };

        let resolution = self.search_external(item, search_type).await;
        if let Some(url) = &resolution.image_url {
            info!("Refreshed cover for '{}' (id {}).", item.title, item.id);
            self.write_back(vec![CoverRecord::external(item, url.clone())])
                .await;
        }
        resolution
    }

    /// Searches the external source for one item, absorbing any failure.
    pub(crate) async fn search_external(
        &self,
        item: &MediaItem,
        search_type: SearchType,
    ) -> ImageResolution {
        match self.search.search_cover(&item.title, search_type).await {
            Ok(Some(url)) => ImageResolution::external(item.id, url),
            Ok(None) => {
                debug!("No cover found for '{}'.", item.title);
                ImageResolution::none(item.id)
            }
            Err(e) => {
                warn!("Cover search failed for '{}' (id {}): {e}", item.title, item.id);
                ImageResolution::none(item.id)
            }
        }
    }

    async fn write_back(&self, records: Vec<CoverRecord>) {
        if self.detached_write_back {
            let cache = Arc::clone(&self.cache);
            tokio::spawn(async move {
                save_and_log(cache.as_ref(), &records).await;
            });
        } else {
            save_and_log(self.cache.as_ref(), &records).await;
        }
    }
}

async fn save_and_log(cache: &dyn CoverCache, records: &[CoverRecord]) {
    match cache.save_many(records).await {
        Ok(saved) => info!("Wrote {saved} new covers back to the cache."),
        Err(e) => error!("Failed to write {} covers back to the cache: {e}", records.len()),
    }
}
