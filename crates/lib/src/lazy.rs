//! # Lazy Cover Fetcher
//!
//! The UI-facing entry points. `LazyCoverFetcher` is an ordinary service value:
//! construct one, share it behind an `Arc` or by cloning, and hand out
//! `CoverCard`s that fetch their cover the first time they become visible.

use crate::{
    resolver::CoverResolver,
    types::{FetchResult, ImageResolution, MediaItem, MediaType},
};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Resolves covers for individual items on demand.
#[derive(Clone)]
pub struct LazyCoverFetcher {
    resolver: Arc<CoverResolver>,
}

impl LazyCoverFetcher {
    pub fn new(resolver: Arc<CoverResolver>) -> Self {
        Self { resolver }
    }

    /// Fetches the cover for one item.
    ///
    /// A known `existing_url` is returned as-is without any I/O. Otherwise the item
    /// goes through the regular cache-then-search resolution.
    pub async fn fetch_image(
        &self,
        id: i64,
        title: &str,
        media_type: MediaType,
        existing_url: Option<&str>,
    ) -> FetchResult {
        if let Some(url) = existing_url.filter(|url| !url.is_empty()) {
            return ImageResolution::cached(id, url.to_string());
        }

        let item = MediaItem::new(id, title, media_type);
        self.resolver
            .resolve_batch(std::slice::from_ref(&item))
            .await
            .into_iter()
            .find(|resolution| resolution.id == id)
            .unwrap_or_else(|| ImageResolution::none(id))
    }

    /// Re-fetches the cover from the external source and overwrites the cache entry.
    pub async fn refresh_image(&self, id: i64, title: &str, media_type: MediaType) -> FetchResult {
        self.resolver
            .refresh(&MediaItem::new(id, title, media_type))
            .await
    }

    /// Creates the per-item handle for one rendered card.
    pub fn card(&self, item: MediaItem, existing_url: Option<String>) -> CoverCard {
        CoverCard {
            fetcher: self.clone(),
            item,
            existing_url,
            triggered: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            current: Mutex::new(None),
        }
    }
}

/// One card's view of its cover.
///
/// The first visibility signal triggers a fetch; every later one is ignored.
/// A refresh supersedes any fetch still in flight: only the newest request may
/// update the shown cover.
pub struct CoverCard {
    fetcher: LazyCoverFetcher,
    item: MediaItem,
    existing_url: Option<String>,
    triggered: AtomicBool,
    /// Bumped by every refresh; a result stamped with an older value is dropped.
    generation: AtomicU64,
    current: Mutex<Option<FetchResult>>,
}

impl CoverCard {
    /// The latest known cover result, if any fetch has completed.
    pub fn current(&self) -> Option<FetchResult> {
        self.current.lock().ok().and_then(|guard| guard.clone())
    }

    /// Feeds a visibility change into the card.
    ///
    /// Returns the fetched result on the signal that triggered the fetch, and the
    /// current state (possibly `None` while a fetch is still in flight) otherwise.
    pub async fn on_visibility(&self, visible: bool) -> Option<FetchResult> {
        if !visible || self.triggered.swap(true, Ordering::SeqCst) {
            return self.current();
        }

        debug!("Card for '{}' became visible; fetching cover.", self.item.title);
        let generation = self.generation.load(Ordering::SeqCst);
        let result = self
            .fetcher
            .fetch_image(
                self.item.id,
                &self.item.title,
                self.item.media_type,
                self.existing_url.as_deref(),
            )
            .await;

        if self.store_if_current(generation, &result, |_| true) {
            Some(result)
        } else {
            debug!("Visibility fetch for '{}' was superseded by a refresh.", self.item.title);
            self.current()
        }
    }

    /// Always re-queries the external source. A failed refresh keeps the image
    /// the card already shows.
    pub async fn refresh(&self) -> FetchResult {
        self.triggered.store(true, Ordering::SeqCst);
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let result = self
            .fetcher
            .refresh_image(self.item.id, &self.item.title, self.item.media_type)
            .await;

        self.store_if_current(generation, &result, |current| {
            result.image_url.is_some() || current.is_none()
        });
        result
    }

    /// Stores `result` when no newer refresh has started since `generation` was
    /// taken and `accept` agrees. Returns whether the result was stored.
    fn store_if_current(
        &self,
        generation: u64,
        result: &FetchResult,
        accept: impl FnOnce(&Option<FetchResult>) -> bool,
    ) -> bool {
        let Ok(mut guard) = self.current.lock() else {
            return false;
        };
        if self.generation.load(Ordering::SeqCst) != generation || !accept(&*guard) {
            return false;
        }
        *guard = Some(result.clone());
        true
    }
}
