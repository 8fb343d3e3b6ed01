//! # Cover Preloading
//!
//! A one-shot driver that walks the whole catalog and fills the cover cache. It
//! goes straight to the external search API for every item, since its purpose is
//! to populate the cache in the first place, and saves one batch at a time with a
//! pause between batches on top of the search client's own pacing.

use crate::{
    catalog::CatalogSource,
    config::deserialize_millis,
    errors::CoverError,
    providers::{CoverCache, CoverSearch},
    types::{CoverRecord, MediaItem},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Batching settings for a preload run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PreloadOptions {
    pub batch_size: usize,
    /// Pause between two batches, in addition to the per-request pacing.
    #[serde(deserialize_with = "deserialize_millis")]
    pub batch_delay: Duration,
}

impl Default for PreloadOptions {
    fn default() -> Self {
        Self {
            batch_size: 50,
            batch_delay: Duration::from_millis(5000),
        }
    }
}

/// Running totals of a preload run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PreloadReport {
    /// Items read from the catalog.
    pub total: usize,
    /// Batches processed, including a partially processed one on cancellation.
    pub batches: usize,
    /// Covers found and stored in the cache.
    pub saved: usize,
    /// Items without a usable cover, or whose save failed.
    pub failed: usize,
    /// Items whose type cannot be searched.
    pub skipped: usize,
    /// Whether the run stopped early on request.
    pub cancelled: bool,
}

/// Walks the catalog and writes every cover it can find to the cache.
pub struct Preloader {
    catalog: Arc<dyn CatalogSource>,
    search: Arc<dyn CoverSearch>,
    cache: Arc<dyn CoverCache>,
    options: PreloadOptions,
}

impl Preloader {
    pub fn new(
        catalog: Arc<dyn CatalogSource>,
        search: Arc<dyn CoverSearch>,
        cache: Arc<dyn CoverCache>,
        options: PreloadOptions,
    ) -> Self {
        Self {
            catalog,
            search,
            cache,
            options,
        }
    }

    /// Runs the preload to completion, or until `stop` turns `true`.
    ///
    /// Only a catalog failure aborts the run; every per-item and per-batch failure
    /// is counted in the report instead.
    pub async fn run(&self, stop: Option<watch::Receiver<bool>>) -> Result<PreloadReport, CoverError> {
        let mut stop = stop;
        let items = self.catalog.fetch_all().await?;
        let batch_size = self.options.batch_size.max(1);
        let batch_count = items.len().div_ceil(batch_size);

        let mut report = PreloadReport {
            total: items.len(),
            ..Default::default()
        };
        info!("Preloading covers for {} items in {batch_count} batches.", items.len());

        for (index, batch) in items.chunks(batch_size).enumerate() {
            info!("Processing batch {}/{batch_count} ({} items).", index + 1, batch.len());
            report.batches += 1;

            let discovered = self.process_batch(batch, &mut report, stop.as_ref()).await;
            self.save_batch(discovered, &mut report).await;

            info!(
                "Totals after batch {}: {} saved, {} failed, {} skipped.",
                index + 1,
                report.saved,
                report.failed,
                report.skipped
            );

            if is_stopped(stop.as_ref()) {
                report.cancelled = true;
                break;
            }

            if index + 1 < batch_count && self.pause(stop.as_mut()).await {
                report.cancelled = true;
                break;
            }
        }

        if report.cancelled {
            warn!("Preload cancelled after {} batches.", report.batches);
        }
        info!(
            "Preload finished: {} saved, {} failed, {} skipped out of {}.",
            report.saved, report.failed, report.skipped, report.total
        );
        Ok(report)
    }

    async fn process_batch(
        &self,
        batch: &[MediaItem],
        report: &mut PreloadReport,
        stop: Option<&watch::Receiver<bool>>,
    ) -> Vec<CoverRecord> {
        let mut discovered = Vec::new();

        for item in batch {
            if is_stopped(stop) {
                break;
            }

            let Some(search_type) = item.media_type.search_type() else {
                debug!("Skipping '{}' ({}): no search category.", item.title, item.media_type);
                report.skipped += 1;
                continue;
            };

            match self.search.search_cover(&item.title, search_type).await {
                Ok(Some(url)) => {
                    debug!("Found cover for '{}'.", item.title);
                    discovered.push(CoverRecord::external(item, url));
                }
                Ok(None) => {
                    debug!("No cover found for '{}'.", item.title);
                    report.failed += 1;
                }
                Err(e) => {
                    warn!("Cover search failed for '{}' (id {}): {e}", item.title, item.id);
                    report.failed += 1;
                }
            }
        }

        discovered
    }

    async fn save_batch(&self, discovered: Vec<CoverRecord>, report: &mut PreloadReport) {
        if discovered.is_empty() {
            return;
        }
        match self.cache.save_many(&discovered).await {
            Ok(_) => report.saved += discovered.len(),
            Err(e) => {
                error!("Failed to save {} covers: {e}", discovered.len());
                report.failed += discovered.len();
            }
        }
    }

    /// Sleeps between batches. Returns `true` if a stop was requested meanwhile.
    async fn pause(&self, stop: Option<&mut watch::Receiver<bool>>) -> bool {
        let Some(stop) = stop else {
            tokio::time::sleep(self.options.batch_delay).await;
            return false;
        };

        let sleep = tokio::time::sleep(self.options.batch_delay);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                _ = &mut sleep => return *stop.borrow(),
                changed = stop.changed() => {
                    if changed.is_err() {
                        // Sender gone; nobody can ask us to stop anymore.
                        sleep.as_mut().await;
                        return false;
                    }
                    if *stop.borrow() {
                        return true;
                    }
                }
            }
        }
    }
}

fn is_stopped(stop: Option<&watch::Receiver<bool>>) -> bool {
    stop.is_some_and(|rx| *rx.borrow())
}
