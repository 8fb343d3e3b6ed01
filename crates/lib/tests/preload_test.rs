//! # Preload Tests
//!
//! Runs the catalog-wide preload against in-memory mocks: batching, direct
//! searches without cache lookups, per-batch saves, totals and cancellation.

use anyhow::Result;
use covershelf::errors::CoverError;
use covershelf::types::{MediaItem, MediaType};
use covershelf::{PreloadOptions, PreloadReport, Preloader};
use covershelf_test_utils::{MockCatalog, MockCoverCache, MockCoverSearch};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

fn catalog_of(count: i64) -> Vec<MediaItem> {
    (1..=count)
        .map(|id| MediaItem::new(id, format!("Title {id}"), MediaType::Manga))
        .collect()
}

fn options(batch_size: usize, batch_delay: Duration) -> PreloadOptions {
    PreloadOptions {
        batch_size,
        batch_delay,
    }
}

fn preloader(
    items: Vec<MediaItem>,
    search: &MockCoverSearch,
    cache: &MockCoverCache,
    options: PreloadOptions,
) -> Preloader {
    Preloader::new(
        Arc::new(MockCatalog::new(items)),
        Arc::new(search.clone()),
        Arc::new(cache.clone()),
        options,
    )
}

#[tokio::test]
async fn test_preload_saves_once_per_batch_without_cache_lookups() -> Result<()> {
    // --- Arrange ---
    let search = MockCoverSearch::new();
    for id in 1..=5 {
        if id != 3 {
            search.add_cover(&format!("Title {id}"), &format!("http://x/{id}.jpg"));
        }
    }
    let cache = MockCoverCache::new();
    cache.insert(1, "http://cache/already.jpg");

    // --- Act ---
    let report = preloader(catalog_of(5), &search, &cache, options(2, Duration::ZERO))
        .run(None)
        .await?;

    // --- Assert ---
    assert_eq!(
        report,
        PreloadReport {
            total: 5,
            batches: 3,
            saved: 4,
            failed: 1,
            skipped: 0,
            cancelled: false,
        }
    );
    assert_eq!(search.call_count(), 5, "Every item is searched directly");
    assert!(cache.get_lookups().is_empty(), "Preload never reads the cache");
    let saved_ids: Vec<Vec<i64>> = cache
        .get_saves()
        .iter()
        .map(|batch| batch.iter().map(|r| r.id).collect())
        .collect();
    assert_eq!(saved_ids, vec![vec![1, 2], vec![4], vec![5]]);
    assert_eq!(cache.get(1).as_deref(), Some("http://x/1.jpg"));
    Ok(())
}

#[tokio::test]
async fn test_unmapped_items_are_skipped() -> Result<()> {
    let search = MockCoverSearch::new();
    search.add_cover("Frieren", "http://x/frieren.jpg");
    let cache = MockCoverCache::new();
    let items = vec![
        MediaItem::new(1, "Frieren", MediaType::Anime),
        MediaItem::new(2, "Dune", MediaType::Movie),
        MediaItem::new(3, "Mystery", MediaType::Unknown),
    ];

    let report = preloader(items, &search, &cache, options(50, Duration::ZERO))
        .run(None)
        .await?;

    assert_eq!(report.saved, 1);
    assert_eq!(report.skipped, 2);
    assert_eq!(report.failed, 0);
    assert_eq!(search.call_count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_failed_batch_save_counts_as_failed() -> Result<()> {
    let search = MockCoverSearch::new();
    search.add_cover("Title 1", "http://x/1.jpg");
    search.add_cover("Title 2", "http://x/2.jpg");
    search.fail_for("Title 3");
    let cache = MockCoverCache::new();
    cache.set_fail_saves(true);

    let report = preloader(catalog_of(3), &search, &cache, options(50, Duration::ZERO))
        .run(None)
        .await?;

    assert_eq!(report.saved, 0);
    assert_eq!(report.failed, 3);
    assert_eq!(cache.get_saves().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_catalog_failure_aborts_the_run() -> Result<()> {
    let search = MockCoverSearch::new();
    let cache = MockCoverCache::new();
    let preloader = Preloader::new(
        Arc::new(MockCatalog::failing()),
        Arc::new(search.clone()),
        Arc::new(cache.clone()),
        PreloadOptions::default(),
    );

    let result = preloader.run(None).await;

    assert!(matches!(result, Err(CoverError::Catalog(_))));
    assert_eq!(search.call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_empty_catalog_finishes_immediately() -> Result<()> {
    let search = MockCoverSearch::new();
    let cache = MockCoverCache::new();

    let report = preloader(Vec::new(), &search, &cache, PreloadOptions::default())
        .run(None)
        .await?;

    assert_eq!(report, PreloadReport::default());
    assert!(cache.get_saves().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_stop_signal_interrupts_batch_pause() -> Result<()> {
    // --- Arrange ---
    let search = MockCoverSearch::new();
    for id in 1..=4 {
        search.add_cover(&format!("Title {id}"), &format!("http://x/{id}.jpg"));
    }
    let cache = MockCoverCache::new();
    let (stop_tx, stop_rx) = watch::channel(false);
    let preloader = preloader(
        catalog_of(4),
        &search,
        &cache,
        options(2, Duration::from_secs(30)),
    );

    // --- Act ---
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        let _ = stop_tx.send(true);
    });
    let report = tokio::time::timeout(Duration::from_secs(5), preloader.run(Some(stop_rx)))
        .await
        .expect("the stop signal should cut the 30s pause short")?;

    // --- Assert ---
    assert!(report.cancelled);
    assert_eq!(report.batches, 1);
    assert_eq!(report.saved, 2);
    assert_eq!(search.call_count(), 2);
    Ok(())
}

#[tokio::test]
async fn test_already_stopped_run_searches_nothing() -> Result<()> {
    let search = MockCoverSearch::new();
    let cache = MockCoverCache::new();
    let (_stop_tx, stop_rx) = watch::channel(true);

    let report = preloader(catalog_of(3), &search, &cache, options(2, Duration::ZERO))
        .run(Some(stop_rx))
        .await?;

    assert!(report.cancelled);
    assert_eq!(report.batches, 1);
    assert_eq!(search.call_count(), 0);
    assert!(cache.get_saves().is_empty());
    Ok(())
}
