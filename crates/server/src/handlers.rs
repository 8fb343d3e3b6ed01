use super::{
    errors::AppError,
    state::AppState,
    types::{
        BatchSearchRequest, BatchSearchResponse, BatchSearchResult, CachedCoverData,
        SaveImagesRequest, SaveImagesResponse,
    },
};
use axum::{extract::rejection::JsonRejection, extract::State, Json};
use covershelf::types::CoverRecord;
use tracing::{info, warn};

// --- Route Handlers ---

pub async fn root() -> &'static str {
    "covershelf server is running."
}

pub async fn health_check() -> &'static str {
    "OK"
}

/// Looks up cached covers for a batch of items in one round trip.
///
/// Every requested id gets a result entry, in request order; `data` is only
/// present for ids with a cached cover.
pub async fn batch_search_handler(
    State(app_state): State<AppState>,
    payload: Result<Json<BatchSearchRequest>, JsonRejection>,
) -> Result<Json<BatchSearchResponse>, AppError> {
    let Json(request) = payload?;
    let ids: Vec<i64> = request.items.iter().map(|item| item.id).collect();

    let mut found = app_state.store.find_many(&ids).await?;
    let results: Vec<BatchSearchResult> = ids
        .iter()
        .map(|id| {
            let data = found.remove(id).map(|cover| CachedCoverData {
                cover_image: cover.cover_image,
                title: cover.title,
                media_type: cover.media_type,
                source: cover.source,
                updated_at: cover.updated_at,
            });
            BatchSearchResult {
                id: *id,
                found: data.is_some(),
                data,
            }
        })
        .collect();

    let hits = results.iter().filter(|result| result.found).count();
    info!("Batch search: {hits} of {} items cached.", results.len());

    Ok(Json(BatchSearchResponse {
        success: true,
        results,
    }))
}

/// Stores newly discovered covers. Entries without an image URL are ignored.
pub async fn save_images_handler(
    State(app_state): State<AppState>,
    payload: Result<Json<SaveImagesRequest>, JsonRejection>,
) -> Result<Json<SaveImagesResponse>, AppError> {
    let Json(request) = payload?;
    let received = request.items.len();

    let records: Vec<CoverRecord> = request
        .items
        .into_iter()
        .filter(|record| !record.image_url.trim().is_empty())
        .collect();
    if records.len() < received {
        warn!(
            "Ignoring {} save entries without an image URL.",
            received - records.len()
        );
    }

    let saved = app_state.store.upsert_many(&records).await?;
    info!("Saved {saved} covers.");

    Ok(Json(SaveImagesResponse {
        success: true,
        saved,
    }))
}
