//! # Application State
//!
//! The shared application state (`AppState`) and the logic for building it at
//! startup.

use crate::{config::AppConfig, store::CoverStore};
use std::sync::Arc;
use tracing::info;

/// The shared application state, accessible from all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<CoverStore>,
}

/// Opens the cover store named by the configuration.
pub async fn build_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let store = CoverStore::new(&config.db_url).await?;
    info!(db_path = %config.db_url, "Initialized cover store.");

    Ok(AppState {
        store: Arc::new(store),
    })
}
