use crate::EndpointArgs;
use anyhow::{bail, Result};
use clap::Parser;
use covershelf::catalog::{SupabaseCatalog, DEFAULT_CATALOG_TABLE};
use covershelf::config::PipelineSettings;
use covershelf::providers::{cache_api::HttpCoverCache, jikan::JikanClient};
use covershelf::{PreloadOptions, Preloader};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Parser, Debug)]
pub struct PreloadArgs {
    /// Supabase project URL holding the catalog
    #[arg(long, env = "SUPABASE_URL")]
    pub supabase_url: String,
    /// Supabase API key
    #[arg(long, env = "SUPABASE_KEY", hide_env_values = true)]
    pub supabase_key: String,
    /// Catalog table name
    #[arg(long, env = "SUPABASE_TABLE", default_value = DEFAULT_CATALOG_TABLE)]
    pub table: String,
    /// Items per batch, overriding the settings file
    #[arg(long)]
    pub batch_size: Option<usize>,
    /// Pause between batches in milliseconds, overriding the settings file
    #[arg(long)]
    pub batch_delay_ms: Option<u64>,
}

impl PreloadArgs {
    /// Command-line flags win over the configured batching.
    pub fn preload_options(&self, configured: &PreloadOptions) -> PreloadOptions {
        PreloadOptions {
            batch_size: self.batch_size.unwrap_or(configured.batch_size),
            batch_delay: self
                .batch_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(configured.batch_delay),
        }
    }
}

pub async fn handle_preload(
    endpoints: &EndpointArgs,
    settings: &PipelineSettings,
    args: &PreloadArgs,
) -> Result<()> {
    info!(
        "Starting preload from table '{}' into cache at {}.",
        args.table, endpoints.api_url
    );

    // 1. Wire up the services.
    let catalog = SupabaseCatalog::new(&args.supabase_url, &args.supabase_key, &args.table)?;
    let search = JikanClient::new(&endpoints.jikan_url, settings.rate_limit.clone())?;
    let cache = HttpCoverCache::new(&endpoints.api_url)?;
    let preloader = Preloader::new(
        Arc::new(catalog),
        Arc::new(search),
        Arc::new(cache),
        args.preload_options(&settings.preload),
    );

    // 2. Ctrl-C asks the run to stop between items.
    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received; stopping after the current item.");
            let _ = stop_tx.send(true);
        }
    });

    // 3. Run and report.
    let report = preloader.run(Some(stop_rx)).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if report.cancelled {
        bail!(
            "Preload cancelled after {} of {} items.",
            report.saved + report.failed + report.skipped,
            report.total
        );
    }
    Ok(())
}
