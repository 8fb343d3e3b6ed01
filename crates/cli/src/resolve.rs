use crate::EndpointArgs;
use anyhow::Result;
use clap::Parser;
use covershelf::config::PipelineSettings;
use covershelf::providers::{cache_api::HttpCoverCache, jikan::JikanClient};
use covershelf::types::{MediaItem, MediaType};
use covershelf::{CoverResolver, LazyCoverFetcher};
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
pub struct ResolveArgs {
    /// An item as `ID:TYPE:TITLE`, e.g. `12:Manhwa:Solo Leveling`. Repeatable.
    #[arg(long = "item", required = true, value_parser = parse_item)]
    pub items: Vec<MediaItem>,
}

#[derive(Parser, Debug)]
pub struct RefreshArgs {
    /// The item as `ID:TYPE:TITLE`
    #[arg(value_parser = parse_item)]
    pub item: MediaItem,
}

fn resolver(endpoints: &EndpointArgs, settings: &PipelineSettings) -> Result<CoverResolver> {
    let search = JikanClient::new(&endpoints.jikan_url, settings.rate_limit.clone())?;
    let cache = HttpCoverCache::new(&endpoints.api_url)?;
    Ok(CoverResolver::new(Arc::new(search), Arc::new(cache)))
}

pub async fn handle_resolve(
    endpoints: &EndpointArgs,
    settings: &PipelineSettings,
    args: &ResolveArgs,
) -> Result<()> {
    let resolver = resolver(endpoints, settings)?;
    let resolutions = resolver
        .resolve_batch_with_progress(&args.items, |progress| {
            info!(
                "Progress: {}/{} ({}%)",
                progress.loaded, progress.total, progress.percentage
            );
        })
        .await;

    println!("{}", serde_json::to_string_pretty(&resolutions)?);
    Ok(())
}

pub async fn handle_refresh(
    endpoints: &EndpointArgs,
    settings: &PipelineSettings,
    args: &RefreshArgs,
) -> Result<()> {
    let fetcher = LazyCoverFetcher::new(Arc::new(resolver(endpoints, settings)?));
    let item = &args.item;
    let result = fetcher
        .refresh_image(item.id, &item.title, item.media_type)
        .await;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Parses `ID:TYPE:TITLE`. The title may itself contain colons.
fn parse_item(raw: &str) -> Result<MediaItem, String> {
    let mut parts = raw.splitn(3, ':');
    let (Some(id), Some(media_type), Some(title)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(format!("expected ID:TYPE:TITLE, got '{raw}'"));
    };

    let id: i64 = id
        .trim()
        .parse()
        .map_err(|e| format!("invalid id '{id}': {e}"))?;
    let media_type: MediaType =
        serde_json::from_value(serde_json::Value::String(media_type.trim().to_string()))
            .map_err(|e| format!("invalid type '{media_type}': {e}"))?;
    let title = title.trim();
    if title.is_empty() {
        return Err("title must not be empty".to_string());
    }

    Ok(MediaItem::new(id, title, media_type))
}
