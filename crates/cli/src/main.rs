//! # covershelf: cover pipeline from the command line
//!
//! `preload` fills the cover cache for the whole catalog. `resolve` and `refresh`
//! drive the same entry points a UI would, printing the results as JSON.

mod preload;
mod resolve;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use covershelf::config::PipelineSettings;
use covershelf::providers::jikan::DEFAULT_JIKAN_BASE_URL;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, EnvFilter};

// --- CLI Definition ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    endpoints: EndpointArgs,
    #[command(subcommand)]
    command: Commands,
}

/// Where the cache backend and the search API live.
#[derive(Parser, Debug, Clone)]
pub struct EndpointArgs {
    /// Base URL of the cover cache backend
    #[arg(long, env = "API_URL", global = true, default_value = "http://localhost:9090")]
    pub api_url: String,
    /// Base URL of the Jikan search API
    #[arg(long, env = "JIKAN_API_URL", global = true, default_value = DEFAULT_JIKAN_BASE_URL)]
    pub jikan_url: String,
    /// JSON file with pacing and batching settings
    #[arg(long, env = "COVERSHELF_SETTINGS", global = true)]
    pub settings: Option<PathBuf>,
}

/// Reads the pipeline settings file, or falls back to the stock settings.
fn load_settings(path: Option<&Path>) -> Result<PipelineSettings> {
    let Some(path) = path else {
        return Ok(PipelineSettings::default());
    };
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings file '{}'", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid settings file '{}'", path.display()))
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search a cover for every catalog item and store it in the cache
    Preload(preload::PreloadArgs),
    /// Resolve covers for the given items through the cache and the search API
    Resolve(resolve::ResolveArgs),
    /// Re-query the search API for one item and overwrite its cache entry
    Refresh(resolve::RefreshArgs),
}

// --- Main Application Entry ---

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout stays machine-readable.
    let subscriber = fmt::Subscriber::builder()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    let settings = load_settings(cli.endpoints.settings.as_deref())?;

    match &cli.command {
        Commands::Preload(args) => preload::handle_preload(&cli.endpoints, &settings, args).await,
        Commands::Resolve(args) => resolve::handle_resolve(&cli.endpoints, &settings, args).await,
        Commands::Refresh(args) => resolve::handle_refresh(&cli.endpoints, &settings, args).await,
    }
}
