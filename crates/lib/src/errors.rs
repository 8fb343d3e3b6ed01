use thiserror::Error;

/// Custom error types for the cover pipeline.
///
/// Providers return these to the orchestrator, which logs them and degrades the
/// affected item to "no image". None of them is meant to reach a UI.
#[derive(Error, Debug)]
pub enum CoverError {
    #[error("Failed to build Reqwest client: {0}")]
    ReqwestClientBuild(reqwest::Error),
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Unexpected HTTP status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },
    #[error("Search API kept throttling after {attempts} attempts")]
    Throttled { attempts: u32 },
    #[error("Cache backend rejected the request: {0}")]
    CacheBackend(String),
    #[error("Catalog source failed: {0}")]
    Catalog(String),
}
