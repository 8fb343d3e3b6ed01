//! # covershelf
//!
//! Resolves cover images for a personal media catalog. Covers are looked up in a
//! keyed cache first, then searched on a rate-limited external API, and whatever
//! is newly found gets written back to the cache.
//!
//! - [`resolver::CoverResolver`] resolves whole batches with progress reporting.
//! - [`lazy::LazyCoverFetcher`] serves single UI cards on demand.
//! - [`preload::Preloader`] fills the cache for an entire catalog in one run.
//!
//! Image availability is best-effort: every failure below the catalog level
//! degrades to "no image" instead of an error.

pub mod catalog;
pub mod config;
pub mod errors;
pub mod lazy;
pub mod preload;
pub mod providers;
pub mod resolver;
pub mod types;

pub use errors::CoverError;
pub use lazy::{CoverCard, LazyCoverFetcher};
pub use preload::{PreloadOptions, PreloadReport, Preloader};
pub use resolver::CoverResolver;
pub use types::{
    index_by_id, CoverRecord, CoverSource, FetchResult, ImageResolution, MediaItem, MediaType,
    Progress, SearchType,
};
