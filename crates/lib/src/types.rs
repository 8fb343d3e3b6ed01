//! # Core Data Types
//!
//! The shapes shared by every stage of the cover pipeline: catalog items, the
//! search category derived from them, per-item resolutions and progress reports.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// The kind of media a catalog item tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaType {
    Manga,
    Manhwa,
    Manhua,
    Anime,
    Series,
    Movie,
    #[serde(alias = "K-Drama")]
    KDrama,
    #[serde(alias = "J-Drama")]
    JDrama,
    /// Any type string the catalog holds that this crate does not recognize.
    #[serde(other)]
    Unknown,
}

impl MediaType {
    /// Maps the item type onto the search API category, if it has one.
    ///
    /// Comics of every origin are searched as manga. Live-action types have no
    /// counterpart in the search API and yield `None`.
    pub fn search_type(self) -> Option<SearchType> {
        match self {
            MediaType::Manga | MediaType::Manhwa | MediaType::Manhua => Some(SearchType::Manga),
            MediaType::Anime => Some(SearchType::Anime),
            MediaType::Series
            | MediaType::Movie
            | MediaType::KDrama
            | MediaType::JDrama
            | MediaType::Unknown => None,
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MediaType::Manga => "Manga",
            MediaType::Manhwa => "Manhwa",
            MediaType::Manhua => "Manhua",
            MediaType::Anime => "Anime",
            MediaType::Series => "Series",
            MediaType::Movie => "Movie",
            MediaType::KDrama => "KDrama",
            MediaType::JDrama => "JDrama",
            MediaType::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// The search API endpoint an item is looked up under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchType {
    Anime,
    Manga,
}

impl SearchType {
    /// The path segment of the search endpoint.
    pub fn as_path(self) -> &'static str {
        match self {
            SearchType::Anime => "anime",
            SearchType::Manga => "manga",
        }
    }
}

/// A catalog entry whose cover should be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: i64,
    pub title: String,
    #[serde(rename = "type")]
    pub media_type: MediaType,
}

impl MediaItem {
    pub fn new(id: i64, title: impl Into<String>, media_type: MediaType) -> Self {
        Self {
            id,
            title: title.into(),
            media_type,
        }
    }
}

/// Where a resolved cover came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverSource {
    Cache,
    External,
    None,
}

impl fmt::Display for CoverSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CoverSource::Cache => "cache",
            CoverSource::External => "external",
            CoverSource::None => "none",
        };
        f.write_str(name)
    }
}

/// The outcome of resolving one item's cover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageResolution {
    pub id: i64,
    pub image_url: Option<String>,
    pub source: CoverSource,
}

impl ImageResolution {
    pub fn cached(id: i64, image_url: String) -> Self {
        Self {
            id,
            image_url: Some(image_url),
            source: CoverSource::Cache,
        }
    }

    pub fn external(id: i64, image_url: String) -> Self {
        Self {
            id,
            image_url: Some(image_url),
            source: CoverSource::External,
        }
    }

    pub fn none(id: i64) -> Self {
        Self {
            id,
            image_url: None,
            source: CoverSource::None,
        }
    }
}

/// The result handed to a single UI card.
pub type FetchResult = ImageResolution;

/// A newly discovered cover, written back to the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverRecord {
    pub id: i64,
    pub title: String,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub image_url: String,
    pub source: CoverSource,
}

impl CoverRecord {
    pub fn external(item: &MediaItem, image_url: String) -> Self {
        Self {
            id: item.id,
            title: item.title.clone(),
            media_type: item.media_type,
            image_url,
            source: CoverSource::External,
        }
    }
}

/// Progress of one batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub loaded: usize,
    pub total: usize,
    pub percentage: u8,
}

impl Progress {
    pub fn new(loaded: usize, total: usize) -> Self {
        let percentage = if total == 0 {
            0
        } else {
            ((loaded as f64 / total as f64) * 100.0).round() as u8
        };
        Self {
            loaded,
            total,
            percentage,
        }
    }
}

/// Indexes resolutions by item id, since batch output is not in input order.
pub fn index_by_id(resolutions: &[ImageResolution]) -> HashMap<i64, &ImageResolution> {
    resolutions.iter().map(|r| (r.id, r)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_search_type_mapping() {
        assert_eq!(MediaType::Manga.search_type(), Some(SearchType::Manga));
        assert_eq!(MediaType::Manhwa.search_type(), Some(SearchType::Manga));
        assert_eq!(MediaType::Manhua.search_type(), Some(SearchType::Manga));
        assert_eq!(MediaType::Anime.search_type(), Some(SearchType::Anime));
        assert_eq!(MediaType::Movie.search_type(), None);
        assert_eq!(MediaType::KDrama.search_type(), None);
        assert_eq!(MediaType::Unknown.search_type(), None);
    }

    #[test]
    fn test_media_item_wire_format() {
        let item: MediaItem =
            serde_json::from_value(json!({ "id": 7, "title": "Mushishi", "type": "Anime" }))
                .unwrap();
        assert_eq!(item, MediaItem::new(7, "Mushishi", MediaType::Anime));

        let drama: MediaItem =
            serde_json::from_value(json!({ "id": 8, "title": "Signal", "type": "K-Drama" }))
                .unwrap();
        assert_eq!(drama.media_type, MediaType::KDrama);

        let odd: MediaItem =
            serde_json::from_value(json!({ "id": 9, "title": "Podcast", "type": "Podcast" }))
                .unwrap();
        assert_eq!(odd.media_type, MediaType::Unknown);
    }

    #[test]
    fn test_resolution_serializes_camel_case() {
        let value = serde_json::to_value(ImageResolution::external(1, "http://x/1.jpg".into()))
            .unwrap();
        assert_eq!(
            value,
            json!({ "id": 1, "imageUrl": "http://x/1.jpg", "source": "external" })
        );
    }

    #[test]
    fn test_progress_percentage_is_rounded() {
        assert_eq!(Progress::new(1, 3).percentage, 33);
        assert_eq!(Progress::new(2, 3).percentage, 67);
        assert_eq!(Progress::new(3, 3).percentage, 100);
        assert_eq!(Progress::new(0, 0).percentage, 0);
    }
}
