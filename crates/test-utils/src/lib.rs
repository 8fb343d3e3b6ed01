use async_trait::async_trait;
use covershelf::catalog::CatalogSource;
use covershelf::errors::CoverError;
use covershelf::providers::{CoverCache, CoverSearch};
use covershelf::types::{CoverRecord, MediaItem, SearchType};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

// --- Mock Search Client ---

/// An in-memory `CoverSearch` that answers from pre-programmed titles and records
/// every call it receives.
#[derive(Clone, Debug, Default)]
pub struct MockCoverSearch {
    covers: Arc<Mutex<HashMap<String, String>>>,
    failing: Arc<Mutex<Vec<String>>>,
    calls: Arc<Mutex<Vec<(String, SearchType)>>>,
}

impl MockCoverSearch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-programs the cover returned for a title.
    pub fn add_cover(&self, title: &str, url: &str) {
        let mut covers = self.covers.lock().unwrap();
        covers.insert(title.to_string(), url.to_string());
    }

    /// Makes every search for `title` fail with a transport-style error.
    pub fn fail_for(&self, title: &str) {
        self.failing.lock().unwrap().push(title.to_string());
    }

    /// Retrieves the recorded calls for assertion.
    pub fn get_calls(&self) -> Vec<(String, SearchType)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl CoverSearch for MockCoverSearch {
    async fn search_cover(
        &self,
        title: &str,
        search_type: SearchType,
    ) -> Result<Option<String>, CoverError> {
        self.calls
            .lock()
            .unwrap()
            .push((title.to_string(), search_type));

        if self.failing.lock().unwrap().iter().any(|t| t == title) {
            return Err(CoverError::UnexpectedStatus {
                status: 500,
                body: format!("MockCoverSearch: programmed failure for '{title}'"),
            });
        }
        Ok(self.covers.lock().unwrap().get(title).cloned())
    }
}

// --- Mock Cache ---

/// An in-memory `CoverCache` that records lookups and saves.
#[derive(Clone, Debug, Default)]
pub struct MockCoverCache {
    entries: Arc<Mutex<HashMap<i64, String>>>,
    lookups: Arc<Mutex<Vec<Vec<i64>>>>,
    saves: Arc<Mutex<Vec<Vec<CoverRecord>>>>,
    fail_lookups: Arc<Mutex<bool>>,
    fail_saves: Arc<Mutex<bool>>,
}

impl MockCoverCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: i64, url: &str) {
        self.entries.lock().unwrap().insert(id, url.to_string());
    }

    pub fn get(&self, id: i64) -> Option<String> {
        self.entries.lock().unwrap().get(&id).cloned()
    }

    pub fn set_fail_lookups(&self, fail: bool) {
        *self.fail_lookups.lock().unwrap() = fail;
    }

    pub fn set_fail_saves(&self, fail: bool) {
        *self.fail_saves.lock().unwrap() = fail;
    }

    /// The ids sent with every `lookup_many` call, in call order.
    pub fn get_lookups(&self) -> Vec<Vec<i64>> {
        self.lookups.lock().unwrap().clone()
    }

    /// The records sent with every `save_many` call, in call order.
    pub fn get_saves(&self) -> Vec<Vec<CoverRecord>> {
        self.saves.lock().unwrap().clone()
    }
}

#[async_trait]
impl CoverCache for MockCoverCache {
    async fn lookup_many(&self, items: &[MediaItem]) -> Result<HashMap<i64, String>, CoverError> {
        self.lookups
            .lock()
            .unwrap()
            .push(items.iter().map(|item| item.id).collect());

        if *self.fail_lookups.lock().unwrap() {
            return Err(CoverError::CacheBackend(
                "MockCoverCache: programmed lookup failure".to_string(),
            ));
        }

        let entries = self.entries.lock().unwrap();
        Ok(items
            .iter()
            .filter_map(|item| entries.get(&item.id).map(|url| (item.id, url.clone())))
            .collect())
    }

    async fn save_many(&self, records: &[CoverRecord]) -> Result<usize, CoverError> {
        self.saves.lock().unwrap().push(records.to_vec());

        if *self.fail_saves.lock().unwrap() {
            return Err(CoverError::CacheBackend(
                "MockCoverCache: programmed save failure".to_string(),
            ));
        }

        let mut entries = self.entries.lock().unwrap();
        for record in records {
            entries.insert(record.id, record.image_url.clone());
        }
        Ok(records.len())
    }
}

// --- Mock Catalog ---

/// A fixed in-memory catalog.
#[derive(Clone, Debug, Default)]
pub struct MockCatalog {
    items: Vec<MediaItem>,
    fail: bool,
}

impl MockCatalog {
    pub fn new(items: Vec<MediaItem>) -> Self {
        Self { items, fail: false }
    }

    /// A catalog whose every read fails.
    pub fn failing() -> Self {
        Self {
            items: Vec::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl CatalogSource for MockCatalog {
    async fn fetch_all(&self) -> Result<Vec<MediaItem>, CoverError> {
        if self.fail {
            return Err(CoverError::Catalog(
                "MockCatalog: programmed failure".to_string(),
            ));
        }
        Ok(self.items.clone())
    }
}
