//! # Cover Store
//!
//! The keyed cover cache behind the HTTP API, persisted in a local SQLite file
//! through Turso. One row per catalog item id; a save for an existing id replaces
//! the row.

use chrono::Utc;
use covershelf::types::CoverRecord;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};
use turso::{params, Database, Value as TursoValue};

pub const CREATE_MEDIA_COVERS_TABLE_SQL: &str = "
CREATE TABLE IF NOT EXISTS media_covers (
    id INTEGER PRIMARY KEY,
    cover_image TEXT NOT NULL,
    title TEXT NOT NULL,
    media_type TEXT NOT NULL,
    source TEXT NOT NULL,
    updated_at TEXT NOT NULL
)";

/// Upper bound on ids bound into a single `IN (...)` clause.
pub const MAX_IDS_PER_STATEMENT: usize = 500;

fn id_placeholders(ids: &[i64]) -> (String, Vec<TursoValue>) {
    let placeholders = ids.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
    let values = ids.iter().map(|id| TursoValue::Integer(*id)).collect();
    (placeholders, values)
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] turso::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One cached cover as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCover {
    pub id: i64,
    pub cover_image: String,
    pub title: String,
    pub media_type: String,
    pub source: String,
    pub updated_at: String,
}

/// Manages all database interactions for the cover cache.
#[derive(Clone)]
pub struct CoverStore {
    db: Database,
    /// Writes run as explicit transactions; only one may be open at a time.
    write_gate: Arc<Mutex<()>>,
}

impl CoverStore {
    /// Opens (or creates) the database at `db_path` and ensures the schema exists.
    pub async fn new(db_path: &str) -> Result<Self, StoreError> {
        if db_path != ":memory:" {
            if let Some(parent) = Path::new(db_path).parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
        }

        let db = turso::Builder::new_local(db_path).build().await?;
        let conn = db.connect()?;
        conn.query("PRAGMA journal_mode=WAL;", ()).await?;
        conn.execute(CREATE_MEDIA_COVERS_TABLE_SQL, ()).await?;
        info!(db_path, "Cover store ready.");

        Ok(Self {
            db,
            write_gate: Arc::new(Mutex::new(())),
        })
    }

    /// Returns the stored covers for every id that has one.
    pub async fn find_many(&self, ids: &[i64]) -> Result<HashMap<i64, StoredCover>, StoreError> {
        let mut found = HashMap::new();
        if ids.is_empty() {
            return Ok(found);
        }

        let conn = self.db.connect()?;
        for chunk in ids.chunks(MAX_IDS_PER_STATEMENT) {
            let (placeholders, query_params) = id_placeholders(chunk);
            let sql = format!(
                "SELECT id, cover_image, title, media_type, source, updated_at
                 FROM media_covers WHERE id IN ({placeholders})"
            );

            let mut rows = conn.query(&sql, query_params).await?;
            while let Some(row) = rows.next().await? {
                let cover = StoredCover {
                    id: row.get(0)?,
                    cover_image: row.get(1)?,
                    title: row.get(2)?,
                    media_type: row.get(3)?,
                    source: row.get(4)?,
                    updated_at: row.get(5)?,
                };
                found.insert(cover.id, cover);
            }
        }

        debug!("Cover lookup: {} of {} ids cached.", found.len(), ids.len());
        Ok(found)
    }

    /// Stores a batch of covers using a "delete then insert" strategy, so a
    /// re-save overwrites the previous entry for the same id. Returns the number
    /// of distinct ids written.
    pub async fn upsert_many(&self, records: &[CoverRecord]) -> Result<usize, StoreError> {
        if records.is_empty() {
            return Ok(0);
        }

        // A batch may name the same id twice; the last entry wins.
        let mut latest: HashMap<i64, &CoverRecord> = HashMap::new();
        for record in records {
            latest.insert(record.id, record);
        }
        let records: Vec<&CoverRecord> = latest.into_values().collect();

        let _guard = self.write_gate.lock().await;
        let conn = self.db.connect()?;
        let updated_at = Utc::now().to_rfc3339();

        conn.execute("BEGIN TRANSACTION", ()).await?;
        let result = async {
            // 1. Drop existing rows for these ids.
            let ids: Vec<i64> = records.iter().map(|record| record.id).collect();
            for chunk in ids.chunks(MAX_IDS_PER_STATEMENT) {
                let (placeholders, delete_params) = id_placeholders(chunk);
                let delete_sql = format!("DELETE FROM media_covers WHERE id IN ({placeholders})");
                conn.execute(&delete_sql, delete_params).await?;
            }

            // 2. Insert the new rows.
            let mut stmt = conn
                .prepare(
                    "INSERT INTO media_covers (id, cover_image, title, media_type, source, updated_at)
                     VALUES (?, ?, ?, ?, ?, ?)",
                )
                .await?;
            for record in &records {
                stmt.execute(params![
                    record.id,
                    record.image_url.clone(),
                    record.title.clone(),
                    record.media_type.to_string(),
                    record.source.to_string(),
                    updated_at.clone()
                ])
                .await?;
            }
            Ok::<_, turso::Error>(())
        }
        .await;

        match result {
            Ok(()) => {
                conn.execute("COMMIT", ()).await?;
                info!("Stored {} covers.", records.len());
                Ok(records.len())
            }
            Err(e) => {
                let _ = conn.execute("ROLLBACK", ()).await;
                Err(e.into())
            }
        }
    }
}
