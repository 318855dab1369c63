//! SQLite persistence for prediction records
//!
//! One flat, append-only table. Rows are written once per classified image and
//! never updated.

use std::path::Path;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use serde::Serialize;
use tracing::debug;

use crate::api::PredictionResponse;
use crate::utils::error::Result;

/// Default database location
pub const DEFAULT_DB_PATH: &str = "database/prediction.db";

/// A stored prediction
#[derive(Debug, Clone, Serialize)]
pub struct PredictionRecord {
    pub id: i64,
    pub filename: String,
    pub predicted_class: String,
    pub confidence: f64,
    pub timestamp: NaiveDateTime,
}

/// Append-only store of predictions
pub struct PredictionStore {
    conn: Connection,
}

impl PredictionStore {
    /// Open (or create) the database at `path` and ensure the schema exists
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let store = Self {
            conn: Connection::open(path)?,
        };
        store.init_schema()?;
        debug!("Prediction store ready at {:?}", path);
        Ok(store)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS predictions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                filename TEXT,
                predicted_class TEXT,
                confidence REAL,
                timestamp DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;
        Ok(())
    }

    /// Insert one record and return its id
    pub fn insert(&self, filename: &str, prediction: &PredictionResponse) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO predictions (filename, predicted_class, confidence) VALUES (?1, ?2, ?3)",
            params![filename, prediction.predicted_class, prediction.confidence],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Number of stored records
    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM predictions", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Most recent records, newest first
    pub fn recent(&self, limit: usize) -> Result<Vec<PredictionRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, filename, predicted_class, confidence, timestamp
             FROM predictions ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(PredictionRecord {
                id: row.get(0)?,
                filename: row.get(1)?,
                predicted_class: row.get(2)?,
                confidence: row.get(3)?,
                timestamp: row.get(4)?,
            })
        })?;

        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }
}
