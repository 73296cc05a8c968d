//! SQLite-backed document store.
//!
//! The queryable fields (`identifier`, `category`, `background`,
//! `start_time`, `end_time`) live in indexed columns; the full document is
//! kept as JSON. Timestamps are stored in the fixed-width text form of
//! [`crate::document::time_format`] so the overlap test is a text comparison.

use std::sync::Mutex;

use log::debug;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};

use super::{StorageQuery, TrajectoryStore};
use crate::document::time_format;
use crate::{Result, TrajectoryDocument, TrajectoryError};

pub struct SqliteStore {
    db: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a store at `db_path`.
    pub fn new(db_path: &str) -> Result<Self> {
        let db = Connection::open(db_path)?;
        Self::init_schema(&db)?;
        Ok(Self { db: Mutex::new(db) })
    }

    /// Create an in-memory database (for testing).
    pub fn in_memory() -> Result<Self> {
        Self::new(":memory:")
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS trajectories (
                row_id INTEGER PRIMARY KEY AUTOINCREMENT,
                identifier TEXT NOT NULL,
                category INTEGER NOT NULL,
                background TEXT NOT NULL,
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                body TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_trajectories_background ON trajectories(background);
            CREATE INDEX IF NOT EXISTS idx_trajectories_category ON trajectories(category);
            CREATE INDEX IF NOT EXISTS idx_trajectories_time ON trajectories(start_time, end_time);
            "#,
        )?;
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.db
            .lock()
            .map_err(|_| TrajectoryError::Storage("sqlite connection lock poisoned".to_string()))
    }
}

impl TrajectoryStore for SqliteStore {
    fn insert_many(&self, documents: &[TrajectoryDocument]) -> Result<usize> {
        let mut db = self.lock()?;
        let tx = db.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO trajectories (identifier, category, background, start_time, end_time, body)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for doc in documents {
                stmt.execute(params![
                    doc.identifier,
                    doc.category,
                    doc.background,
                    time_format::to_string(&doc.start_time),
                    time_format::to_string(&doc.end_time),
                    serde_json::to_string(doc)?,
                ])?;
            }
        }
        tx.commit()?;
        debug!("Inserted {} documents", documents.len());
        Ok(documents.len())
    }

    fn find(&self, query: &StorageQuery) -> Result<Vec<TrajectoryDocument>> {
        let mut sql = String::from("SELECT body FROM trajectories WHERE 1 = 1");
        let mut values: Vec<Value> = Vec::new();
        if let Some(background) = &query.background {
            sql.push_str(" AND background = ?");
            values.push(Value::Text(background.clone()));
        }
        if let Some(category) = query.category {
            sql.push_str(" AND category = ?");
            values.push(Value::Integer(category));
        }
        if let Some(window) = &query.window {
            sql.push_str(" AND start_time <= ? AND end_time >= ?");
            values.push(Value::Text(time_format::to_string(&window.to)));
            values.push(Value::Text(time_format::to_string(&window.from)));
        }
        sql.push_str(" ORDER BY row_id");

        let db = self.lock()?;
        let mut stmt = db.prepare(&sql)?;
        let bodies = stmt
            .query_map(params_from_iter(values), |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        bodies
            .iter()
            .map(|body| serde_json::from_str(body).map_err(TrajectoryError::from))
            .collect()
    }
}
