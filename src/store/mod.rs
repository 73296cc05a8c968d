//! # Document Store
//!
//! The store is an injected capability: ingestion appends documents to it
//! and the reconstructor reads from it. Nothing in the crate holds a global
//! connection.
//!
//! - `MemoryStore` - thread-safe in-memory store with JSON load/save
//! - `SqliteStore` - SQLite-backed store (`persistence` feature)
//!
//! Documents are append-only: a corrected trajectory is a new document.

pub mod memory;
#[cfg(feature = "persistence")]
pub mod sqlite;

pub use memory::MemoryStore;
#[cfg(feature = "persistence")]
pub use sqlite::SqliteStore;

use serde::{Deserialize, Serialize};

use crate::{QueryWindow, Result, TrajectoryDocument};

/// Read/append access to persisted trajectory documents.
pub trait TrajectoryStore {
    /// Append documents. Returns the number inserted.
    fn insert_many(&self, documents: &[TrajectoryDocument]) -> Result<usize>;

    /// Every document matching all predicates of `query`, in insertion order.
    fn find(&self, query: &StorageQuery) -> Result<Vec<TrajectoryDocument>>;
}

impl<S: TrajectoryStore + ?Sized> TrajectoryStore for &S {
    fn insert_many(&self, documents: &[TrajectoryDocument]) -> Result<usize> {
        (**self).insert_many(documents)
    }

    fn find(&self, query: &StorageQuery) -> Result<Vec<TrajectoryDocument>> {
        (**self).find(query)
    }
}

/// Predicates understood by every store, ANDed together.
///
/// `window` selects documents whose `[start_time, end_time]` overlaps it:
/// `start_time <= window.to AND end_time >= window.from`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageQuery {
    pub background: Option<String>,
    pub category: Option<i64>,
    pub window: Option<QueryWindow>,
}

impl StorageQuery {
    /// A query matching every document.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn background(mut self, background: impl Into<String>) -> Self {
        self.background = Some(background.into());
        self
    }

    pub fn category(mut self, category: i64) -> Self {
        self.category = Some(category);
        self
    }

    pub fn overlapping(mut self, window: QueryWindow) -> Self {
        self.window = Some(window);
        self
    }

    /// Evaluate the predicates against one document.
    pub fn matches(&self, document: &TrajectoryDocument) -> bool {
        if let Some(background) = &self.background {
            if &document.background != background {
                return false;
            }
        }
        if let Some(category) = self.category {
            if document.category != category {
                return false;
            }
        }
        match &self.window {
            Some(window) => window.overlaps(document.start_time, document.end_time),
            None => true,
        }
    }
}
