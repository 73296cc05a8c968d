//! In-memory document store.

use std::fs;
use std::path::Path;
use std::sync::RwLock;

use log::debug;

use super::{StorageQuery, TrajectoryStore};
use crate::{Result, TrajectoryDocument, TrajectoryError};

/// Thread-safe, append-only in-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RwLock<Vec<TrajectoryDocument>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_documents(documents: Vec<TrajectoryDocument>) -> Self {
        Self {
            documents: RwLock::new(documents),
        }
    }

    /// Load a JSON array of documents. A missing file yields an empty store.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let content = fs::read_to_string(path)?;
        let documents: Vec<TrajectoryDocument> = serde_json::from_str(&content)?;
        debug!("Loaded {} documents from {}", documents.len(), path.display());
        Ok(Self::with_documents(documents))
    }

    /// Write every document as a JSON array.
    pub fn save(&self, path: &Path) -> Result<()> {
        let documents = self.read()?;
        fs::write(path, serde_json::to_string_pretty(&*documents)?)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.read().map(|docs| docs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Vec<TrajectoryDocument>>> {
        self.documents
            .read()
            .map_err(|_| TrajectoryError::Storage("memory store lock poisoned".to_string()))
    }
}

impl TrajectoryStore for MemoryStore {
    fn insert_many(&self, documents: &[TrajectoryDocument]) -> Result<usize> {
        let mut guard = self
            .documents
            .write()
            .map_err(|_| TrajectoryError::Storage("memory store lock poisoned".to_string()))?;
        guard.extend_from_slice(documents);
        Ok(documents.len())
    }

    fn find(&self, query: &StorageQuery) -> Result<Vec<TrajectoryDocument>> {
        Ok(self
            .read()?
            .iter()
            .filter(|doc| query.matches(doc))
            .cloned()
            .collect())
    }
}
