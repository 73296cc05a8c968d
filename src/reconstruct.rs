//! Rebuilding trajectories from persisted documents.
//!
//! Each document's point sub-documents are flattened back into point
//! records and fed through the [`TrajectoryBuilder`], so a reconstructed
//! trajectory is built exactly the way ingestion built the original.
//! Documents with unparseable geometry are skipped and reported; they never
//! abort the query.

use log::{debug, warn};

use crate::{
    Result, StorageQuery, TrajectoryBuilder, TrajectoryCollection, TrajectoryDocument,
    TrajectoryError, TrajectoryStore,
};

/// Result of a reconstruction: the collection plus the documents that had
/// to be skipped.
#[derive(Debug, Default)]
pub struct Reconstruction {
    pub collection: TrajectoryCollection,
    /// Data-quality conditions met while rebuilding (`MalformedGeometry`,
    /// `InconsistentCategory`, `DuplicateTimestamp`, `EmptyGroup`).
    pub warnings: Vec<TrajectoryError>,
}

impl Reconstruction {
    /// True when nothing matched. This is a normal outcome, not an error.
    pub fn is_empty(&self) -> bool {
        self.collection.is_empty()
    }

    /// Turn an empty result into [`TrajectoryError::NotFound`] for callers
    /// that treat "no data" as a failure.
    pub fn require_non_empty(self) -> Result<Self> {
        if self.is_empty() {
            Err(TrajectoryError::NotFound)
        } else {
            Ok(self)
        }
    }
}

/// Query the store and rebuild the matching trajectories.
pub fn reconstruct<S: TrajectoryStore + ?Sized>(
    store: &S,
    query: &StorageQuery,
) -> Result<Reconstruction> {
    let documents = store.find(query)?;
    debug!("Query matched {} documents", documents.len());
    reconstruct_documents(&documents, &TrajectoryBuilder::default())
}

/// Rebuild trajectories from already fetched documents.
pub fn reconstruct_documents(
    documents: &[TrajectoryDocument],
    builder: &TrajectoryBuilder,
) -> Result<Reconstruction> {
    let mut warnings = Vec::new();
    let mut records = Vec::new();

    for document in documents {
        if document.points.is_empty() {
            let err = TrajectoryError::EmptyGroup {
                identifier: document.identifier.clone(),
            };
            warn!("Skipping document: {}", err);
            warnings.push(err);
            continue;
        }
        match document.to_records() {
            Ok(mut points) => records.append(&mut points),
            Err(err) => {
                warn!("Skipping document: {}", err);
                warnings.push(err);
            }
        }
    }

    let outcome = builder.build(records)?;
    warnings.extend(outcome.warnings);

    Ok(Reconstruction {
        collection: outcome.collection,
        warnings,
    })
}
