//! # Trajectory Engine
//!
//! Wires the builder, the document store and the reconstructor together:
//! - `ingest` - build trajectories from raw records and append them to the store
//! - `query` - translate a date + hour range into a window and rebuild the
//!   matching trajectories
//!
//! The store is injected. The engine keeps no state besides its builder
//! configuration, so one engine can serve concurrent queries when the store
//! allows it.

use chrono::NaiveDate;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{
    reconstruct_documents, window, BuilderConfig, PointRecord, Reconstruction, Result,
    StorageQuery, TrajectoryBuilder, TrajectoryDocument, TrajectoryError, TrajectoryStore,
};

/// Outcome of one ingestion.
#[derive(Debug, Default)]
pub struct IngestReport {
    /// Documents appended to the store (one per trajectory).
    pub documents: usize,
    /// Points contained in those documents.
    pub points: usize,
    /// Data-quality conditions met while building.
    pub warnings: Vec<TrajectoryError>,
}

/// A presence query: one camera, optionally one category, one time-of-day
/// range on one calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryQuery {
    #[serde(default)]
    pub background: Option<String>,
    #[serde(default)]
    pub category: Option<i64>,
    pub date: NaiveDate,
    /// Fractional hour in `[0, 24)`.
    pub start_hour: f64,
    /// Fractional hour in `(0, 24]`; 24 is the end of the day.
    pub end_hour: f64,
}

impl TrajectoryQuery {
    pub fn new(date: NaiveDate, start_hour: f64, end_hour: f64) -> Self {
        Self {
            background: None,
            category: None,
            date,
            start_hour,
            end_hour,
        }
    }

    pub fn background(mut self, background: impl Into<String>) -> Self {
        self.background = Some(background.into());
        self
    }

    pub fn category(mut self, category: i64) -> Self {
        self.category = Some(category);
        self
    }

    /// Resolve the hour range and build the store predicates.
    pub fn storage_query(&self) -> Result<StorageQuery> {
        let mut query = StorageQuery::new().overlapping(window(
            self.date,
            self.start_hour,
            self.end_hour,
        )?);
        if let Some(background) = &self.background {
            query = query.background(background.clone());
        }
        if let Some(category) = self.category {
            query = query.category(category);
        }
        Ok(query)
    }
}

/// Ingest and query front end over an injected [`TrajectoryStore`].
pub struct TrajectoryEngine<S: TrajectoryStore> {
    store: S,
    builder: TrajectoryBuilder,
}

impl<S: TrajectoryStore> TrajectoryEngine<S> {
    /// Create an engine with the default builder configuration.
    pub fn new(store: S) -> Self {
        Self::with_config(store, BuilderConfig::default())
    }

    pub fn with_config(store: S, config: BuilderConfig) -> Self {
        Self {
            store,
            builder: TrajectoryBuilder::new(config),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Build trajectories from `records` and append one document per
    /// trajectory, tagged with the `background` camera.
    pub fn ingest(
        &self,
        records: impl IntoIterator<Item = PointRecord>,
        background: &str,
    ) -> Result<IngestReport> {
        if background.trim().is_empty() {
            return Err(TrajectoryError::validation(
                "background",
                "camera name must not be empty",
            ));
        }

        let outcome = self.builder.build(records)?;
        let documents: Vec<TrajectoryDocument> = outcome
            .collection
            .iter()
            .map(|t| TrajectoryDocument::from_trajectory(t, background))
            .collect();
        let points = outcome.collection.point_count();
        let inserted = self.store.insert_many(&documents)?;

        info!(
            "Ingested {} trajectories ({} points) for '{}' with {} warnings",
            inserted,
            points,
            background,
            outcome.warnings.len()
        );

        Ok(IngestReport {
            documents: inserted,
            points,
            warnings: outcome.warnings,
        })
    }

    /// Rebuild every trajectory matching `query`.
    ///
    /// An empty result is returned as such; use
    /// [`Reconstruction::require_non_empty`] to treat it as `NotFound`.
    pub fn query(&self, query: &TrajectoryQuery) -> Result<Reconstruction> {
        let storage_query = query.storage_query()?;
        let documents = self.store.find(&storage_query)?;
        debug!(
            "Query {:?} matched {} documents",
            storage_query,
            documents.len()
        );
        reconstruct_documents(&documents, &self.builder)
    }
}
