//! # Trajscope
//!
//! Trajectory reconstruction and spatio-temporal analysis for objects
//! (vehicles, people) tracked by fixed cameras.
//!
//! This library provides:
//! - Decoding of raw positional logs into typed point records
//! - Trajectory building (grouping by identifier, ordering by time)
//! - Query windows built from a calendar date and fractional hours
//! - Reconstruction of trajectories from persisted point documents
//! - Analyses over trajectory collections: stop detection, dwell inside
//!   monitored zones, reference-line crossings and start/finish timing
//!
//! ## Features
//!
//! - **`parallel`** - Run per-trajectory analysis work on rayon
//! - **`persistence`** - SQLite-backed document store
//! - **`cli`** - The `trajscope` command-line tool
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use trajscope::{build, PointRecord};
//! use trajscope::analysis::{with_stopped, AnalysisOptions, StopConfig};
//!
//! let t0 = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap().and_hms_opt(8, 0, 0).unwrap();
//! let records: Vec<PointRecord> = (0..10)
//!     .map(|i| PointRecord::new("car-1", 2, t0 + chrono::TimeDelta::seconds(i), 10.0, 10.0))
//!     .collect();
//!
//! let outcome = build(records).unwrap();
//! let config = StopConfig { stop_threshold: 1.0, min_duration: 5.0, noise_tolerance: 2.0 };
//! let result = with_stopped(&outcome.collection, &config, &AnalysisOptions::default()).unwrap();
//! assert_eq!(result.count("stop_events"), Some(1));
//! ```

use std::collections::BTreeMap;

use chrono::{NaiveDateTime, TimeDelta};
use geo::{Coord, LineString};
use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{ErrorKind, OptionExt, Result, TrajectoryError};

// Planar geometry and time helpers
pub mod geo_utils;

// WKT reading and writing for persisted geometry
pub mod wkt;

// Raw log decoding
pub mod decoder;
pub use decoder::{decode_line, decode_str, TimestampFormat};

// Trajectory building from unordered point records
pub mod builder;
pub use builder::{build, BuildOutcome, BuilderConfig, CategoryPolicy, TrajectoryBuilder};

// Calendar date + fractional hours to absolute instants
pub mod window;
pub use window::{window, QueryWindow};

// Persisted document shape
pub mod document;
pub use document::{PointDocument, TrajectoryDocument};

// Injected document store capability
pub mod store;
pub use store::{MemoryStore, StorageQuery, TrajectoryStore};
#[cfg(feature = "persistence")]
pub use store::SqliteStore;

// Rebuilding trajectories from stored documents
pub mod reconstruct;
pub use reconstruct::{reconstruct, reconstruct_documents, Reconstruction};

// R-tree over trajectory bounds
pub mod spatial_index;
pub use spatial_index::SpatialIndex;

// Analyses over trajectory collections
pub mod analysis;
pub use analysis::{AnalysisOptions, AnalysisResult, PlotWindow, SummaryValue};

// Ingest / query wiring over an injected store
pub mod engine;
pub use engine::{IngestReport, TrajectoryEngine, TrajectoryQuery};

// Synthetic camera scenes for tests and benchmarks
pub mod synthetic;

// ============================================================================
// Core Types
// ============================================================================

/// A timestamped planar position.
///
/// Coordinates live in the camera's own system (pixels or a projected
/// plane). No reprojection is ever performed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub timestamp: NaiveDateTime,
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(timestamp: NaiveDateTime, x: f64, y: f64) -> Self {
        Self { timestamp, x, y }
    }

    /// Check that both coordinates are finite.
    pub fn is_valid(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn coord(&self) -> Coord<f64> {
        Coord {
            x: self.x,
            y: self.y,
        }
    }
}

/// One decoded observation: `(identifier, category, timestamp, x, y)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointRecord {
    pub identifier: String,
    pub category: i64,
    pub timestamp: NaiveDateTime,
    pub x: f64,
    pub y: f64,
}

impl PointRecord {
    pub fn new(
        identifier: impl Into<String>,
        category: i64,
        timestamp: NaiveDateTime,
        x: f64,
        y: f64,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            category,
            timestamp,
            x,
            y,
        }
    }

    pub fn point(&self) -> Point {
        Point::new(self.timestamp, self.x, self.y)
    }
}

/// Axis-aligned bounding box of a set of points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Bounds {
    /// Create bounds from points. Returns `None` for an empty slice.
    pub fn from_points(points: &[Point]) -> Option<Self> {
        Self::from_coords(points.iter().map(Point::coord))
    }

    pub fn from_coords(coords: impl IntoIterator<Item = Coord<f64>>) -> Option<Self> {
        let mut iter = coords.into_iter();
        let first = iter.next()?;
        let mut bounds = Self {
            min_x: first.x,
            max_x: first.x,
            min_y: first.y,
            max_y: first.y,
        };
        for c in iter {
            bounds.min_x = bounds.min_x.min(c.x);
            bounds.max_x = bounds.max_x.max(c.x);
            bounds.min_y = bounds.min_y.min(c.y);
            bounds.max_y = bounds.max_y.max(c.y);
        }
        Some(bounds)
    }

    /// Boundary-inclusive containment test.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    pub fn intersects(&self, other: &Bounds) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }
}

/// An ordered sequence of points sharing one identifier and one category.
///
/// Invariants, enforced by [`Trajectory::new`]:
/// - at least one point
/// - timestamps strictly increasing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trajectory {
    id: String,
    category: i64,
    points: Vec<Point>,
}

impl Trajectory {
    /// Create a trajectory from already ordered points.
    pub fn new(id: impl Into<String>, category: i64, points: Vec<Point>) -> Result<Self> {
        let id = id.into();
        if points.is_empty() {
            return Err(TrajectoryError::EmptyGroup { identifier: id });
        }
        if let Some(pair) = points
            .windows(2)
            .find(|pair| pair[1].timestamp <= pair[0].timestamp)
        {
            return Err(TrajectoryError::validation(
                "points",
                format!(
                    "timestamps of '{}' are not strictly increasing at {}",
                    id, pair[1].timestamp
                ),
            ));
        }
        Ok(Self {
            id,
            category,
            points,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn category(&self) -> i64 {
        self.category
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false: a trajectory holds at least one point.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn start_time(&self) -> NaiveDateTime {
        self.points[0].timestamp
    }

    pub fn end_time(&self) -> NaiveDateTime {
        self.points[self.points.len() - 1].timestamp
    }

    pub fn duration(&self) -> TimeDelta {
        self.end_time() - self.start_time()
    }

    /// Elapsed time between first and last point, in seconds.
    pub fn duration_secs(&self) -> f64 {
        geo_utils::seconds(self.duration())
    }

    /// Polyline through the points in time order.
    pub fn geometry(&self) -> LineString<f64> {
        LineString::new(self.points.iter().map(Point::coord).collect())
    }

    /// Total planar length of the polyline.
    pub fn path_length(&self) -> f64 {
        geo_utils::path_length(&self.points)
    }

    pub fn bounds(&self) -> Bounds {
        // Non-empty by construction.
        Bounds::from_points(&self.points).unwrap_or(Bounds {
            min_x: 0.0,
            max_x: 0.0,
            min_y: 0.0,
            max_y: 0.0,
        })
    }
}

/// A set of trajectories keyed by identifier.
///
/// Iteration order is the identifier order, which keeps every analysis
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrajectoryCollection {
    trajectories: BTreeMap<String, Trajectory>,
}

impl TrajectoryCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a collection, rejecting duplicate identifiers.
    pub fn from_trajectories(trajectories: impl IntoIterator<Item = Trajectory>) -> Result<Self> {
        let mut collection = Self::new();
        for trajectory in trajectories {
            if collection.trajectories.contains_key(trajectory.id()) {
                return Err(TrajectoryError::validation(
                    "trajectories",
                    format!("duplicate identifier '{}'", trajectory.id()),
                ));
            }
            collection.insert(trajectory);
        }
        Ok(collection)
    }

    pub(crate) fn insert(&mut self, trajectory: Trajectory) {
        self.trajectories.insert(trajectory.id.clone(), trajectory);
    }

    pub fn len(&self) -> usize {
        self.trajectories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trajectories.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Trajectory> {
        self.trajectories.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.trajectories.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.trajectories.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Trajectory> {
        self.trajectories.values()
    }

    /// Total number of points across all trajectories.
    pub fn point_count(&self) -> usize {
        self.iter().map(Trajectory::len).sum()
    }

    /// Number of trajectories per category.
    pub fn category_counts(&self) -> BTreeMap<i64, usize> {
        let mut counts = BTreeMap::new();
        for trajectory in self.iter() {
            *counts.entry(trajectory.category()).or_insert(0) += 1;
        }
        counts
    }

    /// New collection holding the trajectories accepted by `predicate`.
    pub fn filter(&self, predicate: impl Fn(&Trajectory) -> bool) -> Self {
        Self {
            trajectories: self
                .trajectories
                .iter()
                .filter(|(_, t)| predicate(t))
                .map(|(id, t)| (id.clone(), t.clone()))
                .collect(),
        }
    }
}

impl<'a> IntoIterator for &'a TrajectoryCollection {
    type Item = &'a Trajectory;
    type IntoIter = std::collections::btree_map::Values<'a, String, Trajectory>;

    fn into_iter(self) -> Self::IntoIter {
        self.trajectories.values()
    }
}
