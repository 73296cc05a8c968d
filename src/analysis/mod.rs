//! # Analysis Engine
//!
//! Pure functions over a [`TrajectoryCollection`]. Each one returns a fresh
//! [`AnalysisResult`]: a summary keyed by metric name plus the geometry a
//! renderer should highlight. Nothing is cached and inputs are never
//! modified, so running an analysis twice yields identical results.
//!
//! An empty collection is not an error: it produces zero counts.
//! Degenerate lines and rectangles are rejected with
//! [`TrajectoryError::InvalidGeometry`](crate::TrajectoryError::InvalidGeometry)
//! when they are constructed ([`Polyline`], [`Rectangle`]).
//!
//! Available analyses:
//! - [`pass_through`] / [`one_category`] - counts per category
//! - [`with_limits`] - crossings of a reference line
//! - [`with_start_finish`] - timing between a departure and an arrival line
//! - [`with_stopped`] / [`with_stop_in_rectangle`] - stop detection
//! - [`in_monitored_area`] - dwell inside a rectangle

pub mod crossing;
pub mod overview;
pub mod stops;
pub mod zone;

pub use crate::geo_utils::{CrossingDirection, Polyline, Rectangle};
pub use crossing::{line_crossings, with_limits, with_start_finish, Crossing};
pub use overview::{one_category, pass_through};
pub use stops::{detect_stops, with_stop_in_rectangle, with_stopped, StopConfig, StopEvent};
pub use zone::{dwell_intervals, in_monitored_area, DwellInterval};

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDateTime;
use geo::Coord;
use log::debug;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{Bounds, Point, SpatialIndex, Trajectory, TrajectoryCollection};

// ============================================================================
// Options
// ============================================================================

/// Plot limits as supplied by the caller. The two limits of an axis may
/// come in either order; `min_*`/`max_*` normalize them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlotWindow {
    pub xlim1: f64,
    pub xlim2: f64,
    pub ylim1: f64,
    pub ylim2: f64,
}

impl Default for PlotWindow {
    fn default() -> Self {
        Self {
            xlim1: 0.0,
            xlim2: 100.0,
            ylim1: 0.0,
            ylim2: 100.0,
        }
    }
}

impl PlotWindow {
    pub fn min_x(&self) -> f64 {
        self.xlim1.min(self.xlim2)
    }

    pub fn max_x(&self) -> f64 {
        self.xlim1.max(self.xlim2)
    }

    pub fn min_y(&self) -> f64 {
        self.ylim1.min(self.ylim2)
    }

    pub fn max_y(&self) -> f64 {
        self.ylim1.max(self.ylim2)
    }

    /// Boundary-inclusive containment test.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x() && x <= self.max_x() && y >= self.min_y() && y <= self.max_y()
    }
}

/// Options shared by every analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOptions {
    /// Only consider trajectories of this category.
    #[serde(default)]
    pub category: Option<i64>,
    /// Clip highlighted geometry to this window. Summaries always use the
    /// full data.
    #[serde(default)]
    pub plot_window: Option<PlotWindow>,
}

impl AnalysisOptions {
    pub fn for_category(category: i64) -> Self {
        Self {
            category: Some(category),
            ..Self::default()
        }
    }

    /// Trajectories selected by the category option, in identifier order.
    pub fn select<'a>(&self, collection: &'a TrajectoryCollection) -> Vec<&'a Trajectory> {
        collection
            .iter()
            .filter(|t| self.category.map_or(true, |c| t.category() == c))
            .collect()
    }

    fn clip(&self, points: &[Point]) -> Vec<Point> {
        match &self.plot_window {
            Some(window) => points
                .iter()
                .filter(|p| window.contains(p.x, p.y))
                .copied()
                .collect(),
            None => points.to_vec(),
        }
    }
}

// ============================================================================
// Results
// ============================================================================

/// One summary metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SummaryValue {
    Count(u64),
    Number(f64),
    Text(String),
    Coord { x: f64, y: f64 },
    List(Vec<SummaryValue>),
    Map(BTreeMap<String, SummaryValue>),
    /// No value (e.g. a mean over zero items).
    Null,
}

impl From<usize> for SummaryValue {
    fn from(value: usize) -> Self {
        Self::Count(value as u64)
    }
}

impl From<f64> for SummaryValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<Option<f64>> for SummaryValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::Null, Self::Number)
    }
}

impl From<String> for SummaryValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Coord<f64>> for SummaryValue {
    fn from(c: Coord<f64>) -> Self {
        Self::Coord { x: c.x, y: c.y }
    }
}

/// What a highlighted geometry represents, for the renderer's styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HighlightTag {
    Trajectory,
    Crossing,
    Complete,
    Partial,
    Stop,
    Dwell,
    Zone,
    ReferenceLine,
    DepartureLine,
    ArrivalLine,
}

/// Geometry handed to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HighlightedGeometry {
    /// A (possibly clipped) run of trajectory points.
    Path {
        trajectory_id: String,
        category: i64,
        tag: HighlightTag,
        points: Vec<Point>,
    },
    /// A single location, e.g. a crossing or a stop centroid.
    Marker {
        trajectory_id: String,
        tag: HighlightTag,
        x: f64,
        y: f64,
        timestamp: Option<NaiveDateTime>,
    },
    /// A closed ring, e.g. a monitored zone.
    Polygon {
        tag: HighlightTag,
        ring: Vec<[f64; 2]>,
    },
    /// An open polyline, e.g. a reference line.
    Line {
        tag: HighlightTag,
        coords: Vec<[f64; 2]>,
    },
}

/// Output of one analysis call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    /// Name of the analysis that produced this result.
    pub analysis: String,
    pub summary: BTreeMap<String, SummaryValue>,
    pub highlighted: Vec<HighlightedGeometry>,
}

impl AnalysisResult {
    pub fn new(analysis: &str) -> Self {
        Self {
            analysis: analysis.to_string(),
            summary: BTreeMap::new(),
            highlighted: Vec::new(),
        }
    }

    pub fn set(&mut self, key: &str, value: impl Into<SummaryValue>) {
        self.summary.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&SummaryValue> {
        self.summary.get(key)
    }

    /// A `Count` metric.
    pub fn count(&self, key: &str) -> Option<u64> {
        match self.summary.get(key)? {
            SummaryValue::Count(n) => Some(*n),
            _ => None,
        }
    }

    /// A `Number` metric.
    pub fn number(&self, key: &str) -> Option<f64> {
        match self.summary.get(key)? {
            SummaryValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Highlight a trajectory run, clipped to the plot window. Runs that are
    /// clipped away entirely are dropped.
    pub(crate) fn push_path(
        &mut self,
        options: &AnalysisOptions,
        trajectory: &Trajectory,
        tag: HighlightTag,
        points: &[Point],
    ) {
        let points = options.clip(points);
        if points.is_empty() {
            return;
        }
        self.highlighted.push(HighlightedGeometry::Path {
            trajectory_id: trajectory.id().to_string(),
            category: trajectory.category(),
            tag,
            points,
        });
    }

    pub(crate) fn push_marker(
        &mut self,
        options: &AnalysisOptions,
        trajectory_id: &str,
        tag: HighlightTag,
        at: Coord<f64>,
        timestamp: Option<NaiveDateTime>,
    ) {
        if let Some(window) = &options.plot_window {
            if !window.contains(at.x, at.y) {
                return;
            }
        }
        self.highlighted.push(HighlightedGeometry::Marker {
            trajectory_id: trajectory_id.to_string(),
            tag,
            x: at.x,
            y: at.y,
            timestamp,
        });
    }

    pub(crate) fn push_line(&mut self, tag: HighlightTag, line: &Polyline) {
        self.highlighted.push(HighlightedGeometry::Line {
            tag,
            coords: line.coords().iter().map(|c| [c.x, c.y]).collect(),
        });
    }

    pub(crate) fn push_zone(&mut self, rect: &Rectangle) {
        self.highlighted.push(HighlightedGeometry::Polygon {
            tag: HighlightTag::Zone,
            ring: rect.ring().iter().map(|c| [c.x, c.y]).collect(),
        });
    }
}

// ============================================================================
// Shared helpers
// ============================================================================

/// Run `f` on every trajectory, in parallel when the `parallel` feature is
/// enabled. Output order matches input order.
pub(crate) fn per_trajectory<'a, T, F>(trajectories: &[&'a Trajectory], f: F) -> Vec<T>
where
    T: Send,
    F: Fn(&'a Trajectory) -> T + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        trajectories.par_iter().map(|t| f(*t)).collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        trajectories.iter().map(|t| f(*t)).collect()
    }
}

/// Selected trajectories whose bounds touch `envelope`, in identifier order.
/// Anything outside the envelope cannot cross a line or enter a zone
/// within it.
pub(crate) fn candidates<'a>(
    collection: &'a TrajectoryCollection,
    options: &AnalysisOptions,
    envelope: &Bounds,
) -> Vec<&'a Trajectory> {
    let index = SpatialIndex::build(collection);
    let hits: BTreeSet<String> = index.query(envelope).into_iter().collect();
    let selected: Vec<&Trajectory> = options
        .select(collection)
        .into_iter()
        .filter(|t| hits.contains(t.id()))
        .collect();
    debug!(
        "Spatial pre-filter kept {} of {} trajectories",
        selected.len(),
        collection.len()
    );
    selected
}

pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub(crate) fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_even_and_odd() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), Some(2.5));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn test_plot_window_normalizes_limits() {
        let window = PlotWindow {
            xlim1: 50.0,
            xlim2: 10.0,
            ylim1: -5.0,
            ylim2: 5.0,
        };
        assert_eq!(window.min_x(), 10.0);
        assert_eq!(window.max_x(), 50.0);
        assert!(window.contains(10.0, 5.0));
        assert!(!window.contains(9.9, 0.0));
    }
}
