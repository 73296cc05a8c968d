//! Stop detection.
//!
//! A stop is a run of consecutive points that stays within
//! `noise_tolerance` of its own centroid, moves with an average speed of at
//! most `stop_threshold`, and lasts at least `min_duration` seconds.
//!
//! Runs are found with one greedy left-to-right scan: the candidate window
//! grows while the next point keeps both the radius and the speed bound,
//! and closes as soon as it would break one. A closed window long enough
//! becomes a stop event; the scan then restarts at the point that broke the
//! window. Longer stops therefore win over earlier, shorter ones that
//! overlap them, and ties go to the earliest start.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use geo::Coord;
use log::debug;
use serde::{Deserialize, Serialize};

use super::{per_trajectory, AnalysisOptions, AnalysisResult, HighlightTag, Rectangle, SummaryValue};
use crate::geo_utils::{centroid, distance, mean_speed, seconds_between};
use crate::{Point, Result, Trajectory, TrajectoryCollection, TrajectoryError};

/// Thresholds for stop detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StopConfig {
    /// Maximum average speed (coordinate units per second) inside a stop.
    /// Default: 1.0
    pub stop_threshold: f64,
    /// Minimum stop duration in seconds.
    /// Default: 5.0
    pub min_duration: f64,
    /// Maximum distance from any stop point to the stop centroid.
    /// Default: 5.0
    pub noise_tolerance: f64,
}

impl Default for StopConfig {
    fn default() -> Self {
        Self {
            stop_threshold: 1.0,
            min_duration: 5.0,
            noise_tolerance: 5.0,
        }
    }
}

impl StopConfig {
    /// Reject non-finite or negative thresholds and a zero noise tolerance.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("stop_threshold", self.stop_threshold),
            ("min_duration", self.min_duration),
            ("noise_tolerance", self.noise_tolerance),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(TrajectoryError::validation(
                    name,
                    format!("must be a finite, non-negative number, got {value}"),
                ));
            }
        }
        if self.noise_tolerance == 0.0 {
            return Err(TrajectoryError::validation(
                "noise_tolerance",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// One detected stop.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StopEvent {
    pub trajectory_id: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub duration_secs: f64,
    pub centroid_x: f64,
    pub centroid_y: f64,
    /// Index of the first stop point within the trajectory.
    pub start_index: usize,
    /// Index of the last stop point (inclusive).
    pub end_index: usize,
}

impl StopEvent {
    pub fn centroid(&self) -> Coord<f64> {
        Coord {
            x: self.centroid_x,
            y: self.centroid_y,
        }
    }

    pub fn point_count(&self) -> usize {
        self.end_index - self.start_index + 1
    }
}

/// Whether `window` satisfies the radius and speed bounds.
fn window_holds(window: &[Point], config: &StopConfig) -> bool {
    let Some(center) = centroid(window) else {
        return false;
    };
    window
        .iter()
        .all(|p| distance(p.coord(), center) <= config.noise_tolerance)
        && mean_speed(window) <= config.stop_threshold
}

/// Turn a closed window into a stop event if it lasts long enough.
/// Single points never form a stop.
fn close_window(
    trajectory: &Trajectory,
    start: usize,
    window: &[Point],
    config: &StopConfig,
) -> Option<StopEvent> {
    if window.len() < 2 {
        return None;
    }
    let first = window[0];
    let last = window[window.len() - 1];
    let duration_secs = seconds_between(first.timestamp, last.timestamp);
    if duration_secs < config.min_duration {
        return None;
    }
    let center = centroid(window)?;
    Some(StopEvent {
        trajectory_id: trajectory.id().to_string(),
        start_time: first.timestamp,
        end_time: last.timestamp,
        duration_secs,
        centroid_x: center.x,
        centroid_y: center.y,
        start_index: start,
        end_index: start + window.len() - 1,
    })
}

/// Detect every stop of one trajectory, in time order.
pub fn detect_stops(trajectory: &Trajectory, config: &StopConfig) -> Vec<StopEvent> {
    let points = trajectory.points();
    let mut events = Vec::new();
    let mut start = 0;

    for end in 1..points.len() {
        if window_holds(&points[start..=end], config) {
            continue;
        }
        events.extend(close_window(trajectory, start, &points[start..end], config));
        start = end;
    }
    events.extend(close_window(trajectory, start, &points[start..], config));
    events
}

/// Stops of every trajectory in the collection.
pub fn with_stopped(
    collection: &TrajectoryCollection,
    config: &StopConfig,
    options: &AnalysisOptions,
) -> Result<AnalysisResult> {
    stop_analysis("with_stopped", collection, config, None, options)
}

/// Stops whose centroid lies inside `rect` (boundary inclusive).
pub fn with_stop_in_rectangle(
    collection: &TrajectoryCollection,
    config: &StopConfig,
    rect: &Rectangle,
    options: &AnalysisOptions,
) -> Result<AnalysisResult> {
    stop_analysis("with_stop_in_rectangle", collection, config, Some(rect), options)
}

fn stop_analysis(
    name: &str,
    collection: &TrajectoryCollection,
    config: &StopConfig,
    rect: Option<&Rectangle>,
    options: &AnalysisOptions,
) -> Result<AnalysisResult> {
    config.validate()?;
    let trajectories = options.select(collection);

    let per_trajectory_events: Vec<Vec<StopEvent>> = per_trajectory(&trajectories, |t| {
        detect_stops(t, config)
            .into_iter()
            .filter(|e| rect.map_or(true, |r| r.contains(e.centroid())))
            .collect()
    });

    let mut result = AnalysisResult::new(name);
    if let Some(rect) = rect {
        result.push_zone(rect);
    }

    let mut stops_per_trajectory = BTreeMap::new();
    let mut centroids = Vec::new();
    let mut total_duration = 0.0;
    let mut event_count = 0;

    for (trajectory, events) in trajectories.iter().zip(&per_trajectory_events) {
        if events.is_empty() {
            continue;
        }
        result.push_path(options, trajectory, HighlightTag::Trajectory, trajectory.points());
        for event in events {
            result.push_path(
                options,
                trajectory,
                HighlightTag::Stop,
                &trajectory.points()[event.start_index..=event.end_index],
            );
            result.push_marker(
                options,
                trajectory.id(),
                HighlightTag::Stop,
                event.centroid(),
                Some(event.start_time),
            );
            centroids.push(SummaryValue::from(event.centroid()));
            total_duration += event.duration_secs;
        }
        event_count += events.len();
        stops_per_trajectory.insert(trajectory.id().to_string(), SummaryValue::from(events.len()));
    }

    debug!(
        "{}: {} stop events over {} trajectories",
        name,
        event_count,
        trajectories.len()
    );

    result.set("trajectory_count", trajectories.len());
    result.set("stopped_trajectories", stops_per_trajectory.len());
    result.set("stop_events", event_count);
    result.set("total_stop_duration_secs", total_duration);
    result.set("stops_per_trajectory", SummaryValue::Map(stops_per_trajectory));
    result.set("stop_centroids", SummaryValue::List(centroids));
    Ok(result)
}
