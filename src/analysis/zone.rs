//! Dwell inside a monitored rectangular zone.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use log::debug;
use serde::Serialize;

use super::{
    candidates, mean, per_trajectory, AnalysisOptions, AnalysisResult, HighlightTag, Rectangle,
    SummaryValue,
};
use crate::geo_utils::seconds_between;
use crate::{Trajectory, TrajectoryCollection};

/// A maximal run of consecutive points inside the zone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DwellInterval {
    pub trajectory_id: String,
    /// Timestamp of the first point inside.
    pub entry_time: NaiveDateTime,
    /// Timestamp of the last point inside.
    pub exit_time: NaiveDateTime,
    pub dwell_secs: f64,
    pub start_index: usize,
    /// Inclusive.
    pub end_index: usize,
}

impl DwellInterval {
    pub fn point_count(&self) -> usize {
        self.end_index - self.start_index + 1
    }
}

/// Every dwell interval of `trajectory` inside `rect`, boundary inclusive.
/// A single point inside counts as a visit of zero duration.
pub fn dwell_intervals(trajectory: &Trajectory, rect: &Rectangle) -> Vec<DwellInterval> {
    let points = trajectory.points();
    let mut intervals = Vec::new();
    let mut open: Option<usize> = None;

    let close = |start: usize, end: usize, intervals: &mut Vec<DwellInterval>| {
        let (entry, exit) = (points[start].timestamp, points[end].timestamp);
        intervals.push(DwellInterval {
            trajectory_id: trajectory.id().to_string(),
            entry_time: entry,
            exit_time: exit,
            dwell_secs: seconds_between(entry, exit),
            start_index: start,
            end_index: end,
        });
    };

    for (i, point) in points.iter().enumerate() {
        match (rect.contains(point.coord()), open) {
            (true, None) => open = Some(i),
            (false, Some(start)) => {
                close(start, i - 1, &mut intervals);
                open = None;
            }
            _ => {}
        }
    }
    if let Some(start) = open {
        close(start, points.len() - 1, &mut intervals);
    }
    intervals
}

/// Dwell statistics for one monitored zone.
///
/// Summary keys: `trajectory_count`, `trajectories_entering`, `visit_count`,
/// `total_dwell_secs`, `mean_dwell_secs`, `dwell_per_trajectory`.
pub fn in_monitored_area(
    collection: &TrajectoryCollection,
    rect: &Rectangle,
    options: &AnalysisOptions,
) -> AnalysisResult {
    let selected = options.select(collection).len();
    let trajectories = candidates(collection, options, &rect.bounds());
    let per_trajectory_dwell = per_trajectory(&trajectories, |t| dwell_intervals(t, rect));

    let mut result = AnalysisResult::new("in_monitored_area");
    result.push_zone(rect);

    let mut dwell_per_trajectory = BTreeMap::new();
    let mut visits = Vec::new();

    for (trajectory, intervals) in trajectories.iter().zip(&per_trajectory_dwell) {
        if intervals.is_empty() {
            continue;
        }
        let mut total = 0.0;
        for interval in intervals {
            result.push_path(
                options,
                trajectory,
                HighlightTag::Dwell,
                &trajectory.points()[interval.start_index..=interval.end_index],
            );
            total += interval.dwell_secs;
            visits.push(interval.dwell_secs);
        }
        dwell_per_trajectory.insert(trajectory.id().to_string(), SummaryValue::from(total));
    }

    debug!(
        "in_monitored_area: {} visits by {} trajectories",
        visits.len(),
        dwell_per_trajectory.len()
    );

    result.set("trajectory_count", selected);
    result.set("trajectories_entering", dwell_per_trajectory.len());
    result.set("visit_count", visits.len());
    result.set("total_dwell_secs", visits.iter().sum::<f64>());
    result.set("mean_dwell_secs", mean(&visits));
    result.set("dwell_per_trajectory", SummaryValue::Map(dwell_per_trajectory));
    result
}
