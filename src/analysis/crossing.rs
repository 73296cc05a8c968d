//! Reference-line analyses.
//!
//! A crossing is a change of side of the trajectory relative to a line,
//! where the path actually meets the line. Points exactly on the line
//! belong to neither side, so grazing the line is not a crossing.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use geo::Coord;
use log::debug;
use serde::Serialize;

use super::{
    candidates, mean, median, per_trajectory, AnalysisOptions, AnalysisResult, CrossingDirection,
    HighlightTag, Polyline, SummaryValue,
};
use crate::geo_utils::{interpolate_time, seconds_between};
use crate::{Bounds, Trajectory, TrajectoryCollection};

/// One crossing of a trajectory through a polyline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Crossing {
    pub trajectory_id: String,
    /// Index of the trajectory segment (points `i` and `i + 1`).
    pub segment_index: usize,
    /// How far along that segment the crossing happened, in `[0, 1]`.
    pub movement_fraction: f64,
    pub x: f64,
    pub y: f64,
    /// Interpolated time of the crossing.
    pub timestamp: NaiveDateTime,
    /// Distance along the polyline from its first point.
    pub position: f64,
    pub direction: CrossingDirection,
}

impl Crossing {
    pub fn coord(&self) -> Coord<f64> {
        Coord {
            x: self.x,
            y: self.y,
        }
    }

    /// Order along the trajectory.
    fn cmp_along(&self, other: &Crossing) -> Ordering {
        self.segment_index
            .cmp(&other.segment_index)
            .then(self.movement_fraction.total_cmp(&other.movement_fraction))
    }
}

/// Every crossing of `trajectory` through `line`, in trajectory order.
pub fn line_crossings(trajectory: &Trajectory, line: &Polyline) -> Vec<Crossing> {
    let points = trajectory.points();
    let path: Vec<Coord<f64>> = points.iter().map(|p| p.coord()).collect();
    line.path_crossings(&path)
        .into_iter()
        .map(|hit| {
            let a = &points[hit.segment_index];
            let b = &points[hit.segment_index + 1];
            Crossing {
                trajectory_id: trajectory.id().to_string(),
                segment_index: hit.segment_index,
                movement_fraction: hit.movement_fraction,
                x: hit.at.x,
                y: hit.at.y,
                timestamp: interpolate_time(a, b, hit.movement_fraction),
                position: hit.position,
                direction: hit.direction,
            }
        })
        .collect()
}

/// Crossings of a single reference line.
///
/// Summary keys: `trajectory_count`, `crossing_trajectories`,
/// `crossing_count`, `mean_crossing_position`, `left_to_right`,
/// `right_to_left`.
pub fn with_limits(
    collection: &TrajectoryCollection,
    line: &Polyline,
    options: &AnalysisOptions,
) -> AnalysisResult {
    let selected = options.select(collection).len();
    let trajectories = candidates(collection, options, &line.bounds());
    let per_trajectory_crossings = per_trajectory(&trajectories, |t| line_crossings(t, line));

    let mut result = AnalysisResult::new("with_limits");
    result.push_line(HighlightTag::ReferenceLine, line);

    let mut positions = Vec::new();
    let mut crossing_trajectories = 0usize;
    let mut left_to_right = 0usize;
    let mut right_to_left = 0usize;

    for (trajectory, crossings) in trajectories.iter().zip(&per_trajectory_crossings) {
        if crossings.is_empty() {
            continue;
        }
        crossing_trajectories += 1;
        result.push_path(options, trajectory, HighlightTag::Crossing, trajectory.points());
        for crossing in crossings {
            positions.push(crossing.position);
            match crossing.direction {
                CrossingDirection::LeftToRight => left_to_right += 1,
                CrossingDirection::RightToLeft => right_to_left += 1,
            }
            result.push_marker(
                options,
                trajectory.id(),
                HighlightTag::Crossing,
                crossing.coord(),
                Some(crossing.timestamp),
            );
        }
    }

    debug!(
        "with_limits: {} of {} trajectories cross the line",
        crossing_trajectories, selected
    );

    result.set("trajectory_count", selected);
    result.set("crossing_trajectories", crossing_trajectories);
    result.set("crossing_count", positions.len());
    result.set("mean_crossing_position", mean(&positions));
    result.set("left_to_right", left_to_right);
    result.set("right_to_left", right_to_left);
    result
}

/// How one trajectory relates to a departure/arrival pair.
#[derive(Debug, Clone, PartialEq)]
enum Passage {
    Complete {
        departure: Crossing,
        arrival: Crossing,
    },
    /// Crossed at least one line but never departure followed by arrival.
    Partial(Vec<Crossing>),
    Untouched,
}

fn passage(trajectory: &Trajectory, departure: &Polyline, arrival: &Polyline) -> Passage {
    let departures = line_crossings(trajectory, departure);
    let arrivals = line_crossings(trajectory, arrival);

    if let Some(first) = departures.first() {
        if let Some(next) = arrivals
            .iter()
            .find(|a| a.cmp_along(first) == Ordering::Greater)
        {
            return Passage::Complete {
                departure: first.clone(),
                arrival: next.clone(),
            };
        }
    }

    let mut touched: Vec<Crossing> = departures.into_iter().chain(arrivals).collect();
    if touched.is_empty() {
        Passage::Untouched
    } else {
        touched.sort_by(|a, b| a.cmp_along(b));
        Passage::Partial(touched)
    }
}

/// Timing between the first departure-line crossing and the first arrival
/// crossing after it.
///
/// Trajectories that never complete the pair are tagged `partial` and left
/// out of the timing statistics.
///
/// Summary keys: `trajectory_count`, `completed`, `partial`,
/// `mean_elapsed_secs`, `median_elapsed_secs`, `elapsed_per_trajectory`.
pub fn with_start_finish(
    collection: &TrajectoryCollection,
    departure: &Polyline,
    arrival: &Polyline,
    options: &AnalysisOptions,
) -> AnalysisResult {
    let selected = options.select(collection).len();
    let (dep, arr) = (departure.bounds(), arrival.bounds());
    let envelope = Bounds {
        min_x: dep.min_x.min(arr.min_x),
        max_x: dep.max_x.max(arr.max_x),
        min_y: dep.min_y.min(arr.min_y),
        max_y: dep.max_y.max(arr.max_y),
    };
    let trajectories = candidates(collection, options, &envelope);
    let passages = per_trajectory(&trajectories, |t| passage(t, departure, arrival));

    let mut result = AnalysisResult::new("with_start_finish");
    result.push_line(HighlightTag::DepartureLine, departure);
    result.push_line(HighlightTag::ArrivalLine, arrival);

    let mut elapsed = Vec::new();
    let mut elapsed_per_trajectory = BTreeMap::new();
    let mut partial = 0usize;

    for (trajectory, passage) in trajectories.iter().zip(passages) {
        match passage {
            Passage::Complete { departure, arrival } => {
                let secs = seconds_between(departure.timestamp, arrival.timestamp);
                elapsed.push(secs);
                elapsed_per_trajectory.insert(trajectory.id().to_string(), SummaryValue::from(secs));
                result.push_path(options, trajectory, HighlightTag::Complete, trajectory.points());
                for crossing in [departure, arrival] {
                    result.push_marker(
                        options,
                        trajectory.id(),
                        HighlightTag::Complete,
                        crossing.coord(),
                        Some(crossing.timestamp),
                    );
                }
            }
            Passage::Partial(crossings) => {
                partial += 1;
                result.push_path(options, trajectory, HighlightTag::Partial, trajectory.points());
                for crossing in crossings {
                    result.push_marker(
                        options,
                        trajectory.id(),
                        HighlightTag::Partial,
                        crossing.coord(),
                        Some(crossing.timestamp),
                    );
                }
            }
            Passage::Untouched => {}
        }
    }

    debug!(
        "with_start_finish: {} complete, {} partial of {} trajectories",
        elapsed.len(),
        partial,
        selected
    );

    result.set("trajectory_count", selected);
    result.set("completed", elapsed.len());
    result.set("partial", partial);
    result.set("mean_elapsed_secs", mean(&elapsed));
    result.set("median_elapsed_secs", median(&elapsed));
    result.set("elapsed_per_trajectory", SummaryValue::Map(elapsed_per_trajectory));
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Point;
    use chrono::{NaiveDate, TimeDelta};

    fn trajectory(id: &str, coords: &[(f64, f64)]) -> Trajectory {
        let t0 = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let points = coords
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| Point::new(t0 + TimeDelta::seconds(i as i64), x, y))
            .collect();
        Trajectory::new(id, 1, points).unwrap()
    }

    fn vertical(x: f64) -> Polyline {
        Polyline::new(
            "line",
            vec![Coord { x, y: -10.0 }, Coord { x, y: 10.0 }],
        )
        .unwrap()
    }

    #[test]
    fn test_crossing_time_is_interpolated() {
        let t = trajectory("a", &[(0.0, 0.0), (4.0, 0.0)]);
        let crossings = line_crossings(&t, &vertical(1.0));
        assert_eq!(crossings.len(), 1);
        assert_eq!(crossings[0].timestamp, t.start_time() + TimeDelta::milliseconds(250));
        assert!((crossings[0].position - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_direction_follows_line_orientation() {
        // Line points up (+y); its left side is -x.
        let rightwards = trajectory("a", &[(-1.0, 0.0), (1.0, 0.0)]);
        let leftwards = trajectory("b", &[(1.0, 0.0), (-1.0, 0.0)]);
        let line = vertical(0.0);
        assert_eq!(
            line_crossings(&rightwards, &line)[0].direction,
            CrossingDirection::LeftToRight
        );
        assert_eq!(
            line_crossings(&leftwards, &line)[0].direction,
            CrossingDirection::RightToLeft
        );
    }

    #[test]
    fn test_arrival_before_departure_is_partial() {
        let t = trajectory("a", &[(3.0, 0.0), (1.0, 0.0), (-1.0, 0.0)]);
        // Arrival at x=2 is crossed first, departure at x=0 second.
        match passage(&t, &vertical(0.0), &vertical(2.0)) {
            Passage::Partial(crossings) => assert_eq!(crossings.len(), 2),
            other => panic!("expected partial, got {other:?}"),
        }
    }
}
