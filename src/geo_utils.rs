//! Planar geometry and time helpers shared by the builder and the analyses.
//!
//! All coordinates are planar (pixels or a projected system), so distances
//! are plain Euclidean distances.

use chrono::{NaiveDateTime, TimeDelta};
use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo::kernels::{Kernel, Orientation};
use geo::{
    Centroid, Coord, EuclideanDistance, EuclideanLength, GeoNum, Line, LineString, MultiPoint,
};
use serde::{Deserialize, Serialize};

use crate::{wkt, Bounds, Point, Result, TrajectoryError};

/// Convert a time delta into fractional seconds.
pub fn seconds(delta: TimeDelta) -> f64 {
    delta.num_seconds() as f64 + f64::from(delta.subsec_nanos()) * 1e-9
}

/// Seconds elapsed from `from` to `to` (negative if `to` is earlier).
pub fn seconds_between(from: NaiveDateTime, to: NaiveDateTime) -> f64 {
    seconds(to - from)
}

/// Euclidean distance between two coordinates.
pub fn distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    geo::Point::from(a).euclidean_distance(&geo::Point::from(b))
}

/// Total length of the polyline through `points`.
pub fn path_length(points: &[Point]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    LineString::new(points.iter().map(Point::coord).collect()).euclidean_length()
}

/// Centroid of a set of points. `None` for an empty slice.
pub fn centroid(points: &[Point]) -> Option<Coord<f64>> {
    let multi: MultiPoint<f64> = points
        .iter()
        .map(|p| geo::Point::from(p.coord()))
        .collect::<Vec<_>>()
        .into();
    multi.centroid().map(|p| p.0)
}

/// Average of the instantaneous speeds between consecutive points.
///
/// A single point has speed zero. Consecutive points sharing a timestamp
/// contribute an infinite speed unless they are also at the same position.
pub fn mean_speed(points: &[Point]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    let total: f64 = points
        .windows(2)
        .map(|pair| {
            let dist = distance(pair[0].coord(), pair[1].coord());
            let dt = seconds_between(pair[0].timestamp, pair[1].timestamp);
            if dt > 0.0 {
                dist / dt
            } else if dist == 0.0 {
                0.0
            } else {
                f64::INFINITY
            }
        })
        .sum();
    total / (points.len() - 1) as f64
}

/// Timestamp at `fraction` of the way from `a` to `b`.
pub fn interpolate_time(a: &Point, b: &Point, fraction: f64) -> NaiveDateTime {
    let span = seconds_between(a.timestamp, b.timestamp);
    let offset = (span * fraction.clamp(0.0, 1.0) * 1e6).round() as i64;
    a.timestamp + TimeDelta::microseconds(offset)
}

/// Which side of the infinite line through `c -> d` the coordinate `p`
/// lies on. `None` when `p` is exactly on that line.
fn side_of(c: Coord<f64>, d: Coord<f64>, p: Coord<f64>) -> Option<Orientation> {
    match <f64 as GeoNum>::Ker::orient2d(c, d, p) {
        Orientation::Collinear => None,
        strict => Some(strict),
    }
}

/// Whether `p`, already known to be on the line through `c -> d`, lies
/// within the segment itself.
fn within_segment(c: Coord<f64>, d: Coord<f64>, p: Coord<f64>) -> bool {
    p.x >= c.x.min(d.x) && p.x <= c.x.max(d.x) && p.y >= c.y.min(d.y) && p.y <= c.y.max(d.y)
}

/// Intersection of the movement `a -> b` with the line segment `c -> d`,
/// if `a` and `b` lie strictly on opposite sides of it.
///
/// Movements that start or end on the line return `None`; whole paths
/// through a vertex on the line are handled by [`Polyline::path_crossings`].
pub fn segment_crossing(
    a: Coord<f64>,
    b: Coord<f64>,
    c: Coord<f64>,
    d: Coord<f64>,
) -> Option<Coord<f64>> {
    match (side_of(c, d, a), side_of(c, d, b)) {
        (Some(from), Some(to)) if from != to => {}
        _ => return None,
    }
    match line_intersection(Line::new(a, b), Line::new(c, d))? {
        LineIntersection::SinglePoint { intersection, .. } => Some(intersection),
        LineIntersection::Collinear { .. } => None,
    }
}

/// An ordered polyline with at least two points and non-zero length,
/// used as a reference, departure or arrival line.
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    coords: Vec<Coord<f64>>,
}

impl Polyline {
    /// Validate a reference polyline. `what` names it in errors.
    pub fn new(what: &'static str, coords: Vec<Coord<f64>>) -> Result<Self> {
        if coords.len() < 2 {
            return Err(TrajectoryError::invalid_geometry(
                what,
                format!("needs at least 2 points, got {}", coords.len()),
            ));
        }
        if coords.iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
            return Err(TrajectoryError::invalid_geometry(
                what,
                "coordinates must be finite",
            ));
        }
        let line = Self { coords };
        if line.length() <= 0.0 {
            return Err(TrajectoryError::invalid_geometry(what, "zero-length line"));
        }
        Ok(line)
    }

    /// Parse and validate a `LINESTRING` WKT.
    pub fn from_wkt(what: &'static str, text: &str) -> Result<Self> {
        let coords = wkt::parse_linestring(text)
            .map_err(|reason| TrajectoryError::invalid_geometry(what, reason))?;
        Self::new(what, coords)
    }

    pub fn coords(&self) -> &[Coord<f64>] {
        &self.coords
    }

    pub fn length(&self) -> f64 {
        LineString::new(self.coords.clone()).euclidean_length()
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::from_coords(self.coords.iter().copied()).unwrap_or(Bounds {
            min_x: 0.0,
            max_x: 0.0,
            min_y: 0.0,
            max_y: 0.0,
        })
    }

    /// Every crossing of `path` through this polyline, ordered along the path.
    ///
    /// For each line segment the path's side is tracked over its vertices,
    /// skipping vertices exactly on the line. A crossing is reported only
    /// when the side actually changes, so touching the line and turning
    /// back is never a crossing, from either side. A vertex resting on the
    /// line between the two sides is the crossing point. A crossing through
    /// a shared vertex of two line segments is reported once.
    pub fn path_crossings(&self, path: &[Coord<f64>]) -> Vec<LineCrossing> {
        let mut found: Vec<LineCrossing> = Vec::new();
        for (line_index, pair) in self.coords.windows(2).enumerate() {
            let (c, d) = (pair[0], pair[1]);
            let mut last: Option<(usize, Orientation)> = None;
            for (i, &p) in path.iter().enumerate() {
                let Some(side) = side_of(c, d, p) else {
                    continue;
                };
                if let Some((j, previous)) = last {
                    if previous != side {
                        if let Some(hit) = self.side_change(line_index, path, j, i, previous) {
                            let duplicate = found.iter().any(|f| {
                                f.segment_index == hit.segment_index && distance(f.at, hit.at) < 1e-9
                            });
                            if !duplicate {
                                found.push(hit);
                            }
                        }
                    }
                }
                last = Some((i, side));
            }
        }
        found.sort_by(|x, y| {
            x.segment_index
                .cmp(&y.segment_index)
                .then(x.movement_fraction.total_cmp(&y.movement_fraction))
        });
        found
    }

    /// Locate where `path` left side `from` at vertex `j` and arrived on the
    /// other side at vertex `i`, relative to line segment `line_index`.
    fn side_change(
        &self,
        line_index: usize,
        path: &[Coord<f64>],
        j: usize,
        i: usize,
        from: Orientation,
    ) -> Option<LineCrossing> {
        let (c, d) = (self.coords[line_index], self.coords[line_index + 1]);
        let (segment_index, movement_fraction, at) = if i == j + 1 {
            let (a, b) = (path[j], path[i]);
            let at = segment_crossing(a, b, c, d)?;
            let segment_len = distance(a, b);
            let fraction = if segment_len > 0.0 {
                distance(a, at) / segment_len
            } else {
                0.0
            };
            (j, fraction, at)
        } else {
            // Vertices j+1..i are all on the line; the first one inside the
            // segment is where the path passed through.
            let k = (j + 1..i).find(|&k| within_segment(c, d, path[k]))?;
            (k - 1, 1.0, path[k])
        };
        Some(LineCrossing {
            at,
            segment_index,
            movement_fraction,
            position: self.position_on_segment(line_index, at),
            direction: match from {
                Orientation::CounterClockwise => CrossingDirection::LeftToRight,
                _ => CrossingDirection::RightToLeft,
            },
        })
    }

    /// Arc length from the start of the polyline to `at`, which lies on
    /// segment `index`.
    fn position_on_segment(&self, index: usize, at: Coord<f64>) -> f64 {
        let before: f64 = self.coords[..=index]
            .windows(2)
            .map(|pair| distance(pair[0], pair[1]))
            .sum();
        before + distance(self.coords[index], at)
    }
}

/// Which way an object moved through a line, relative to the line's
/// own direction (first point towards last point).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossingDirection {
    LeftToRight,
    RightToLeft,
}

/// Where and how a movement crossed a polyline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineCrossing {
    /// Intersection coordinate.
    pub at: Coord<f64>,
    /// Index of the path segment (vertices `i` and `i + 1`) holding the crossing.
    pub segment_index: usize,
    /// Fraction of that path segment travelled before the crossing.
    pub movement_fraction: f64,
    /// Distance along the polyline from its first point.
    pub position: f64,
    pub direction: CrossingDirection,
}

/// Axis-aligned rectangle `[min_x, max_x] x [min_y, max_y]` with positive area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Rectangle {
    /// Validate a rectangle. Inverted or zero-area rectangles are rejected.
    pub fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Result<Self> {
        if ![min_x, max_x, min_y, max_y].iter().all(|v| v.is_finite()) {
            return Err(TrajectoryError::invalid_geometry(
                "rectangle",
                "bounds must be finite",
            ));
        }
        if min_x >= max_x || min_y >= max_y {
            return Err(TrajectoryError::invalid_geometry(
                "rectangle",
                format!("[{min_x}, {max_x}] x [{min_y}, {max_y}] is inverted or has zero area"),
            ));
        }
        Ok(Self {
            min_x,
            max_x,
            min_y,
            max_y,
        })
    }

    /// Boundary-inclusive containment test.
    pub fn contains(&self, c: Coord<f64>) -> bool {
        c.x >= self.min_x && c.x <= self.max_x && c.y >= self.min_y && c.y <= self.max_y
    }

    pub fn bounds(&self) -> Bounds {
        Bounds {
            min_x: self.min_x,
            max_x: self.max_x,
            min_y: self.min_y,
            max_y: self.max_y,
        }
    }

    /// Closed ring of the rectangle, counter-clockwise from the lower-left corner.
    pub fn ring(&self) -> Vec<Coord<f64>> {
        vec![
            Coord { x: self.min_x, y: self.min_y },
            Coord { x: self.max_x, y: self.min_y },
            Coord { x: self.max_x, y: self.max_y },
            Coord { x: self.min_x, y: self.max_y },
            Coord { x: self.min_x, y: self.min_y },
        ]
    }
}
