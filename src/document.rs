//! Persisted trajectory document shape.
//!
//! ```json
//! {
//!   "identifier": "17",
//!   "category": 2,
//!   "start_time": "2024-05-01T08:00:00.000000000",
//!   "end_time": "2024-05-01T08:00:12.500000000",
//!   "geometry": "LINESTRING (10 20, 11 21)",
//!   "background": "gate-cam",
//!   "points": [{ "timestamp": "2024-05-01T08:00:00.000000000", "geometry": "POINT (10 20)" }]
//! }
//! ```
//!
//! Timestamps are ISO-8601 strings without offset; the `time_format`
//! module keeps them fixed-width so the store can compare them as text.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::{wkt, Point, PointRecord, Result, Trajectory, TrajectoryError};

/// One point sub-document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointDocument {
    #[serde(with = "time_format")]
    pub timestamp: NaiveDateTime,
    /// `POINT (x y)` WKT.
    pub geometry: String,
}

/// One persisted trajectory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryDocument {
    pub identifier: String,
    pub category: i64,
    #[serde(with = "time_format")]
    pub start_time: NaiveDateTime,
    #[serde(with = "time_format")]
    pub end_time: NaiveDateTime,
    /// `LINESTRING` WKT through every point.
    pub geometry: String,
    /// Camera the trajectory was captured by.
    pub background: String,
    pub points: Vec<PointDocument>,
}

impl TrajectoryDocument {
    /// Serialize a trajectory for the store, tagged with its camera.
    pub fn from_trajectory(trajectory: &Trajectory, background: &str) -> Self {
        let coords: Vec<_> = trajectory.points().iter().map(Point::coord).collect();
        Self {
            identifier: trajectory.id().to_string(),
            category: trajectory.category(),
            start_time: trajectory.start_time(),
            end_time: trajectory.end_time(),
            geometry: wkt::linestring_wkt(&coords),
            background: background.to_string(),
            points: trajectory
                .points()
                .iter()
                .map(|p| PointDocument {
                    timestamp: p.timestamp,
                    geometry: wkt::point_wkt(p.coord()),
                })
                .collect(),
        }
    }

    /// Flatten the document back into point records.
    ///
    /// Fails with [`TrajectoryError::MalformedGeometry`] naming this document
    /// if any point geometry cannot be parsed.
    pub fn to_records(&self) -> Result<Vec<PointRecord>> {
        self.points
            .iter()
            .enumerate()
            .map(|(index, point)| {
                let c = wkt::parse_point(&point.geometry).map_err(|reason| {
                    TrajectoryError::MalformedGeometry {
                        document_id: self.identifier.clone(),
                        reason: format!("point {index}: {reason}"),
                    }
                })?;
                Ok(PointRecord::new(
                    self.identifier.clone(),
                    self.category,
                    point.timestamp,
                    c.x,
                    c.y,
                ))
            })
            .collect()
    }
}

/// Fixed-width ISO-8601 timestamps (nanosecond precision), so that text
/// comparison agrees with time comparison.
pub mod time_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.9f";

    pub fn to_string(value: &NaiveDateTime) -> String {
        value.format(FORMAT).to_string()
    }

    pub fn parse(text: &str) -> Result<NaiveDateTime, chrono::ParseError> {
        NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
    }

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&to_string(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse(&text).map_err(serde::de::Error::custom)
    }
}
