//! Trajectory building from unordered point records.
//!
//! Records are grouped by identifier, each group is stably sorted by
//! timestamp and turned into a [`Trajectory`]. Conflicting categories and
//! repeated timestamps inside a group are data-quality conditions: they are
//! either reported as warnings (best effort) or rejected, depending on
//! [`BuilderConfig::category_policy`].

use std::collections::HashMap;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{
    Point, PointRecord, Result, Trajectory, TrajectoryCollection, TrajectoryError,
};

/// What to do when points sharing an identifier disagree on the category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryPolicy {
    /// Keep the first category seen for the identifier and report a warning.
    #[default]
    FirstSeen,
    /// Fail the whole build with [`TrajectoryError::InconsistentCategory`].
    Reject,
}

/// Configuration for the trajectory builder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuilderConfig {
    /// Handling of conflicting categories within one identifier.
    /// Default: `FirstSeen`
    #[serde(default)]
    pub category_policy: CategoryPolicy,
}

/// Output of a build: the trajectories plus any data-quality warnings.
#[derive(Debug, Default)]
pub struct BuildOutcome {
    pub collection: TrajectoryCollection,
    /// `InconsistentCategory`, `DuplicateTimestamp` and `EmptyGroup`
    /// conditions that did not abort the build.
    pub warnings: Vec<TrajectoryError>,
}

/// Groups point records into trajectories.
#[derive(Debug, Clone, Default)]
pub struct TrajectoryBuilder {
    config: BuilderConfig,
}

/// Records of one identifier, in input order.
struct Group {
    category: i64,
    points: Vec<Point>,
}

impl TrajectoryBuilder {
    pub fn new(config: BuilderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Build a collection from records in any order.
    pub fn build(&self, records: impl IntoIterator<Item = PointRecord>) -> Result<BuildOutcome> {
        let mut warnings = Vec::new();
        let mut order: Vec<String> = Vec::new();
        let mut groups: HashMap<String, Group> = HashMap::new();

        for record in records {
            let point = record.point();
            match groups.get_mut(&record.identifier) {
                Some(group) => {
                    if group.category != record.category {
                        let err = TrajectoryError::InconsistentCategory {
                            identifier: record.identifier.clone(),
                            first: group.category,
                            conflicting: record.category,
                        };
                        if self.config.category_policy == CategoryPolicy::Reject {
                            return Err(err);
                        }
                        warn!("{}", err);
                        warnings.push(err);
                    }
                    group.points.push(point);
                }
                None => {
                    order.push(record.identifier.clone());
                    groups.insert(
                        record.identifier,
                        Group {
                            category: record.category,
                            points: vec![point],
                        },
                    );
                }
            }
        }

        let mut collection = TrajectoryCollection::new();
        for identifier in order {
            let Some(group) = groups.remove(&identifier) else {
                continue;
            };
            let (points, duplicates) = order_points(group.points);
            for timestamp in duplicates {
                let err = TrajectoryError::DuplicateTimestamp {
                    identifier: identifier.clone(),
                    timestamp,
                };
                warn!("{}", err);
                warnings.push(err);
            }
            match Trajectory::new(identifier, group.category, points) {
                Ok(trajectory) => collection.insert(trajectory),
                Err(err @ TrajectoryError::EmptyGroup { .. }) => {
                    warn!("{}", err);
                    warnings.push(err);
                }
                Err(err) => return Err(err),
            }
        }

        debug!(
            "Built {} trajectories ({} warnings)",
            collection.len(),
            warnings.len()
        );
        Ok(BuildOutcome {
            collection,
            warnings,
        })
    }
}

/// Build with the default configuration.
pub fn build(records: impl IntoIterator<Item = PointRecord>) -> Result<BuildOutcome> {
    TrajectoryBuilder::default().build(records)
}

/// Stable-sort points by timestamp and drop later points that repeat a
/// timestamp. Returns the kept points and the repeated timestamps.
fn order_points(mut points: Vec<Point>) -> (Vec<Point>, Vec<chrono::NaiveDateTime>) {
    points.sort_by_key(|p| p.timestamp);
    let mut duplicates = Vec::new();
    let mut kept: Vec<Point> = Vec::with_capacity(points.len());
    for point in points {
        match kept.last() {
            Some(last) if last.timestamp == point.timestamp => duplicates.push(point.timestamp),
            _ => kept.push(point),
        }
    }
    (kept, duplicates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeDelta};

    #[test]
    fn test_order_points_stable_on_ties() {
        let t0 = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let points = vec![
            Point::new(t0 + TimeDelta::seconds(2), 2.0, 0.0),
            Point::new(t0, 0.0, 0.0),
            Point::new(t0, 9.0, 9.0),
        ];
        let (kept, duplicates) = order_points(points);
        assert_eq!(kept.len(), 2);
        // The first point at t0 in input order wins.
        assert_eq!(kept[0].x, 0.0);
        assert_eq!(duplicates, vec![t0]);
    }
}
