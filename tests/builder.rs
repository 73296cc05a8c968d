//! Tests for trajectory building

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use trajscope::{
    build, BuilderConfig, CategoryPolicy, Point, PointRecord, Trajectory, TrajectoryBuilder,
    TrajectoryCollection, TrajectoryError,
};

fn at(secs: i64) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 1)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap()
        + TimeDelta::seconds(secs)
}

fn record(id: &str, category: i64, secs: i64, x: f64, y: f64) -> PointRecord {
    PointRecord::new(id, category, at(secs), x, y)
}

#[test]
fn test_groups_and_orders_points() {
    let records = vec![
        record("b", 2, 3, 3.0, 0.0),
        record("a", 1, 2, 2.0, 0.0),
        record("b", 2, 1, 1.0, 0.0),
        record("a", 1, 0, 0.0, 0.0),
        record("a", 1, 1, 1.0, 0.0),
    ];

    let outcome = build(records).unwrap();
    assert!(outcome.warnings.is_empty());
    assert_eq!(outcome.collection.len(), 2);

    let a = outcome.collection.get("a").unwrap();
    let times: Vec<_> = a.points().iter().map(|p| p.timestamp).collect();
    assert_eq!(times, vec![at(0), at(1), at(2)]);
    assert_eq!(a.category(), 1);

    let b = outcome.collection.get("b").unwrap();
    assert_eq!(b.start_time(), at(1));
    assert_eq!(b.end_time(), at(3));
}

#[test]
fn test_collection_iterates_in_identifier_order() {
    let records = vec![
        record("zeta", 1, 0, 0.0, 0.0),
        record("alpha", 1, 0, 0.0, 0.0),
        record("mid", 1, 0, 0.0, 0.0),
    ];
    let outcome = build(records).unwrap();
    let ids: Vec<&str> = outcome.collection.ids().collect();
    assert_eq!(ids, vec!["alpha", "mid", "zeta"]);
}

#[test]
fn test_empty_input_builds_empty_collection() {
    let outcome = build(Vec::new()).unwrap();
    assert!(outcome.collection.is_empty());
    assert!(outcome.warnings.is_empty());
}

#[test]
fn test_single_point_trajectory() {
    let outcome = build(vec![record("solo", 4, 0, 5.0, 5.0)]).unwrap();
    let solo = outcome.collection.get("solo").unwrap();
    assert_eq!(solo.len(), 1);
    assert_eq!(solo.duration_secs(), 0.0);
    assert_eq!(solo.path_length(), 0.0);
}

#[test]
fn test_inconsistent_category_keeps_first_seen() {
    // First in input order wins, not first in time.
    let records = vec![
        record("a", 1, 5, 0.0, 0.0),
        record("a", 2, 0, 1.0, 0.0),
    ];

    let outcome = build(records).unwrap();
    let a = outcome.collection.get("a").unwrap();
    assert_eq!(a.category(), 1);
    assert_eq!(a.len(), 2);
    assert_eq!(outcome.warnings.len(), 1);
    assert!(matches!(
        outcome.warnings[0],
        TrajectoryError::InconsistentCategory {
            first: 1,
            conflicting: 2,
            ..
        }
    ));
}

#[test]
fn test_inconsistent_category_rejected_by_policy() {
    let builder = TrajectoryBuilder::new(BuilderConfig {
        category_policy: CategoryPolicy::Reject,
    });
    let result = builder.build(vec![
        record("a", 1, 0, 0.0, 0.0),
        record("a", 3, 1, 1.0, 0.0),
    ]);
    assert!(matches!(
        result,
        Err(TrajectoryError::InconsistentCategory { .. })
    ));
}

#[test]
fn test_duplicate_timestamp_keeps_first_point() {
    let records = vec![
        record("a", 1, 0, 0.0, 0.0),
        record("a", 1, 1, 1.0, 0.0),
        record("a", 1, 1, 9.0, 9.0),
    ];

    let outcome = build(records).unwrap();
    let a = outcome.collection.get("a").unwrap();
    assert_eq!(a.len(), 2);
    assert_eq!(a.points()[1].x, 1.0);
    assert!(matches!(
        &outcome.warnings[..],
        [TrajectoryError::DuplicateTimestamp { identifier, .. }] if identifier == "a"
    ));
}

#[test]
fn test_timestamps_strictly_increase_after_build() {
    let records: Vec<PointRecord> = (0..50)
        .rev()
        .map(|i| record("a", 1, i % 20, i as f64, 0.0))
        .collect();
    let outcome = build(records).unwrap();
    let a = outcome.collection.get("a").unwrap();
    assert_eq!(a.len(), 20);
    assert!(a
        .points()
        .windows(2)
        .all(|pair| pair[0].timestamp < pair[1].timestamp));
}

#[test]
fn test_trajectory_rejects_unordered_points() {
    let points = vec![Point::new(at(1), 0.0, 0.0), Point::new(at(0), 1.0, 0.0)];
    assert!(matches!(
        Trajectory::new("a", 1, points),
        Err(TrajectoryError::Validation { .. })
    ));
    assert!(matches!(
        Trajectory::new("a", 1, Vec::new()),
        Err(TrajectoryError::EmptyGroup { .. })
    ));
}

#[test]
fn test_collection_rejects_duplicate_identifiers() {
    let t = Trajectory::new("a", 1, vec![Point::new(at(0), 0.0, 0.0)]).unwrap();
    let result = TrajectoryCollection::from_trajectories(vec![t.clone(), t]);
    assert!(result.is_err());
}

#[test]
fn test_category_counts_and_filter() {
    let outcome = build(vec![
        record("a", 1, 0, 0.0, 0.0),
        record("b", 2, 0, 0.0, 0.0),
        record("c", 2, 0, 0.0, 0.0),
    ])
    .unwrap();
    let counts = outcome.collection.category_counts();
    assert_eq!(counts.get(&1), Some(&1));
    assert_eq!(counts.get(&2), Some(&2));

    let twos = outcome.collection.filter(|t| t.category() == 2);
    assert_eq!(twos.ids().collect::<Vec<_>>(), vec!["b", "c"]);
}
