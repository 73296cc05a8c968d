//! Tests for stop detection

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use trajscope::analysis::{
    detect_stops, with_stop_in_rectangle, with_stopped, AnalysisOptions, Rectangle, StopConfig,
};
use trajscope::{build, Point, PointRecord, SummaryValue, Trajectory, TrajectoryCollection, TrajectoryError};

fn at(secs: f64) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 1)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap()
        + TimeDelta::milliseconds((secs * 1000.0) as i64)
}

fn trajectory(id: &str, samples: &[(f64, f64, f64)]) -> Trajectory {
    let points = samples.iter().map(|&(t, x, y)| Point::new(at(t), x, y)).collect();
    Trajectory::new(id, 1, points).unwrap()
}

fn collection(trajectories: Vec<Trajectory>) -> TrajectoryCollection {
    TrajectoryCollection::from_trajectories(trajectories).unwrap()
}

/// Moving at 10 units/s, halting at (50, 0) from t=5 to t=15, moving again.
fn halting() -> Trajectory {
    let mut samples: Vec<(f64, f64, f64)> = (0..5).map(|i| (i as f64, i as f64 * 10.0, 0.0)).collect();
    samples.extend((5..=15).map(|i| (i as f64, 50.0 + 0.1 * (i % 2) as f64, 0.0)));
    samples.extend((16..20).map(|i| (i as f64, 50.0 + (i - 15) as f64 * 10.0, 0.0)));
    trajectory("halting", &samples)
}

#[test]
fn test_small_cluster_example() {
    let records = vec![
        PointRecord::new("a", 1, at(0.0), 0.0, 0.0),
        PointRecord::new("a", 1, at(1.0), 0.1, 0.0),
        PointRecord::new("a", 1, at(5.0), 0.1, 0.05),
    ];
    let collection = build(records).unwrap().collection;
    let config = StopConfig {
        stop_threshold: 1.0,
        min_duration: 4.0,
        noise_tolerance: 0.2,
    };

    let events = detect_stops(collection.get("a").unwrap(), &config);
    assert_eq!(events.len(), 1);
    let stop = &events[0];
    assert_eq!(stop.start_time, at(0.0));
    assert_eq!(stop.end_time, at(5.0));
    assert!((stop.centroid_x - 0.0667).abs() < 1e-3);
    assert!((stop.centroid_y - 0.0167).abs() < 1e-3);
    assert_eq!(stop.point_count(), 3);
}

#[test]
fn test_halt_inside_movement() {
    let config = StopConfig {
        stop_threshold: 1.0,
        min_duration: 5.0,
        noise_tolerance: 1.0,
    };
    let events = detect_stops(&halting(), &config);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].start_index, 5);
    assert_eq!(events[0].end_index, 15);
    assert!((events[0].duration_secs - 10.0).abs() < 1e-9);
    assert!((events[0].centroid_x - 50.0).abs() < 0.1);
}

#[test]
fn test_short_halt_below_min_duration() {
    let config = StopConfig {
        stop_threshold: 1.0,
        min_duration: 30.0,
        noise_tolerance: 1.0,
    };
    assert!(detect_stops(&halting(), &config).is_empty());
}

#[test]
fn test_constant_motion_has_no_stop() {
    let samples: Vec<_> = (0..30).map(|i| (i as f64, i as f64 * 2.0, 0.0)).collect();
    let moving = trajectory("moving", &samples);
    assert!(detect_stops(&moving, &StopConfig::default()).is_empty());
}

#[test]
fn test_single_point_is_never_a_stop() {
    let solo = trajectory("solo", &[(0.0, 1.0, 1.0)]);
    let config = StopConfig {
        min_duration: 0.0,
        ..StopConfig::default()
    };
    assert!(detect_stops(&solo, &config).is_empty());
}

#[test]
fn test_slow_drift_splits_at_radius() {
    // 0.5 units/s for 40 s: slow enough, but the radius bound closes the
    // window whenever the run grows past ~4 units.
    let samples: Vec<_> = (0..=40).map(|i| (i as f64, i as f64 * 0.5, 0.0)).collect();
    let drifting = trajectory("drift", &samples);
    let config = StopConfig {
        stop_threshold: 1.0,
        min_duration: 5.0,
        noise_tolerance: 2.0,
    };

    let events = detect_stops(&drifting, &config);
    assert!(events.len() >= 2);
    for pair in events.windows(2) {
        assert!(pair[0].end_index < pair[1].start_index);
    }
    for event in &events {
        let c = event.centroid();
        for p in &drifting.points()[event.start_index..=event.end_index] {
            assert!(((p.x - c.x).powi(2) + (p.y - c.y).powi(2)).sqrt() <= 2.0 + 1e-9);
        }
    }
}

#[test]
fn test_with_stopped_summary() {
    let moving = trajectory("moving", &(0..10).map(|i| (i as f64, i as f64 * 5.0, 9.0)).collect::<Vec<_>>());
    let collection = collection(vec![halting(), moving]);
    let config = StopConfig {
        stop_threshold: 1.0,
        min_duration: 5.0,
        noise_tolerance: 1.0,
    };

    let result = with_stopped(&collection, &config, &AnalysisOptions::default()).unwrap();
    assert_eq!(result.count("trajectory_count"), Some(2));
    assert_eq!(result.count("stopped_trajectories"), Some(1));
    assert_eq!(result.count("stop_events"), Some(1));
    assert!((result.number("total_stop_duration_secs").unwrap() - 10.0).abs() < 1e-9);
    match result.get("stops_per_trajectory") {
        Some(SummaryValue::Map(map)) => {
            assert_eq!(map.get("halting"), Some(&SummaryValue::Count(1)));
            assert!(!map.contains_key("moving"));
        }
        other => panic!("unexpected {other:?}"),
    }
    match result.get("stop_centroids") {
        Some(SummaryValue::List(list)) => assert_eq!(list.len(), 1),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_stop_in_rectangle_filters_by_centroid() {
    let collection = collection(vec![halting()]);
    let config = StopConfig {
        stop_threshold: 1.0,
        min_duration: 5.0,
        noise_tolerance: 1.0,
    };
    let options = AnalysisOptions::default();

    let around = Rectangle::new(40.0, 60.0, -5.0, 5.0).unwrap();
    let result = with_stop_in_rectangle(&collection, &config, &around, &options).unwrap();
    assert_eq!(result.count("stop_events"), Some(1));

    let elsewhere = Rectangle::new(0.0, 20.0, -5.0, 5.0).unwrap();
    let result = with_stop_in_rectangle(&collection, &config, &elsewhere, &options).unwrap();
    assert_eq!(result.count("stop_events"), Some(0));
    assert_eq!(result.count("stopped_trajectories"), Some(0));
}

#[test]
fn test_invalid_config_rejected() {
    let collection = collection(vec![halting()]);
    for config in [
        StopConfig { stop_threshold: -1.0, ..StopConfig::default() },
        StopConfig { min_duration: f64::NAN, ..StopConfig::default() },
        StopConfig { noise_tolerance: 0.0, ..StopConfig::default() },
    ] {
        assert!(matches!(
            with_stopped(&collection, &config, &AnalysisOptions::default()),
            Err(TrajectoryError::Validation { .. })
        ));
    }
}

#[test]
fn test_empty_collection_yields_zero_counts() {
    let result = with_stopped(
        &TrajectoryCollection::new(),
        &StopConfig::default(),
        &AnalysisOptions::default(),
    )
    .unwrap();
    assert_eq!(result.count("stop_events"), Some(0));
    assert_eq!(result.count("trajectory_count"), Some(0));
}

#[test]
fn test_repeated_runs_are_identical() {
    let collection = collection(vec![halting()]);
    let config = StopConfig::default();
    let options = AnalysisOptions::default();
    let first = with_stopped(&collection, &config, &options).unwrap();
    let second = with_stopped(&collection, &config, &options).unwrap();
    assert_eq!(first, second);
}
