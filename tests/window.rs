//! Tests for query window translation

use chrono::{NaiveDate, NaiveDateTime};
use trajscope::window::hour_minute;
use trajscope::{window, ErrorKind, QueryWindow, TrajectoryError};

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
}

fn hm(h: u32, m: u32) -> NaiveDateTime {
    date().and_hms_opt(h, m, 0).unwrap()
}

#[test]
fn test_fractional_hours() {
    let w = window(date(), 10.5, 11.25).unwrap();
    assert_eq!(w.from, hm(10, 30));
    assert_eq!(w.to, hm(11, 15));
}

#[test]
fn test_minutes_are_truncated() {
    // 10.99 h = 10 h 59.4 min
    let w = window(date(), 9.0, 10.99).unwrap();
    assert_eq!(w.to, hm(10, 59));
    assert_eq!(hour_minute(7.999), (7, 59));
}

#[test]
fn test_full_day() {
    let w = window(date(), 0.0, 24.0).unwrap();
    assert_eq!(w.from, hm(0, 0));
    assert_eq!(
        w.to,
        NaiveDate::from_ymd_opt(2024, 5, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    );
}

#[test]
fn test_reversed_range_rejected() {
    let err = window(date(), 22.0, 2.0).unwrap_err();
    assert!(matches!(err, TrajectoryError::InvalidRange { .. }));
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn test_range_collapsing_to_same_minute_rejected() {
    // Both ends truncate to 10:00.
    assert!(matches!(
        window(date(), 10.0, 10.01),
        Err(TrajectoryError::InvalidRange { .. })
    ));
}

#[test]
fn test_hours_out_of_range() {
    for (start, end) in [(-1.0, 5.0), (24.0, 24.0), (1.0, 24.5), (0.0, 0.0), (f64::NAN, 3.0)] {
        assert!(
            matches!(
                window(date(), start, end),
                Err(TrajectoryError::InvalidHour { .. })
            ),
            "start={start} end={end}"
        );
    }
}

#[test]
fn test_overlap_is_inclusive() {
    let w = QueryWindow::new(hm(10, 0), hm(11, 0)).unwrap();
    // Ends exactly at the window start.
    assert!(w.overlaps(hm(9, 0), hm(10, 0)));
    // Starts exactly at the window end.
    assert!(w.overlaps(hm(11, 0), hm(12, 0)));
    // Spans the whole window.
    assert!(w.overlaps(hm(8, 0), hm(13, 0)));
    assert!(!w.overlaps(hm(8, 0), hm(9, 59)));
    assert!(!w.overlaps(hm(11, 1), hm(12, 0)));
    assert!(w.contains(hm(10, 0)) && w.contains(hm(11, 0)));
}

#[test]
fn test_window_new_rejects_empty_interval() {
    assert!(QueryWindow::new(hm(10, 0), hm(10, 0)).is_err());
}

#[test]
fn test_last_representable_date() {
    let last = NaiveDate::MAX;
    let w = window(last, 10.0, 11.0).unwrap();
    assert_eq!(w.from, last.and_hms_opt(10, 0, 0).unwrap());

    // The midnight closing this date does not exist.
    let err = window(last, 10.0, 24.0).unwrap_err();
    assert!(matches!(err, TrajectoryError::InvalidRange { .. }));
    assert_eq!(err.kind(), ErrorKind::Validation);
}
